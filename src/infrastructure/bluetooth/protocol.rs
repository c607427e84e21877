//! Camera remote GATT protocol
//!
//! Wire-level constants the cameras expect from an official GPS remote:
//! service layout, command payloads and the two advertisement shapes.

use crate::domain::models::{CameraCommand, WakePayload};
use anyhow::{Context, Result};
use uuid::Uuid;

/// Primary GPS remote service UUID
pub const SERVICE_UUID: &str = "0000ce80-0000-1000-8000-00805f9b34fb";

/// Write characteristic UUID - cameras write their status here
pub const WRITE_CHAR_UUID: &str = "0000ce81-0000-1000-8000-00805f9b34fb";

/// Notify characteristic UUID - commands are notified to cameras here
pub const NOTIFY_CHAR_UUID: &str = "0000ce82-0000-1000-8000-00805f9b34fb";

/// Local name the cameras look for. Some models only wake on an exact match.
pub const DEVICE_NAME: &str = "Insta360 GPS Remote";

/// Common prefix of every command payload
pub const COMMAND_PREFIX: [u8; 7] = [0xFC, 0xEF, 0xFE, 0x86, 0x00, 0x03, 0x01];

pub const COMMAND_LEN: usize = 9;

const SHUTTER_CMD: [u8; COMMAND_LEN] = [0xFC, 0xEF, 0xFE, 0x86, 0x00, 0x03, 0x01, 0x02, 0x00];
const MODE_CMD: [u8; COMMAND_LEN] = [0xFC, 0xEF, 0xFE, 0x86, 0x00, 0x03, 0x01, 0x01, 0x00];
const TOGGLE_SCREEN_CMD: [u8; COMMAND_LEN] = [0xFC, 0xEF, 0xFE, 0x86, 0x00, 0x03, 0x01, 0x00, 0x00];
const POWER_OFF_CMD: [u8; COMMAND_LEN] = [0xFC, 0xEF, 0xFE, 0x86, 0x00, 0x03, 0x01, 0x00, 0x03];

/// Raw bytes for a camera command
pub fn command_payload(command: CameraCommand) -> &'static [u8; COMMAND_LEN] {
    match command {
        CameraCommand::Shutter => &SHUTTER_CMD,
        CameraCommand::ModeSwitch => &MODE_CMD,
        CameraCommand::ScreenToggle => &TOGGLE_SCREEN_CMD,
        CameraCommand::PowerOff => &POWER_OFF_CMD,
    }
}

/// Apple company id, little-endian
const COMPANY_ID: [u8; 2] = [0x4C, 0x00];

/// iBeacon type and length
const IBEACON_TYPE: [u8; 2] = [0x02, 0x15];

/// Fixed leading part of the beacon UUID field
const WAKE_UUID_PREFIX: [u8; 10] = [0x09, 0x4F, 0x52, 0x42, 0x49, 0x54, 0x09, 0xFF, 0x0F, 0x00];

/// Major/minor, all zero
const MAJOR_MINOR: [u8; 4] = [0x00; 4];

/// TX power and trailer
const WAKE_TRAILER: [u8; 2] = [0xE4, 0x01];

pub const WAKE_MANUFACTURER_DATA_LEN: usize = 26;

/// Manufacturer data of the wake beacon for one camera
///
/// ```text
/// [0-1]   : Company id 4C 00
/// [2-3]   : iBeacon type 02 15
/// [4-13]  : Fixed wake pattern
/// [14-19] : Camera wake payload
/// [20-23] : Major / minor (zero)
/// [24-25] : TX power E4, trailer 01
/// ```
pub fn wake_manufacturer_data(payload: &WakePayload) -> [u8; WAKE_MANUFACTURER_DATA_LEN] {
    let mut data = [0u8; WAKE_MANUFACTURER_DATA_LEN];
    let parts: [&[u8]; 6] = [
        &COMPANY_ID,
        &IBEACON_TYPE,
        &WAKE_UUID_PREFIX,
        payload,
        &MAJOR_MINOR,
        &WAKE_TRAILER,
    ];

    let mut offset = 0;
    for part in parts {
        data[offset..offset + part.len()].copy_from_slice(part);
        offset += part.len();
    }
    data
}

/// Advertisement content handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub local_name: &'static str,
    pub service_uuid: Uuid,
    pub manufacturer_data: Option<Vec<u8>>,
}

impl Advertisement {
    /// Name plus service, no manufacturer data
    pub fn normal(service_uuid: Uuid) -> Self {
        Self {
            local_name: DEVICE_NAME,
            service_uuid,
            manufacturer_data: None,
        }
    }

    /// Wake beacon for one sleeping camera
    pub fn wake(service_uuid: Uuid, payload: &WakePayload) -> Self {
        Self {
            local_name: DEVICE_NAME,
            service_uuid,
            manufacturer_data: Some(wake_manufacturer_data(payload).to_vec()),
        }
    }
}

/// GATT layout exposed by the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattLayout {
    pub service: Uuid,
    pub write_characteristic: Uuid,
    pub notify_characteristic: Uuid,
}

impl GattLayout {
    pub fn parse(service: &str, write: &str, notify: &str) -> Result<Self> {
        Ok(Self {
            service: parse_uuid(service)?,
            write_characteristic: parse_uuid(write)?,
            notify_characteristic: parse_uuid(notify)?,
        })
    }
}

impl Default for GattLayout {
    fn default() -> Self {
        Self {
            service: Uuid::from_u128(0x0000ce80_0000_1000_8000_00805f9b34fb),
            write_characteristic: Uuid::from_u128(0x0000ce81_0000_1000_8000_00805f9b34fb),
            notify_characteristic: Uuid::from_u128(0x0000ce82_0000_1000_8000_00805f9b34fb),
        }
    }
}

/// Parse a UUID string
pub fn parse_uuid(uuid_str: &str) -> Result<Uuid> {
    Uuid::parse_str(uuid_str.trim()).with_context(|| format!("Invalid UUID format: {uuid_str}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uuid() {
        let uuid = parse_uuid(SERVICE_UUID).unwrap();
        assert_eq!(uuid.as_u128() >> 96, 0x0000ce80);
        assert!(parse_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_default_layout_matches_constants() {
        let parsed = GattLayout::parse(SERVICE_UUID, WRITE_CHAR_UUID, NOTIFY_CHAR_UUID).unwrap();
        assert_eq!(parsed, GattLayout::default());
    }

    #[test]
    fn test_command_bytes() {
        assert_eq!(
            command_payload(CameraCommand::Shutter),
            &[0xFC, 0xEF, 0xFE, 0x86, 0x00, 0x03, 0x01, 0x02, 0x00]
        );
        assert_eq!(command_payload(CameraCommand::PowerOff)[7..], [0x00, 0x03]);
        for command in [
            CameraCommand::Shutter,
            CameraCommand::ModeSwitch,
            CameraCommand::ScreenToggle,
            CameraCommand::PowerOff,
        ] {
            assert_eq!(command_payload(command)[..7], COMMAND_PREFIX);
        }
    }

    #[test]
    fn test_wake_manufacturer_data_layout() {
        let data = wake_manufacturer_data(b"998877");
        assert_eq!(
            data,
            [
                0x4C, 0x00, 0x02, 0x15, 0x09, 0x4F, 0x52, 0x42, 0x49, 0x54, 0x09, 0xFF, 0x0F,
                0x00, b'9', b'9', b'8', b'8', b'7', b'7', 0x00, 0x00, 0x00, 0x00, 0xE4, 0x01
            ]
        );
    }

    #[test]
    fn test_advertisements() {
        let layout = GattLayout::default();
        let normal = Advertisement::normal(layout.service);
        assert_eq!(normal.local_name, "Insta360 GPS Remote");
        assert_eq!(normal.manufacturer_data, None);

        let wake = Advertisement::wake(layout.service, b"ABCDEF");
        assert_eq!(wake.manufacturer_data.as_deref().map(<[u8]>::len), Some(26));
    }
}
