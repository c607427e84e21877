use crate::domain::error::RemoteError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;

/// Number of bytes in a camera wake payload
pub const WAKE_PAYLOAD_LEN: usize = 6;

pub type WakePayload = [u8; WAKE_PAYLOAD_LEN];

/// One of the two logical camera identities the remote manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SlotId {
    One,
    Two,
}

impl SlotId {
    pub const ALL: [SlotId; 2] = [SlotId::One, SlotId::Two];

    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

impl TryFrom<u8> for SlotId {
    type Error = RemoteError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(RemoteError::InvalidSlot(other)),
        }
    }
}

impl From<SlotId> for u8 {
    fn from(slot: SlotId) -> Self {
        slot.number()
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.number())
    }
}

/// Opaque per-link identifier assigned by the transport on connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u16);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A camera identity bound to a slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraSlot {
    pub name: String,
    pub address: String,
    pub wake_payload: WakePayload,
    pub is_valid: bool,
}

impl CameraSlot {
    /// Bind a freshly paired camera. The wake payload is the trailing bytes of
    /// the advertised name; `None` when the name is too short to carry one.
    pub fn paired(name: &str, address: &str) -> Option<Self> {
        let wake_payload = wake_payload_from_name(name)?;
        Some(Self {
            name: name.to_string(),
            address: address.trim().to_string(),
            wake_payload,
            is_valid: true,
        })
    }

    /// Case-insensitive address match, only for slots holding a paired camera
    pub fn matches_address(&self, address: &str) -> bool {
        self.is_valid && self.address.eq_ignore_ascii_case(address.trim())
    }
}

pub fn wake_payload_from_name(name: &str) -> Option<WakePayload> {
    let bytes = name.as_bytes();
    let tail = bytes.len().checked_sub(WAKE_PAYLOAD_LEN)?;
    let mut payload = [0u8; WAKE_PAYLOAD_LEN];
    payload.copy_from_slice(&bytes[tail..]);
    Some(payload)
}

/// Live link state of one slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    /// `None` once the link is gone
    pub connection_id: Option<ConnectionId>,
    /// Inferred from camera telemetry, never queried
    pub is_recording: bool,
    pub last_activity: Option<Instant>,
}

impl ConnectionState {
    pub fn holds(&self, connection: ConnectionId) -> bool {
        self.connected && self.connection_id == Some(connection)
    }

    /// Recording as far as the shutter sync table is concerned
    pub fn is_live_recording(&self) -> bool {
        self.connected && self.is_recording
    }
}

/// Asynchronous events delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadioEvent {
    PeripheralDiscovered {
        name: String,
        address: String,
    },
    LinkConnected {
        address: String,
        connection: ConnectionId,
    },
    LinkDisconnected {
        connection: ConnectionId,
    },
    CharacteristicWritten {
        connection: ConnectionId,
        value: Vec<u8>,
    },
}

/// What the remote is currently broadcasting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdvertisingMode {
    #[default]
    Normal,
    Wake {
        slot: SlotId,
        payload: WakePayload,
    },
}

/// Commands understood by the cameras. Payload bytes live in the protocol module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraCommand {
    Shutter,
    ModeSwitch,
    ScreenToggle,
    PowerOff,
}

impl CameraCommand {
    /// Name used in logs and notices
    pub fn name(self) -> &'static str {
        match self {
            Self::Shutter => "SHUTTER",
            Self::ModeSwitch => "MODE",
            Self::ScreenToggle => "SCREEN",
            Self::PowerOff => "SLEEP",
        }
    }
}

/// Who receives a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipients {
    /// Every currently connected link
    Broadcast,
    /// Exactly one link
    Unicast { slot: SlotId, connection: ConnectionId },
}

/// Foreground user actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserAction {
    Pair(SlotId),
    CancelPairing,
    Shutter,
    ModeSwitch,
    ScreenToggle,
    PowerOff,
    Wake,
    ToggleLayout,
    Status,
}

/// Observable state changes, consumed by the rendering collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteNotice {
    SlotConnected(SlotId),
    SlotDisconnected(SlotId),
    RecordingStarted(SlotId),
    CandidateFound { slot: SlotId, name: String },
    Paired { slot: SlotId, name: String },
    CommandSent {
        command: CameraCommand,
        recipients: Recipients,
    },
    Waking { slot: SlotId, name: String },
    WakeFinished,
    LayoutChanged { vertical: bool },
    /// A condition recovered inside the core
    Incident(RemoteError),
}

/// Side effects requested by a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drop one specific link
    Disconnect(ConnectionId),
    StartScan,
    StopScan,
    Advertise(AdvertisingMode),
    /// Keep broadcasting so further cameras can connect
    RestartAdvertising,
    PersistSlot(SlotId, CameraSlot),
    Notify(RemoteNotice),
}
