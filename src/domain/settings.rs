use crate::domain::models::{CameraSlot, SlotId, WakePayload};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "dual_cam_remote".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

/// Persisted identity of a paired camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCamera {
    pub name: String,
    pub address: String,
    pub wake: WakePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cameras: [Option<StoredCamera>; 2],

    // UI Settings
    #[serde(default = "default_false")]
    pub vertical_layout: bool,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,

    // BLE Settings
    #[serde(default = "default_service_uuid")]
    pub ble_service_uuid: String,
    #[serde(default = "default_write_uuid")]
    pub ble_write_char_uuid: String,
    #[serde(default = "default_notify_uuid")]
    pub ble_notify_char_uuid: String,

    // Timing Settings
    #[serde(default = "default_pairing_timeout_secs")]
    pub pairing_timeout_secs: u64,
    #[serde(default = "default_wake_dwell_ms")]
    pub wake_dwell_ms: u64,

    // Control channel
    #[serde(default = "default_control_socket_name")]
    pub control_socket_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cameras: [None, None],
            vertical_layout: false,
            log_settings: LogSettings::default(),
            ble_service_uuid: default_service_uuid(),
            ble_write_char_uuid: default_write_uuid(),
            ble_notify_char_uuid: default_notify_uuid(),
            pairing_timeout_secs: default_pairing_timeout_secs(),
            wake_dwell_ms: default_wake_dwell_ms(),
            control_socket_name: default_control_socket_name(),
        }
    }
}

fn default_service_uuid() -> String {
    "0000ce80-0000-1000-8000-00805f9b34fb".to_string()
}
fn default_write_uuid() -> String {
    "0000ce81-0000-1000-8000-00805f9b34fb".to_string()
}
fn default_notify_uuid() -> String {
    "0000ce82-0000-1000-8000-00805f9b34fb".to_string()
}
fn default_pairing_timeout_secs() -> u64 {
    30
}
fn default_wake_dwell_ms() -> u64 {
    3000
}
fn default_control_socket_name() -> String {
    "dual-cam-remote.sock".to_string()
}

/// Get/set-by-slot persistence used by the core
pub trait SlotStore: Send {
    fn load_slot(&self, slot: SlotId) -> CameraSlot;
    fn save_slot(&mut self, slot: SlotId, camera: &CameraSlot) -> anyhow::Result<()>;
    fn load_layout(&self) -> bool;
    fn save_layout(&mut self, vertical: bool) -> anyhow::Result<()>;

    fn load_all(&self) -> [CameraSlot; 2] {
        SlotId::ALL.map(|slot| self.load_slot(slot))
    }
}

fn to_slot(stored: Option<&StoredCamera>) -> CameraSlot {
    match stored {
        Some(stored) => CameraSlot {
            name: stored.name.clone(),
            address: stored.address.trim().to_string(),
            wake_payload: stored.wake,
            is_valid: !stored.name.is_empty(),
        },
        None => CameraSlot::default(),
    }
}

fn to_stored(camera: &CameraSlot) -> StoredCamera {
    StoredCamera {
        name: camera.name.clone(),
        address: camera.address.clone(),
        wake: camera.wake_payload,
    }
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::at(settings_path))
    }

    /// Settings backed by an explicit file
    pub fn at(settings_path: PathBuf) -> Self {
        let settings = match Self::load_from_file(&settings_path) {
            Ok(settings) => settings,
            Err(e) => {
                if settings_path.exists() {
                    warn!("Ignoring unreadable settings {}: {}", settings_path.display(), e);
                }
                Settings::default()
            }
        };

        Self {
            settings,
            settings_path,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("DualCamRemote");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }
}

impl SlotStore for SettingsService {
    fn load_slot(&self, slot: SlotId) -> CameraSlot {
        let camera = to_slot(self.settings.cameras[slot.index()].as_ref());
        info!(
            "Loaded camera {}: {:?} @ {:?} (valid: {})",
            slot.number(),
            camera.name,
            camera.address,
            camera.is_valid
        );
        camera
    }

    fn save_slot(&mut self, slot: SlotId, camera: &CameraSlot) -> anyhow::Result<()> {
        info!(
            "Saving camera {}: {} @ {}, wake {:02X?}",
            slot.number(),
            camera.name,
            camera.address,
            camera.wake_payload
        );
        self.settings.cameras[slot.index()] = Some(to_stored(camera));
        self.save()
    }

    fn load_layout(&self) -> bool {
        self.settings.vertical_layout
    }

    fn save_layout(&mut self, vertical: bool) -> anyhow::Result<()> {
        self.settings.vertical_layout = vertical;
        info!(
            "Layout saved: {}",
            if vertical { "Vertical" } else { "Horizontal" }
        );
        self.save()
    }
}

/// In-memory store for tests and for running without a config directory
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    cameras: [Option<StoredCamera>; 2],
    vertical_layout: bool,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn load_slot(&self, slot: SlotId) -> CameraSlot {
        to_slot(self.cameras[slot.index()].as_ref())
    }

    fn save_slot(&mut self, slot: SlotId, camera: &CameraSlot) -> anyhow::Result<()> {
        self.cameras[slot.index()] = Some(to_stored(camera));
        Ok(())
    }

    fn load_layout(&self) -> bool {
        self.vertical_layout
    }

    fn save_layout(&mut self, vertical: bool) -> anyhow::Result<()> {
        self.vertical_layout = vertical;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = SettingsService::at(dir.path().join("settings.json"));
        assert_eq!(service.get().pairing_timeout_secs, 30);
        assert_eq!(service.get().wake_dwell_ms, 3000);
        assert_eq!(service.load_all(), [CameraSlot::default(), CameraSlot::default()]);
    }

    #[test]
    fn test_slot_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let camera = CameraSlot::paired("X4 998877", "AA:BB:CC:DD:EE:FF").unwrap();

        let mut service = SettingsService::at(path.clone());
        service.save_slot(SlotId::Two, &camera).unwrap();
        service.save_layout(true).unwrap();

        let reloaded = SettingsService::at(path);
        assert_eq!(reloaded.load_slot(SlotId::Two), camera);
        assert!(!reloaded.load_slot(SlotId::One).is_valid);
        assert!(reloaded.load_layout());
    }

    #[test]
    fn test_partial_file_fills_defaults_and_trims_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"cameras":[{"name":"X3 ABCDEF","address":" aa:bb:cc:dd:ee:ff ","wake":[65,66,67,68,69,70]},null]}"#,
        )
        .unwrap();

        let service = SettingsService::at(path);
        let slot = service.load_slot(SlotId::One);
        assert_eq!(slot.address, "aa:bb:cc:dd:ee:ff");
        assert_eq!(&slot.wake_payload, b"ABCDEF");
        assert!(slot.is_valid);
        assert_eq!(service.get().ble_service_uuid, "0000ce80-0000-1000-8000-00805f9b34fb");
    }

    #[test]
    fn test_empty_name_is_not_valid() {
        let mut store = MemorySlotStore::new();
        let mut camera = CameraSlot::paired("X4 998877", "aa").unwrap();
        camera.name.clear();
        store.save_slot(SlotId::One, &camera).unwrap();
        assert!(!store.load_slot(SlotId::One).is_valid);
    }
}
