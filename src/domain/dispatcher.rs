//! Command Dispatcher
//!
//! Chooses recipients for camera commands. The cameras only understand a
//! shutter *toggle*, so two cameras that drifted apart are brought back
//! together by toggling only the one that is still recording.
//!
//! | slot 1 recording | slot 2 recording | recipients            |
//! |------------------|------------------|-----------------------|
//! | yes              | no               | unicast to slot 1     |
//! | no               | yes              | unicast to slot 2     |
//! | equal            | equal            | broadcast             |
//!
//! The post-command state is never verified.

use crate::domain::error::{RemoteError, Result};
use crate::domain::models::{CameraCommand, Recipients, SlotId, WakePayload};
use crate::domain::registry::ConnectionRegistry;
use crate::domain::state::RemoteState;
use tokio::time::Instant;
use tracing::info;

/// Decide who receives `command`. Pure; does not check that anyone is connected.
pub fn plan(command: CameraCommand, registry: &ConnectionRegistry) -> Recipients {
    if command != CameraCommand::Shutter {
        return Recipients::Broadcast;
    }

    let one = registry.get(SlotId::One);
    let two = registry.get(SlotId::Two);
    match (one.is_live_recording(), two.is_live_recording()) {
        (true, false) => unicast(SlotId::One, registry),
        (false, true) => unicast(SlotId::Two, registry),
        _ => Recipients::Broadcast,
    }
}

fn unicast(slot: SlotId, registry: &ConnectionRegistry) -> Recipients {
    match registry.get(slot).connection_id {
        Some(connection) => Recipients::Unicast { slot, connection },
        None => Recipients::Broadcast,
    }
}

/// A saved camera to wake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeTarget {
    pub slot: SlotId,
    pub name: String,
    pub payload: WakePayload,
}

impl RemoteState {
    /// Recipients for `command`, or [`RemoteError::NotConnected`] when no link
    /// is up. Records nothing.
    pub fn recipients_for(&self, command: CameraCommand) -> Result<Recipients> {
        if !self.registry.any_connected() {
            return Err(RemoteError::NotConnected);
        }
        Ok(plan(command, &self.registry))
    }

    /// Controller-side bookkeeping once `command` actually went out
    pub fn record_sent(&mut self, command: CameraCommand, recipients: Recipients, now: Instant) {
        if command == CameraCommand::Shutter {
            self.account_shutter(recipients, now);
        }
    }

    /// Plan `command` and record it as sent.
    ///
    /// Fails with [`RemoteError::NotConnected`] when no link is up; nothing is
    /// recorded in that case.
    pub fn dispatch(&mut self, command: CameraCommand, now: Instant) -> Result<Recipients> {
        let recipients = self.recipients_for(command)?;
        self.record_sent(command, recipients, now);
        Ok(recipients)
    }

    fn account_shutter(&mut self, recipients: Recipients, now: Instant) {
        match recipients {
            Recipients::Unicast { slot, .. } => {
                info!("Syncing: stopping camera {} to match", slot.number());
                self.registry.clear_recording(slot);
            }
            Recipients::Broadcast => {
                let both_recording = SlotId::ALL
                    .iter()
                    .all(|slot| self.registry.get(*slot).is_live_recording());
                if both_recording {
                    for slot in SlotId::ALL {
                        self.registry.clear_recording(slot);
                    }
                }
            }
        }

        self.recording_since = match self.recording_since {
            Some(_) => None,
            None => Some(now),
        };
    }

    /// Saved cameras in slot order
    pub fn wake_targets(&self) -> Result<Vec<WakeTarget>> {
        let targets: Vec<WakeTarget> = SlotId::ALL
            .into_iter()
            .filter(|slot| self.camera(*slot).is_valid)
            .map(|slot| {
                let camera = self.camera(slot);
                WakeTarget {
                    slot,
                    name: camera.name.clone(),
                    payload: camera.wake_payload,
                }
            })
            .collect();

        if targets.is_empty() {
            Err(RemoteError::NoSavedCamera)
        } else {
            Ok(targets)
        }
    }
}
