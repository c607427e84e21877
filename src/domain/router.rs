//! Link Event Router
//!
//! Single entry point for asynchronous radio events. Reconciles each event
//! against the stored cameras, the connection registry and any pairing session
//! in progress, and returns the effects the transport side must carry out.
//!
//! The router is the only mutator of the registry's link state and the only
//! driver of pairing transitions caused by radio traffic.

use crate::domain::error::RemoteError;
use crate::domain::models::{ConnectionId, Effect, RadioEvent, RemoteNotice, SlotId};
use crate::domain::pairing::ConnectVerdict;
use crate::domain::state::{notify, RemoteState};
use crate::domain::telemetry::{classify_frame, FrameClass};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

impl RemoteState {
    /// Apply one radio event. Never blocks.
    pub fn handle_event(&mut self, event: RadioEvent, now: Instant) -> Vec<Effect> {
        // A session past its deadline must not accept a late connect.
        let mut effects = self.expire_pairing(now);

        match event {
            RadioEvent::PeripheralDiscovered { name, address } => {
                self.on_peripheral_discovered(&name, &address, &mut effects)
            }
            RadioEvent::LinkConnected {
                address,
                connection,
            } => self.on_link_connected(&address, connection, &mut effects),
            RadioEvent::LinkDisconnected { connection } => {
                self.on_link_disconnected(connection, &mut effects)
            }
            RadioEvent::CharacteristicWritten { connection, value } => {
                self.on_characteristic_write(connection, &value, now, &mut effects)
            }
        }

        effects
    }

    fn on_peripheral_discovered(&mut self, name: &str, address: &str, effects: &mut Vec<Effect>) {
        let Some(slot) = self.pairing.target() else {
            trace!("Ignoring advertisement from {} outside pairing", address);
            return;
        };
        if self.pairing.observe(name, address) {
            effects.push(notify(RemoteNotice::CandidateFound {
                slot,
                name: name.to_string(),
            }));
        }
    }

    fn on_link_connected(
        &mut self,
        address: &str,
        connection: ConnectionId,
        effects: &mut Vec<Effect>,
    ) {
        info!("Device connected from {} ({})", address, connection);

        if let Some(verdict) = self.pairing.resolve_connection(connection) {
            effects.push(Effect::StopScan);
            self.complete_pairing(verdict, address, connection, effects);
        } else {
            self.reconnect(address, connection, effects);
        }

        self.rearm_advertising(effects);
    }

    fn complete_pairing(
        &mut self,
        verdict: ConnectVerdict,
        address: &str,
        connection: ConnectionId,
        effects: &mut Vec<Effect>,
    ) {
        match verdict {
            ConnectVerdict::Accept { slot, camera } => {
                if !camera.matches_address(address) {
                    debug!(
                        "{} paired from scan address {}, link came from {}",
                        slot, camera.address, address
                    );
                }
                info!("Paired {} to {}", camera.name, slot);

                self.cameras[slot.index()] = camera.clone();
                self.registry.seed(slot, connection);
                effects.push(Effect::PersistSlot(slot, camera.clone()));
                effects.push(notify(RemoteNotice::Paired {
                    slot,
                    name: camera.name,
                }));
            }
            ConnectVerdict::Reject { slot, reason } => {
                warn!("Pairing {} rejected: {}", slot, reason);
                effects.push(Effect::Disconnect(connection));
                effects.push(notify(RemoteNotice::Incident(reason)));
            }
        }
    }

    fn reconnect(&mut self, address: &str, connection: ConnectionId, effects: &mut Vec<Effect>) {
        let matched_one = self.camera(SlotId::One).matches_address(address);
        let matched_two = self.camera(SlotId::Two).matches_address(address);

        if matched_one {
            self.registry.connect(SlotId::One, connection);
            info!("Camera 1 reconnected: {}", self.camera(SlotId::One).name);
            effects.push(notify(RemoteNotice::SlotConnected(SlotId::One)));
        }

        if matched_two {
            if matched_one {
                // One physical camera must not light up both slots.
                let incident = RemoteError::AmbiguousSlotMatch {
                    address: address.to_string(),
                    suppressed: SlotId::Two,
                };
                warn!("{}", incident);
                effects.push(notify(RemoteNotice::Incident(incident)));
            } else {
                self.registry.connect(SlotId::Two, connection);
                info!("Camera 2 reconnected: {}", self.camera(SlotId::Two).name);
                effects.push(notify(RemoteNotice::SlotConnected(SlotId::Two)));
            }
        }

        if !matched_one && !matched_two {
            let incident = RemoteError::UnknownPeripheral {
                address: address.to_string(),
            };
            warn!("{}, dropping link {}", incident, connection);
            effects.push(Effect::Disconnect(connection));
            effects.push(notify(RemoteNotice::Incident(incident)));
        }
    }

    fn on_link_disconnected(&mut self, connection: ConnectionId, effects: &mut Vec<Effect>) {
        let affected = self.registry.disconnect(connection);
        if affected.is_empty() {
            debug!("Disconnected link {} was not tracked as a camera", connection);
        }
        for slot in affected {
            info!("Camera {} disconnected", slot.number());
            effects.push(notify(RemoteNotice::SlotDisconnected(slot)));
        }

        self.rearm_advertising(effects);
    }

    fn on_characteristic_write(
        &mut self,
        connection: ConnectionId,
        value: &[u8],
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        match classify_frame(value) {
            FrameClass::StatusFrame => {}
            FrameClass::Unrelated => return,
            FrameClass::Unknown => {
                trace!("Unclassified {} byte frame from {}", value.len(), connection);
                return;
            }
        }

        let Some(slot) = self.registry.slot_for(connection) else {
            trace!("Status frame from untracked link {}", connection);
            return;
        };
        if self.registry.mark_recording(slot, now) {
            info!("Camera {} started recording", slot.number());
            effects.push(notify(RemoteNotice::RecordingStarted(slot)));
        }
    }

    fn rearm_advertising(&self, effects: &mut Vec<Effect>) {
        if self.may_rearm_advertising() {
            effects.push(Effect::RestartAdvertising);
        }
    }
}
