//! Owned core state
//!
//! Everything the event context and the foreground context share lives in one
//! `RemoteState`. Callers hold it behind a single mutex; every method here is
//! a synchronous step that returns the side effects it wants performed.

use crate::domain::error::Result;
use crate::domain::models::{
    AdvertisingMode, CameraSlot, ConnectionState, Effect, RemoteNotice, SlotId,
};
use crate::domain::pairing::{PairingPhase, PairingSession, DEFAULT_PAIRING_TIMEOUT};
use crate::domain::registry::ConnectionRegistry;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
pub struct RemoteState {
    pub(crate) cameras: [CameraSlot; 2],
    pub(crate) registry: ConnectionRegistry,
    pub(crate) pairing: PairingSession,
    pub(crate) advertising: AdvertisingMode,
    /// Controller-side recording clock, toggled by the shutter
    pub(crate) recording_since: Option<Instant>,
    pub(crate) vertical_layout: bool,
    pairing_timeout: Duration,
}

impl Default for RemoteState {
    fn default() -> Self {
        Self::new([CameraSlot::default(), CameraSlot::default()])
    }
}

impl RemoteState {
    pub fn new(cameras: [CameraSlot; 2]) -> Self {
        Self {
            cameras,
            registry: ConnectionRegistry::new(),
            pairing: PairingSession::new(),
            advertising: AdvertisingMode::Normal,
            recording_since: None,
            vertical_layout: false,
            pairing_timeout: DEFAULT_PAIRING_TIMEOUT,
        }
    }

    pub fn with_pairing_timeout(mut self, timeout: Duration) -> Self {
        self.pairing_timeout = timeout;
        self
    }

    pub fn with_vertical_layout(mut self, vertical: bool) -> Self {
        self.vertical_layout = vertical;
        self
    }

    pub fn camera(&self, slot: SlotId) -> &CameraSlot {
        &self.cameras[slot.index()]
    }

    pub fn connection(&self, slot: SlotId) -> &ConnectionState {
        self.registry.get(slot)
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn pairing_phase(&self) -> &PairingPhase {
        self.pairing.phase()
    }

    pub fn pairing_deadline(&self) -> Option<Instant> {
        self.pairing.deadline()
    }

    pub fn advertising(&self) -> AdvertisingMode {
        self.advertising
    }

    pub fn vertical_layout(&self) -> bool {
        self.vertical_layout
    }

    pub fn toggle_layout(&mut self) -> bool {
        self.vertical_layout = !self.vertical_layout;
        self.vertical_layout
    }

    pub fn set_advertising(&mut self, mode: AdvertisingMode) {
        self.advertising = mode;
    }

    /// Open a pairing session for `slot`
    pub fn begin_pairing(&mut self, slot: SlotId, now: Instant) -> Result<Vec<Effect>> {
        self.pairing.start(slot, now, self.pairing_timeout)?;
        self.advertising = AdvertisingMode::Normal;
        Ok(vec![
            Effect::StartScan,
            Effect::Advertise(AdvertisingMode::Normal),
        ])
    }

    pub fn cancel_pairing(&mut self) -> Vec<Effect> {
        match self.pairing.cancel() {
            Some(_) => vec![Effect::StopScan],
            None => Vec::new(),
        }
    }

    pub fn expire_pairing(&mut self, now: Instant) -> Vec<Effect> {
        match self.pairing.expire(now) {
            Some(_) => vec![Effect::StopScan],
            None => Vec::new(),
        }
    }

    /// Hand a terminal pairing phase back and return the session to idle
    pub fn take_pairing_outcome(&mut self) -> Option<PairingPhase> {
        let phase = self.pairing.phase().clone();
        if phase.is_terminal() {
            self.pairing.acknowledge();
            Some(phase)
        } else {
            None
        }
    }

    /// Advertising may be re-armed only outside wake and pairing modes
    pub(crate) fn may_rearm_advertising(&self) -> bool {
        self.advertising == AdvertisingMode::Normal && !self.pairing.is_active()
    }

    pub fn snapshot(&self) -> RemoteSnapshot {
        RemoteSnapshot {
            slots: SlotId::ALL.map(|slot| SlotSnapshot {
                slot,
                camera: self.camera(slot).clone(),
                connection: *self.connection(slot),
            }),
            pairing: self.pairing.phase().clone(),
            advertising: self.advertising,
            recording_since: self.recording_since,
            vertical_layout: self.vertical_layout,
        }
    }
}

pub(crate) fn notify(notice: RemoteNotice) -> Effect {
    Effect::Notify(notice)
}

/// Copy of the observable state for the rendering collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub slots: [SlotSnapshot; 2],
    pub pairing: PairingPhase,
    pub advertising: AdvertisingMode,
    pub recording_since: Option<Instant>,
    pub vertical_layout: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub slot: SlotId,
    pub camera: CameraSlot,
    pub connection: ConnectionState,
}
