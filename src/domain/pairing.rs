//! Pairing Session
//!
//! Short-lived state machine that binds one discovered camera to a slot.
//!
//! ```text
//! Idle ──start──▶ Scanning ──candidate──▶ Found ──connect──▶ Completed
//!                    │                      │        └─bad─▶ Cancelled
//!                    ├──connect─────────────┼──────────────▶ Cancelled
//!                    ├──cancel──────────────┴──────────────▶ Cancelled
//!                    └──deadline───────────────────────────▶ TimedOut
//! ```
//!
//! Terminal phases are reported once and then acknowledged back to `Idle`.

use crate::domain::discovery;
use crate::domain::error::{RemoteError, Result};
use crate::domain::models::{CameraSlot, ConnectionId, SlotId};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default time allowed for a camera to be found and connect
pub const DEFAULT_PAIRING_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PairingPhase {
    #[default]
    Idle,
    Scanning {
        slot: SlotId,
    },
    Found {
        slot: SlotId,
        name: String,
    },
    Completed {
        slot: SlotId,
        name: String,
    },
    Cancelled {
        slot: SlotId,
        reason: RemoteError,
    },
    TimedOut {
        slot: SlotId,
    },
}

impl PairingPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Scanning { .. } | Self::Found { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Cancelled { .. } | Self::TimedOut { .. }
        )
    }

    pub fn slot(&self) -> Option<SlotId> {
        match self {
            Self::Idle => None,
            Self::Scanning { slot }
            | Self::Found { slot, .. }
            | Self::Completed { slot, .. }
            | Self::Cancelled { slot, .. }
            | Self::TimedOut { slot } => Some(*slot),
        }
    }
}

/// How a link that connected during pairing was judged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectVerdict {
    Accept { slot: SlotId, camera: CameraSlot },
    Reject { slot: SlotId, reason: RemoteError },
}

#[derive(Debug, Default)]
pub struct PairingSession {
    phase: PairingPhase,
    detected_name: String,
    detected_address: String,
    deadline: Option<Instant>,
}

impl PairingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &PairingPhase {
        &self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Slot being paired, only while the session is active
    pub fn target(&self) -> Option<SlotId> {
        if self.is_active() {
            self.phase.slot()
        } else {
            None
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Scratch discovery result as `(name, address)`
    pub fn detected(&self) -> Option<(&str, &str)> {
        if self.detected_name.is_empty() {
            None
        } else {
            Some((&self.detected_name, &self.detected_address))
        }
    }

    /// Begin pairing `slot`. Returns the deadline.
    pub fn start(&mut self, slot: SlotId, now: Instant, timeout: Duration) -> Result<Instant> {
        if let Some(active) = self.target() {
            if active == slot {
                warn!("Pairing {} already in progress", slot);
            } else {
                warn!("Pairing {} rejected, {} is still pairing", slot, active);
            }
            return Err(RemoteError::PairingBusy { active });
        }

        self.clear_scratch();
        let deadline = now + timeout;
        self.deadline = Some(deadline);
        self.phase = PairingPhase::Scanning { slot };
        info!("Pairing {} started, timeout {:?}", slot, timeout);
        Ok(deadline)
    }

    /// Feed a discovered peripheral. Returns true if it became the candidate.
    pub fn observe(&mut self, name: &str, address: &str) -> bool {
        let Some(slot) = self.target() else {
            return false;
        };

        debug!("Scan found: {} @ {}", name, address);
        if !discovery::classify(name) {
            return false;
        }

        self.detected_name = name.to_string();
        self.detected_address = address.to_string();
        self.phase = PairingPhase::Found {
            slot,
            name: name.to_string(),
        };
        info!("Found camera {} for {}", name, slot);
        true
    }

    /// Judge a link that connected while the session is active. Ends the
    /// session either way; `None` if no session is active.
    pub fn resolve_connection(&mut self, connection: ConnectionId) -> Option<ConnectVerdict> {
        let slot = self.target()?;

        let verdict = match self.detected() {
            None => ConnectVerdict::Reject {
                slot,
                reason: RemoteError::NoCandidate { slot, connection },
            },
            Some((name, _)) if !discovery::is_valid_pairing_name(name) => ConnectVerdict::Reject {
                slot,
                reason: RemoteError::InvalidPairingFormat {
                    name: name.to_string(),
                },
            },
            Some((name, address)) => match CameraSlot::paired(name, address) {
                Some(camera) => ConnectVerdict::Accept { slot, camera },
                None => ConnectVerdict::Reject {
                    slot,
                    reason: RemoteError::InvalidPairingFormat {
                        name: name.to_string(),
                    },
                },
            },
        };

        self.phase = match &verdict {
            ConnectVerdict::Accept { camera, .. } => PairingPhase::Completed {
                slot,
                name: camera.name.clone(),
            },
            ConnectVerdict::Reject { reason, .. } => PairingPhase::Cancelled {
                slot,
                reason: reason.clone(),
            },
        };
        self.clear_scratch();
        Some(verdict)
    }

    /// User-initiated abort. Returns the slot that was being paired.
    pub fn cancel(&mut self) -> Option<SlotId> {
        let slot = self.target()?;
        info!("Pairing {} cancelled by user", slot);
        self.phase = PairingPhase::Cancelled {
            slot,
            reason: RemoteError::PairingCancelled { slot },
        };
        self.clear_scratch();
        Some(slot)
    }

    /// Deadline check. Returns the slot if the session just timed out.
    pub fn expire(&mut self, now: Instant) -> Option<SlotId> {
        let slot = self.target()?;
        if self.deadline.is_some_and(|deadline| now < deadline) {
            return None;
        }
        info!("Pairing {} timed out", slot);
        self.phase = PairingPhase::TimedOut { slot };
        self.clear_scratch();
        Some(slot)
    }

    /// Return a finished session to `Idle`
    pub fn acknowledge(&mut self) {
        if self.phase.is_terminal() {
            self.phase = PairingPhase::Idle;
        }
    }

    fn clear_scratch(&mut self) {
        self.detected_name.clear();
        self.detected_address.clear();
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(slot: SlotId) -> (PairingSession, Instant) {
        let mut session = PairingSession::new();
        let now = Instant::now();
        session.start(slot, now, DEFAULT_PAIRING_TIMEOUT).unwrap();
        (session, now)
    }

    #[test]
    fn test_start_arms_deadline() {
        let (session, now) = started(SlotId::One);
        assert_eq!(session.phase(), &PairingPhase::Scanning { slot: SlotId::One });
        assert_eq!(session.deadline(), Some(now + DEFAULT_PAIRING_TIMEOUT));
        assert_eq!(session.target(), Some(SlotId::One));
    }

    #[test]
    fn test_only_one_session_at_a_time() {
        let (mut session, now) = started(SlotId::Two);
        assert_eq!(
            session.start(SlotId::One, now, DEFAULT_PAIRING_TIMEOUT),
            Err(RemoteError::PairingBusy { active: SlotId::Two })
        );
        assert_eq!(session.target(), Some(SlotId::Two));
    }

    #[test]
    fn test_restarting_same_slot_keeps_running_session() {
        let (mut session, now) = started(SlotId::One);
        session.observe("X4 998877", "AA:BB:CC:DD:EE:FF");

        let later = now + Duration::from_secs(5);
        assert_eq!(
            session.start(SlotId::One, later, DEFAULT_PAIRING_TIMEOUT),
            Err(RemoteError::PairingBusy { active: SlotId::One })
        );
        assert_eq!(session.deadline(), Some(now + DEFAULT_PAIRING_TIMEOUT));
        assert_eq!(session.detected(), Some(("X4 998877", "AA:BB:CC:DD:EE:FF")));
    }

    #[test]
    fn test_rejected_names_never_become_candidates() {
        let (mut session, _) = started(SlotId::One);
        assert!(!session.observe("Foo", "11:22:33:44:55:66"));
        assert!(!session.observe("Headphones X4", "11:22:33:44:55:67"));
        assert_eq!(session.detected(), None);
        assert_eq!(session.phase(), &PairingPhase::Scanning { slot: SlotId::One });
    }

    #[test]
    fn test_later_candidate_overwrites_earlier() {
        let (mut session, _) = started(SlotId::One);
        assert!(session.observe("X3 AAAAAA", "aa"));
        assert!(session.observe("X4 998877", "bb"));
        assert_eq!(session.detected(), Some(("X4 998877", "bb")));
    }

    #[test]
    fn test_observe_ignored_when_idle() {
        let mut session = PairingSession::new();
        assert!(!session.observe("X4 998877", "bb"));
        assert_eq!(session.detected(), None);
    }

    #[test]
    fn test_valid_candidate_is_accepted() {
        let (mut session, _) = started(SlotId::One);
        session.observe("X4 998877", "AA:BB:CC:DD:EE:01");

        let verdict = session.resolve_connection(ConnectionId(3)).unwrap();
        match verdict {
            ConnectVerdict::Accept { slot, camera } => {
                assert_eq!(slot, SlotId::One);
                assert_eq!(camera.name, "X4 998877");
                assert_eq!(camera.address, "AA:BB:CC:DD:EE:01");
                assert_eq!(&camera.wake_payload, b"998877");
                assert!(camera.is_valid);
            }
            other => panic!("unexpected verdict {other:?}"),
        }
        assert!(!session.is_active());
        assert_eq!(session.detected(), None);
    }

    #[test]
    fn test_malformed_candidate_is_rejected() {
        let (mut session, _) = started(SlotId::Two);
        session.observe("RS 12345", "aa");

        let verdict = session.resolve_connection(ConnectionId(1)).unwrap();
        assert_eq!(
            verdict,
            ConnectVerdict::Reject {
                slot: SlotId::Two,
                reason: RemoteError::InvalidPairingFormat {
                    name: "RS 12345".to_string()
                },
            }
        );
        assert!(matches!(session.phase(), PairingPhase::Cancelled { .. }));
    }

    #[test]
    fn test_connect_without_candidate_is_rejected() {
        let (mut session, _) = started(SlotId::One);
        let verdict = session.resolve_connection(ConnectionId(9)).unwrap();
        assert_eq!(
            verdict,
            ConnectVerdict::Reject {
                slot: SlotId::One,
                reason: RemoteError::NoCandidate {
                    slot: SlotId::One,
                    connection: ConnectionId(9)
                },
            }
        );
    }

    #[test]
    fn test_expire_respects_deadline() {
        let (mut session, now) = started(SlotId::One);
        assert_eq!(session.expire(now + Duration::from_secs(29)), None);
        assert!(session.is_active());

        assert_eq!(session.expire(now + DEFAULT_PAIRING_TIMEOUT), Some(SlotId::One));
        assert_eq!(session.phase(), &PairingPhase::TimedOut { slot: SlotId::One });

        session.acknowledge();
        assert_eq!(session.phase(), &PairingPhase::Idle);
    }

    #[test]
    fn test_cancel_then_restart() {
        let (mut session, now) = started(SlotId::One);
        session.observe("X5 ABCDEF", "aa");
        assert_eq!(session.cancel(), Some(SlotId::One));
        assert_eq!(session.detected(), None);
        assert_eq!(session.cancel(), None);

        assert!(session.start(SlotId::Two, now, DEFAULT_PAIRING_TIMEOUT).is_ok());
        assert_eq!(session.target(), Some(SlotId::Two));
    }
}
