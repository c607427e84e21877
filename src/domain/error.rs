//! Error taxonomy of the remote core.
//!
//! None of these are fatal. Conditions raised while routing radio events are
//! recovered in place and reported as [`RemoteNotice::Incident`]; conditions
//! raised by user actions are returned to the caller.
//!
//! [`RemoteNotice::Incident`]: crate::domain::models::RemoteNotice::Incident

use crate::domain::models::{ConnectionId, SlotId};
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, RemoteError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    // ─────────────────────────────────────────────────────────────
    // Pairing
    // ─────────────────────────────────────────────────────────────
    #[error("camera name {name:?} is not a valid pairing identity")]
    InvalidPairingFormat { name: String },

    #[error("link {connection} connected while pairing {slot} before any camera was discovered")]
    NoCandidate { slot: SlotId, connection: ConnectionId },

    #[error("pairing {slot} timed out")]
    PairingTimeout { slot: SlotId },

    #[error("pairing {slot} cancelled")]
    PairingCancelled { slot: SlotId },

    #[error("pairing already in progress for {active}")]
    PairingBusy { active: SlotId },

    // ─────────────────────────────────────────────────────────────
    // Reconnection
    // ─────────────────────────────────────────────────────────────
    #[error("unknown peripheral {address} connected")]
    UnknownPeripheral { address: String },

    #[error("{address} matches both slots, {suppressed} activation suppressed")]
    AmbiguousSlotMatch { address: String, suppressed: SlotId },

    // ─────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────
    #[error("Not Connected!")]
    NotConnected,

    #[error("no camera saved")]
    NoSavedCamera,

    #[error("remote is busy pairing")]
    Busy,

    #[error("invalid slot number: {0}")]
    InvalidSlot(u8),

    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Wrap a transport collaborator failure.
    pub fn transport(err: anyhow::Error) -> Self {
        Self::Transport(format!("{:#}", err))
    }
}
