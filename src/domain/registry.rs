//! Connection Registry
//!
//! Per-slot live link state. Mutated only by the link event router and the
//! shutter bookkeeping of the dispatcher.

use crate::domain::models::{ConnectionId, ConnectionState, SlotId};
use tokio::time::Instant;

#[derive(Debug, Default, Clone)]
pub struct ConnectionRegistry {
    slots: [ConnectionState; 2],
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: SlotId) -> &ConnectionState {
        &self.slots[slot.index()]
    }

    /// Mark `slot` connected through `connection`. Any other slot still
    /// holding the same identifier loses it, so one link maps to one slot.
    pub fn connect(&mut self, slot: SlotId, connection: ConnectionId) {
        for other in SlotId::ALL.into_iter().filter(|s| *s != slot) {
            let state = &mut self.slots[other.index()];
            if state.connection_id == Some(connection) {
                state.connected = false;
                state.connection_id = None;
            }
        }
        let state = &mut self.slots[slot.index()];
        state.connected = true;
        state.connection_id = Some(connection);
    }

    /// Seed a freshly paired slot: connected, not recording
    pub fn seed(&mut self, slot: SlotId, connection: ConnectionId) {
        self.slots[slot.index()] = ConnectionState::default();
        self.connect(slot, connection);
    }

    /// Disconnect every slot holding `connection`. Returns the affected slots.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Vec<SlotId> {
        let mut affected = Vec::new();
        for slot in SlotId::ALL {
            let state = &mut self.slots[slot.index()];
            if state.holds(connection) {
                state.connected = false;
                state.connection_id = None;
                affected.push(slot);
            }
        }
        affected
    }

    /// First connected slot holding `connection`
    pub fn slot_for(&self, connection: ConnectionId) -> Option<SlotId> {
        SlotId::ALL
            .into_iter()
            .find(|slot| self.get(*slot).holds(connection))
    }

    /// Record a status frame. Returns true on the not-recording → recording edge.
    pub fn mark_recording(&mut self, slot: SlotId, now: Instant) -> bool {
        let state = &mut self.slots[slot.index()];
        state.last_activity = Some(now);
        if state.is_recording {
            false
        } else {
            state.is_recording = true;
            true
        }
    }

    pub fn clear_recording(&mut self, slot: SlotId) {
        self.slots[slot.index()].is_recording = false;
    }

    pub fn any_connected(&self) -> bool {
        self.slots.iter().any(|s| s.connected)
    }

    pub fn connected_count(&self) -> usize {
        self.slots.iter().filter(|s| s.connected).count()
    }
}
