//! Status view
//!
//! Renders a [`RemoteSnapshot`] as the lines the on-device display would draw:
//! one cell per camera slot with link and recording markers, the recording
//! clock, the pairing countdown and the wake indicator. Notices become single
//! message-strip lines through [`notice_line`].

use crate::domain::models::{AdvertisingMode, Recipients, RemoteNotice};
use crate::domain::pairing::PairingPhase;
use crate::domain::state::{RemoteSnapshot, SlotSnapshot};
use std::time::Duration;
use tokio::time::Instant;

const CONNECTED_DOT: &str = "●";
const DISCONNECTED_DOT: &str = "○";

/// `mm:ss`, or `h:mm:ss` past the hour
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

fn slot_cell(slot: &SlotSnapshot) -> String {
    let name = if slot.camera.is_valid {
        slot.camera.name.as_str()
    } else {
        "(empty)"
    };
    let mut cell = format!(
        "CAM {} {} {}",
        slot.slot.number(),
        if slot.connection.connected {
            CONNECTED_DOT
        } else {
            DISCONNECTED_DOT
        },
        name
    );
    if slot.connection.is_live_recording() {
        cell.push_str(" [REC]");
    }
    cell
}

fn pairing_line(phase: &PairingPhase, deadline_left: Option<Duration>) -> Option<String> {
    let left = deadline_left
        .map(|d| format!(" ({}s left)", d.as_secs()))
        .unwrap_or_default();
    match phase {
        PairingPhase::Idle => None,
        PairingPhase::Scanning { slot } => {
            Some(format!("Pairing CAM {}: scanning...{}", slot.number(), left))
        }
        PairingPhase::Found { slot, name } => Some(format!(
            "Pairing CAM {}: found {}, waiting for link...{}",
            slot.number(),
            name,
            left
        )),
        PairingPhase::Completed { slot, name } => {
            Some(format!("Pairing CAM {}: paired {}", slot.number(), name))
        }
        PairingPhase::Cancelled { slot, reason } => {
            Some(format!("Pairing CAM {}: failed ({})", slot.number(), reason))
        }
        PairingPhase::TimedOut { slot } => {
            Some(format!("Pairing CAM {}: timed out", slot.number()))
        }
    }
}

/// Render the status panel, one string per line
pub fn render(snapshot: &RemoteSnapshot, now: Instant) -> Vec<String> {
    let cells: Vec<String> = snapshot.slots.iter().map(slot_cell).collect();
    let mut lines = if snapshot.vertical_layout {
        cells
    } else {
        vec![cells.join("  |  ")]
    };

    if let Some(since) = snapshot.recording_since {
        lines.push(format!("REC {}", format_elapsed(now.saturating_duration_since(since))));
    }

    if let Some(line) = pairing_line(&snapshot.pairing, None) {
        lines.push(line);
    }

    if let AdvertisingMode::Wake { slot, .. } = snapshot.advertising {
        lines.push(format!("Waking CAM {}...", slot.number()));
    }

    lines
}

/// Same as [`render`] with the pairing countdown filled in
pub fn render_with_deadline(
    snapshot: &RemoteSnapshot,
    deadline: Option<Instant>,
    now: Instant,
) -> Vec<String> {
    let mut lines = render(snapshot, now);
    if let (Some(deadline), true) = (deadline, snapshot.pairing.is_active()) {
        let left = deadline.saturating_duration_since(now);
        if let Some(line) = pairing_line(&snapshot.pairing, Some(left)) {
            if let Some(last) = lines
                .iter_mut()
                .rev()
                .find(|l| l.starts_with("Pairing CAM"))
            {
                *last = line;
            }
        }
    }
    lines
}

/// One-line message for a notice, as the display's message strip shows it
pub fn notice_line(notice: &RemoteNotice) -> String {
    match notice {
        RemoteNotice::SlotConnected(slot) => format!("CAM {} CONNECTED", slot.number()),
        RemoteNotice::SlotDisconnected(slot) => format!("CAM {} DISCONNECTED", slot.number()),
        RemoteNotice::RecordingStarted(slot) => format!("CAM {} RECORDING", slot.number()),
        RemoteNotice::CandidateFound { slot, name } => {
            format!("Found {} for CAM {}", name, slot.number())
        }
        RemoteNotice::Paired { slot, name } => format!("CAM {} PAIRED: {}", slot.number(), name),
        RemoteNotice::CommandSent {
            command,
            recipients: Recipients::Broadcast,
        } => format!("{} SENT!", command.name()),
        RemoteNotice::CommandSent {
            command,
            recipients: Recipients::Unicast { slot, .. },
        } => format!("{} SYNC! (CAM {})", command.name(), slot.number()),
        RemoteNotice::Waking { slot, name } => format!("Waking CAM {}: {}", slot.number(), name),
        RemoteNotice::WakeFinished => "Wake signal sent".to_string(),
        RemoteNotice::LayoutChanged { vertical } => format!(
            "Layout: {}",
            if *vertical { "vertical" } else { "horizontal" }
        ),
        RemoteNotice::Incident(e) => format!("Warning: {}", e),
    }
}
