//! Discovery Filter
//!
//! Decides whether an advertised peripheral name belongs to a supported
//! camera family. Only consulted while a pairing session is active.

/// Accepted model tags. Case-sensitive, each followed by a space.
pub const CAMERA_NAME_PREFIXES: &[&str] = &["X3 ", "X4 ", "X5 ", "RS ", "ONE ", "Ace ", "ACE "];

/// Minimum name length accepted when binding a camera ("X5 " + 6 bytes)
const MIN_PAIRING_NAME_LEN: usize = 9;

/// Bytes required after the first space of a pairing name
const MIN_SERIAL_LEN: usize = 6;

/// Returns true if `name` is a pairing candidate.
pub fn classify(name: &str) -> bool {
    CAMERA_NAME_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Format validation applied when a candidate actually connects.
pub fn is_valid_pairing_name(name: &str) -> bool {
    if name.len() < MIN_PAIRING_NAME_LEN {
        return false;
    }
    match name.find(' ') {
        Some(space) if space > 0 => name.len() - space - 1 >= MIN_SERIAL_LEN,
        _ => false,
    }
}
