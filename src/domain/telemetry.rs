//! Camera telemetry sniffing
//!
//! The cameras write their own status traffic to the remote's write
//! characteristic. Its format is undocumented; the only signal used is that
//! recording-timer frames are long and carry an ASCII clock ("mm:ss").

/// Shortest frame that can be a timer frame
pub const MIN_STATUS_FRAME_LEN: usize = 18;

const COLON: u8 = 0x3A;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameClass {
    /// Recording timer / status frame
    StatusFrame,
    /// Too short to be a status frame (acks, keep-alives)
    Unrelated,
    /// Long enough but carries no clock; meaning unknown
    Unknown,
}

pub fn classify_frame(value: &[u8]) -> FrameClass {
    if value.len() < MIN_STATUS_FRAME_LEN {
        FrameClass::Unrelated
    } else if value.contains(&COLON) {
        FrameClass::StatusFrame
    } else {
        FrameClass::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_frame() {
        let mut frame = vec![0u8; 19];
        frame[12..17].copy_from_slice(b"00:07");
        assert_eq!(classify_frame(&frame), FrameClass::StatusFrame);
    }

    #[test]
    fn test_colon_position_does_not_matter() {
        let mut frame = vec![0xAAu8; 18];
        frame[0] = b':';
        assert_eq!(classify_frame(&frame), FrameClass::StatusFrame);
    }

    #[test]
    fn test_short_and_colonless_frames() {
        assert_eq!(classify_frame(&[]), FrameClass::Unrelated);
        assert_eq!(classify_frame(b"12:34"), FrameClass::Unrelated);
        assert_eq!(classify_frame(&[0x3A; 17]), FrameClass::Unrelated);
        assert_eq!(classify_frame(&[0x01; 20]), FrameClass::Unknown);
    }
}
