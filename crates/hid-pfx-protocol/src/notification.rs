//! Unsolicited notification frames sent over BLE.
//!
//! A frame is three bytes, `[0x7E, kind, payload]`. Frames can arrive on
//! their own or interleaved with a transaction response in the same buffer.

use serde::{Deserialize, Serialize};

use crate::codec::i8_from_wire;
use crate::icd::{MSG_NOTIFICATION, notify};

/// Length of one notification frame.
pub const NOTIFICATION_FRAME_LEN: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notification {
    AudioPlayDone { file_id: u8 },
    AudioPlay { file_id: u8 },
    MotorASpeed(i8),
    MotorAStop,
    MotorBSpeed(i8),
    MotorBStop,
    Unknown { kind: u8, payload: u8 },
}

impl Notification {
    /// Decode a frame. Returns `None` if the first byte is not the
    /// notification tag.
    pub fn from_frame(frame: [u8; NOTIFICATION_FRAME_LEN]) -> Option<Self> {
        let [tag, kind, payload] = frame;
        if tag != MSG_NOTIFICATION {
            return None;
        }
        Some(match kind {
            notify::AUDIO_PLAY_DONE => Self::AudioPlayDone { file_id: payload },
            notify::AUDIO_PLAY => Self::AudioPlay { file_id: payload },
            notify::MOTORA_CURR_SPD => Self::MotorASpeed(i8_from_wire(payload)),
            notify::MOTORA_STOP => Self::MotorAStop,
            notify::MOTORB_CURR_SPD => Self::MotorBSpeed(i8_from_wire(payload)),
            notify::MOTORB_STOP => Self::MotorBStop,
            _ => Self::Unknown { kind, payload },
        })
    }

    /// Notification mask bit for this kind.
    pub fn mask_bit(&self) -> u8 {
        match self {
            Self::AudioPlayDone { .. } => notify::AUDIO_PLAY_DONE,
            Self::AudioPlay { .. } => notify::AUDIO_PLAY,
            Self::MotorASpeed(_) => notify::MOTORA_CURR_SPD,
            Self::MotorAStop => notify::MOTORA_STOP,
            Self::MotorBSpeed(_) => notify::MOTORB_CURR_SPD,
            Self::MotorBStop => notify::MOTORB_STOP,
            Self::Unknown { kind, .. } => *kind,
        }
    }

    /// File id carried by audio notifications.
    pub fn file_id(&self) -> Option<u8> {
        match self {
            Self::AudioPlayDone { file_id } | Self::AudioPlay { file_id } => Some(*file_id),
            _ => None,
        }
    }

    pub fn to_frame(&self) -> [u8; NOTIFICATION_FRAME_LEN] {
        let payload = match self {
            Self::AudioPlayDone { file_id } | Self::AudioPlay { file_id } => *file_id,
            Self::MotorASpeed(s) | Self::MotorBSpeed(s) => u8::from_ne_bytes(s.to_ne_bytes()),
            Self::MotorAStop | Self::MotorBStop => 0,
            Self::Unknown { payload, .. } => *payload,
        };
        [MSG_NOTIFICATION, self.mask_bit(), payload]
    }
}

/// Find every notification frame in `buffer`.
///
/// Scanning resumes after each consumed frame, so a tag byte inside a frame
/// already dispatched is never decoded again. A trailing partial frame is
/// ignored.
pub fn scan_notifications(buffer: &[u8]) -> Vec<(usize, Notification)> {
    let mut found = Vec::new();
    let mut i = 0;
    while let Some(rest) = buffer.get(i..) {
        let Some(pos) = rest.iter().position(|&b| b == MSG_NOTIFICATION) else {
            break;
        };
        let start = i + pos;
        let frame = buffer
            .get(start..start + NOTIFICATION_FRAME_LEN)
            .and_then(|f| <[u8; NOTIFICATION_FRAME_LEN]>::try_from(f).ok());
        match frame.and_then(Notification::from_frame) {
            Some(n) => {
                found.push((start, n));
                i = start + NOTIFICATION_FRAME_LEN;
            }
            None => break,
        }
    }
    found
}

/// Drop complete notification frames from the front of `buffer`, returning
/// what follows (the transaction response, if any).
pub fn strip_leading_notifications(buffer: &[u8]) -> &[u8] {
    let mut rest = buffer;
    while rest.first() == Some(&MSG_NOTIFICATION) && rest.len() >= NOTIFICATION_FRAME_LEN {
        rest = rest.get(NOTIFICATION_FRAME_LEN..).unwrap_or_default();
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_kinds() {
        assert_eq!(
            Notification::from_frame([0x7E, 0x01, 0x21]),
            Some(Notification::AudioPlayDone { file_id: 0x21 })
        );
        assert_eq!(
            Notification::from_frame([0x7E, 0x04, 0xF6]),
            Some(Notification::MotorASpeed(-10))
        );
        assert_eq!(Notification::from_frame([0x82, 0x01, 0x00]), None);
    }

    #[test]
    fn test_scan_does_not_redispatch_inside_frame() {
        let buf = [0x7E, 0x7E, 0x05, 0x7E, 0x02, 0x10];
        let found = scan_notifications(&buf);
        assert_eq!(
            found,
            vec![
                (0, Notification::Unknown { kind: 0x7E, payload: 0x05 }),
                (3, Notification::AudioPlay { file_id: 0x10 }),
            ]
        );
    }

    #[test]
    fn test_scan_interleaved_with_response() {
        let buf = [0x7E, 0x08, 0x00, 0x81, 0x03, 0x39];
        let found = scan_notifications(&buf);
        assert_eq!(found, vec![(0, Notification::MotorAStop)]);
        assert_eq!(strip_leading_notifications(&buf), &[0x81, 0x03, 0x39]);
    }

    #[test]
    fn test_partial_trailing_frame_ignored() {
        assert!(scan_notifications(&[0x81, 0x00, 0x7E, 0x01]).is_empty());
        assert_eq!(strip_leading_notifications(&[0x7E, 0x01]), &[0x7E, 0x01]);
    }

    #[test]
    fn test_frame_round_trip_for_speed() {
        let n = Notification::MotorBSpeed(-3);
        assert_eq!(Notification::from_frame(n.to_frame()), Some(n));
    }
}
