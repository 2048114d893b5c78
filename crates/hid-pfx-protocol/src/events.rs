//! Event/action look-up-table addressing.
//!
//! The brick stores one [`Action`](crate::Action) per LUT address. An address
//! packs an event ID and a channel: `address = (event_id << 2) | channel`.
//! For IR remote events the channel is the remote's channel (1-4, stored
//! 0-based); for startup and button events it selects one of four slots.

use pfxbrick_errors::{PfxResult, ValidationError};

/// Number of channels (slots) per event.
pub const EVT_CHANNELS: u8 = 4;

/// Exclusive upper bound of event IDs.
pub const EVT_ID_MAX: u8 = 0x20;

/// Highest valid LUT address.
pub const EVT_LUT_MAX: u8 = 0x7F;

/// Event ID reserved for immediate `TEST_ACTION` execution; also the number
/// of programmable events stored in a profile image.
pub const EVT_ID_TEST_EVENT: u8 = 0x13;

/// Event IDs.
pub mod event_ids {
    pub const EVT_ID_8879_TWO_BUTTONS: u8 = 0x00;
    pub const EVT_ID_8879_LEFT_BUTTON: u8 = 0x01;
    pub const EVT_ID_8879_RIGHT_BUTTON: u8 = 0x02;
    pub const EVT_ID_8879_LEFT_INC: u8 = 0x03;
    pub const EVT_ID_8879_LEFT_DEC: u8 = 0x04;
    pub const EVT_ID_8879_RIGHT_INC: u8 = 0x05;
    pub const EVT_ID_8879_RIGHT_DEC: u8 = 0x06;
    pub const EVT_ID_8885_LEFT_FWD: u8 = 0x07;
    pub const EVT_ID_8885_LEFT_REV: u8 = 0x08;
    pub const EVT_ID_8885_RIGHT_FWD: u8 = 0x09;
    pub const EVT_ID_8885_RIGHT_REV: u8 = 0x0A;
    pub const EVT_ID_8885_LEFT_CTROFF: u8 = 0x0B;
    pub const EVT_ID_8885_RIGHT_CTROFF: u8 = 0x0C;
    pub const EVT_ID_EV3_BEACON: u8 = 0x0D;
    pub const EVT_ID_EV3_BEACON_RELEASE: u8 = 0x0E;
    pub const EVT_ID_STARTUP_EVENT: u8 = 0x0F;
    pub const EVT_ID_STARTUP_EVENT_HI: u8 = 0x10;
    pub const EVT_ID_BUTTON_EVENT: u8 = 0x11;
    pub const EVT_ID_BLE_EVENT: u8 = 0x12;
}

/// LUT base addresses (channel 0 / slot 0 of each event).
pub mod addr {
    pub const EVT_8879_TWO_BUTTONS: u8 = 0x00;
    pub const EVT_8879_LEFT_BUTTON: u8 = 0x04;
    pub const EVT_8879_RIGHT_BUTTON: u8 = 0x08;
    pub const EVT_8879_LEFT_INC: u8 = 0x0C;
    pub const EVT_8879_LEFT_DEC: u8 = 0x10;
    pub const EVT_8879_RIGHT_INC: u8 = 0x14;
    pub const EVT_8879_RIGHT_DEC: u8 = 0x18;
    pub const EVT_8885_LEFT_FWD: u8 = 0x1C;
    pub const EVT_8885_LEFT_REV: u8 = 0x20;
    pub const EVT_8885_RIGHT_FWD: u8 = 0x24;
    pub const EVT_8885_RIGHT_REV: u8 = 0x28;
    pub const EVT_8885_LEFT_CTROFF: u8 = 0x2C;
    pub const EVT_8885_RIGHT_CTROFF: u8 = 0x30;
    pub const EVT_EV3_BEACON: u8 = 0x34;
    pub const EVT_EV3_BEACON_RELEASE: u8 = 0x38;
    pub const EVT_STARTUP_EVENT1: u8 = 0x3C;
    pub const EVT_STARTUP_EVENT2: u8 = 0x3D;
    pub const EVT_STARTUP_EVENT3: u8 = 0x3E;
    pub const EVT_STARTUP_EVENT4: u8 = 0x3F;
    pub const EVT_STARTUP_EVENT5: u8 = 0x40;
    pub const EVT_STARTUP_EVENT6: u8 = 0x41;
    pub const EVT_STARTUP_EVENT7: u8 = 0x42;
    pub const EVT_STARTUP_EVENT8: u8 = 0x43;
    pub const EVT_BUTTON_DOWN: u8 = 0x44;
    pub const EVT_BUTTON_LONGPRESS: u8 = 0x45;
    pub const EVT_BUTTON_DOUBLE: u8 = 0x46;
    pub const EVT_BUTTON_UP: u8 = 0x47;
    pub const EVT_BLE_CONNECT: u8 = 0x48;
    pub const EVT_BLE_DISCONNECT: u8 = 0x49;
}

/// The eight startup addresses, searched in order when allocating a slot.
pub const STARTUP_ADDRESSES: [u8; 8] = [
    addr::EVT_STARTUP_EVENT1,
    addr::EVT_STARTUP_EVENT2,
    addr::EVT_STARTUP_EVENT3,
    addr::EVT_STARTUP_EVENT4,
    addr::EVT_STARTUP_EVENT5,
    addr::EVT_STARTUP_EVENT6,
    addr::EVT_STARTUP_EVENT7,
    addr::EVT_STARTUP_EVENT8,
];

/// Pack an event ID and channel into a LUT address.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] if `event_id >= 0x20` or
/// `channel >= 4`.
pub fn evtch_to_address(event_id: u8, channel: u8) -> PfxResult<u8> {
    if event_id >= EVT_ID_MAX {
        return Err(ValidationError::out_of_range("event id", event_id, 0, EVT_ID_MAX - 1).into());
    }
    if channel >= EVT_CHANNELS {
        return Err(ValidationError::out_of_range("channel", channel, 0, EVT_CHANNELS - 1).into());
    }
    Ok((event_id << 2) | channel)
}

/// Split a LUT address into `(event_id, channel)`.
///
/// # Errors
///
/// Returns [`ValidationError::OutOfRange`] if `address > 0x7F`.
pub fn address_to_evtch(address: u8) -> PfxResult<(u8, u8)> {
    if address > EVT_LUT_MAX {
        return Err(ValidationError::out_of_range("address", address, 0, EVT_LUT_MAX).into());
    }
    Ok((address >> 2, address & 0x03))
}

/// Whether `address` is one of the eight startup slots.
pub fn is_startup_address(address: u8) -> bool {
    STARTUP_ADDRESSES.contains(&address)
}

/// Short description of the event at a LUT address.
pub fn address_description(address: u8) -> String {
    let (evt, ch) = (address >> 2, (address & 0x03) + 1);
    use event_ids::*;
    match evt {
        EVT_ID_8879_TWO_BUTTONS => format!("Speed remote ch {ch} both buttons"),
        EVT_ID_8879_LEFT_BUTTON => format!("Speed remote ch {ch} left button"),
        EVT_ID_8879_RIGHT_BUTTON => format!("Speed remote ch {ch} right button"),
        EVT_ID_8879_LEFT_INC => format!("Speed remote ch {ch} left up"),
        EVT_ID_8879_LEFT_DEC => format!("Speed remote ch {ch} left down"),
        EVT_ID_8879_RIGHT_INC => format!("Speed remote ch {ch} right up"),
        EVT_ID_8879_RIGHT_DEC => format!("Speed remote ch {ch} right down"),
        EVT_ID_8885_LEFT_FWD => format!("Joystick ch {ch} left up"),
        EVT_ID_8885_LEFT_REV => format!("Joystick ch {ch} left down"),
        EVT_ID_8885_RIGHT_FWD => format!("Joystick ch {ch} right up"),
        EVT_ID_8885_RIGHT_REV => format!("Joystick ch {ch} right down"),
        EVT_ID_8885_LEFT_CTROFF => format!("Joystick ch {ch} left centre"),
        EVT_ID_8885_RIGHT_CTROFF => format!("Joystick ch {ch} right centre"),
        EVT_ID_EV3_BEACON => format!("EV3 beacon ch {ch} press"),
        EVT_ID_EV3_BEACON_RELEASE => format!("EV3 beacon ch {ch} release"),
        EVT_ID_STARTUP_EVENT => format!("Startup event {ch}"),
        EVT_ID_STARTUP_EVENT_HI => format!("Startup event {}", ch + 4),
        EVT_ID_BUTTON_EVENT => match address {
            addr::EVT_BUTTON_DOWN => "Button down".to_string(),
            addr::EVT_BUTTON_LONGPRESS => "Button long press".to_string(),
            addr::EVT_BUTTON_DOUBLE => "Button double click".to_string(),
            _ => "Button up".to_string(),
        },
        EVT_ID_BLE_EVENT => match address {
            addr::EVT_BLE_CONNECT => "Bluetooth connect".to_string(),
            addr::EVT_BLE_DISCONNECT => "Bluetooth disconnect".to_string(),
            _ => format!("Bluetooth event {ch}"),
        },
        _ => format!("Event 0x{evt:02X} ch {ch}"),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Remote {
    Speed,
    Joystick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Gesture {
    Up,
    Down,
    Button,
    Centre,
}

/// Parse an IR remote gesture description into its LUT address.
///
/// The grammar is `<speed|joy|joystick> ch <1-4> <left|right|both> <gesture>`
/// where the gesture is `up`, `down`, `button` (speed remote) or `ctr`/`off`
/// (joystick released to centre). Words are case-insensitive, and `both`
/// selects the speed remote's two-button press.
///
/// ```
/// use pfxbrick_hid_protocol::ir_gesture_to_address;
///
/// assert_eq!(ir_gesture_to_address("speed ch 2 right up").ok(), Some(0x15));
/// assert_eq!(ir_gesture_to_address("joy ch 1 left down").ok(), Some(0x20));
/// ```
///
/// # Errors
///
/// Returns [`ValidationError::InvalidGesture`] if the text does not follow
/// the grammar.
pub fn ir_gesture_to_address(desc: &str) -> PfxResult<u8> {
    let invalid = || ValidationError::InvalidGesture(desc.to_string());
    let lower = desc.to_ascii_lowercase();
    let mut words = lower
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty());

    let remote = match words.next() {
        Some("speed") => Remote::Speed,
        Some("joy" | "joystick") => Remote::Joystick,
        _ => return Err(invalid().into()),
    };

    let mut channel = None;
    let mut side = None;
    let mut gesture = None;
    while let Some(word) = words.next() {
        match word {
            "ch" | "channel" => {
                let n: u8 = words
                    .next()
                    .and_then(|w| w.parse().ok())
                    .ok_or_else(invalid)?;
                if !(1..=4).contains(&n) {
                    return Err(invalid().into());
                }
                channel = Some(n - 1);
            }
            "left" => side = Some(Side::Left),
            "right" => side = Some(Side::Right),
            "both" | "two" => side = Some(Side::Both),
            "up" | "fwd" | "forward" | "inc" => gesture = Some(Gesture::Up),
            "down" | "rev" | "reverse" | "dec" => gesture = Some(Gesture::Down),
            "button" | "buttons" | "stop" => gesture = Some(Gesture::Button),
            "ctr" | "centre" | "center" | "off" | "release" => gesture = Some(Gesture::Centre),
            _ => return Err(invalid().into()),
        }
    }

    let channel = channel.ok_or_else(invalid)?;
    let side = side.ok_or_else(invalid)?;
    let base = match (remote, side, gesture) {
        (Remote::Speed, Side::Both, None | Some(Gesture::Button)) => addr::EVT_8879_TWO_BUTTONS,
        (Remote::Speed, Side::Left, Some(Gesture::Button)) => addr::EVT_8879_LEFT_BUTTON,
        (Remote::Speed, Side::Right, Some(Gesture::Button)) => addr::EVT_8879_RIGHT_BUTTON,
        (Remote::Speed, Side::Left, Some(Gesture::Up)) => addr::EVT_8879_LEFT_INC,
        (Remote::Speed, Side::Left, Some(Gesture::Down)) => addr::EVT_8879_LEFT_DEC,
        (Remote::Speed, Side::Right, Some(Gesture::Up)) => addr::EVT_8879_RIGHT_INC,
        (Remote::Speed, Side::Right, Some(Gesture::Down)) => addr::EVT_8879_RIGHT_DEC,
        (Remote::Joystick, Side::Left, Some(Gesture::Up)) => addr::EVT_8885_LEFT_FWD,
        (Remote::Joystick, Side::Left, Some(Gesture::Down)) => addr::EVT_8885_LEFT_REV,
        (Remote::Joystick, Side::Right, Some(Gesture::Up)) => addr::EVT_8885_RIGHT_FWD,
        (Remote::Joystick, Side::Right, Some(Gesture::Down)) => addr::EVT_8885_RIGHT_REV,
        (Remote::Joystick, Side::Left, Some(Gesture::Centre)) => addr::EVT_8885_LEFT_CTROFF,
        (Remote::Joystick, Side::Right, Some(Gesture::Centre)) => addr::EVT_8885_RIGHT_CTROFF,
        _ => return Err(invalid().into()),
    };
    Ok(base | channel)
}

/// Parse an IR remote gesture description into `(event_id, channel)`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidGesture`] if the text does not parse.
pub fn ir_gesture_to_evtch(desc: &str) -> PfxResult<(u8, u8)> {
    address_to_evtch(ir_gesture_to_address(desc)?)
}
