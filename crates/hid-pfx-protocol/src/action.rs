//! The 16-byte event/action record.
//!
//! An [`Action`] combines a global command, one motor action, one light
//! effect and one sound effect. It is the unit stored at every LUT address and
//! the payload of `TEST_ACTION`. The all-zero record is the empty sentinel.

use core::fmt;

use pfxbrick_errors::{PfxResult, TransportError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fx::{self, command, light, motor, sound};

/// Encoded size of an [`Action`].
pub const ACTION_LEN: usize = 16;

/// Number of light outputs addressable by an action.
pub const LIGHT_CHANNELS: u8 = 8;

/// Number of motor outputs addressable by an action.
pub const MOTOR_CHANNELS: u8 = 4;

/// One event/action LUT record, in wire order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub command: u8,
    pub motor_action_id: u8,
    pub motor_param1: u8,
    pub motor_param2: u8,
    pub light_fx_id: u8,
    pub light_output_mask: u8,
    pub light_pf_output_mask: u8,
    pub light_params: [u8; 5],
    pub sound_fx_id: u8,
    pub sound_file_id: u8,
    pub sound_param1: u8,
    pub sound_param2: u8,
}

/// Bitmask of light outputs 1-8. Channels outside that range are skipped.
pub fn light_mask(channels: &[u8]) -> u8 {
    channels.iter().fold(0u8, |mask, &ch| {
        if (1..=LIGHT_CHANNELS).contains(&ch) {
            mask | (1 << (ch - 1))
        } else {
            warn!(channel = ch, "light channel out of range, ignored");
            mask
        }
    })
}

/// Bitmask of motor outputs 1-4 (A-D). Channels outside that range are skipped.
pub fn motor_mask(channels: &[u8]) -> u8 {
    channels.iter().fold(0u8, |mask, &ch| {
        if (1..=MOTOR_CHANNELS).contains(&ch) {
            mask | (1 << (ch - 1))
        } else {
            warn!(channel = ch, "motor channel out of range, ignored");
            mask
        }
    })
}

/// Encode a signed speed percentage into `motor_param1`.
///
/// The speed is clamped to `[-100, 100]`, scaled to 6 bits with truncation,
/// and tagged with the high-resolution flag and, for negative speeds, the
/// reverse flag.
pub fn encode_motor_speed(speed: i32) -> u8 {
    let speed = speed.clamp(-100, 100);
    let magnitude = u8::try_from(63 * speed.unsigned_abs() / 100).unwrap_or(motor::SPEED_MASK);
    let mut param = (magnitude & motor::SPEED_MASK) | motor::SPEED_HIRES;
    if speed < 0 {
        param |= motor::SPEED_REVERSE;
    }
    param
}

/// Decode `motor_param1` back into a signed percentage (inverse of
/// [`encode_motor_speed`] up to truncation).
pub fn decode_motor_speed(param: u8) -> i32 {
    let magnitude = i32::from(param & motor::SPEED_MASK);
    let pct = (magnitude * 100 + 62) / 63;
    if param & motor::SPEED_REVERSE != 0 {
        -pct
    } else {
        pct
    }
}

impl Action {
    /// The empty action.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a 16-byte record.
    ///
    /// # Errors
    ///
    /// Returns a short-response error if `bytes` is shorter than 16 bytes.
    pub fn from_bytes(bytes: &[u8]) -> PfxResult<Self> {
        let b: &[u8; ACTION_LEN] = bytes
            .get(..ACTION_LEN)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| TransportError::short_response(0, ACTION_LEN, bytes.len()))?;
        let [
            command,
            motor_action_id,
            motor_param1,
            motor_param2,
            light_fx_id,
            light_output_mask,
            light_pf_output_mask,
            p1,
            p2,
            p3,
            p4,
            p5,
            sound_fx_id,
            sound_file_id,
            sound_param1,
            sound_param2,
        ] = *b;
        Ok(Self {
            command,
            motor_action_id,
            motor_param1,
            motor_param2,
            light_fx_id,
            light_output_mask,
            light_pf_output_mask,
            light_params: [p1, p2, p3, p4, p5],
            sound_fx_id,
            sound_file_id,
            sound_param1,
            sound_param2,
        })
    }

    /// Encode as the 16-byte wire record.
    pub fn to_bytes(&self) -> [u8; ACTION_LEN] {
        let [p1, p2, p3, p4, p5] = self.light_params;
        [
            self.command,
            self.motor_action_id,
            self.motor_param1,
            self.motor_param2,
            self.light_fx_id,
            self.light_output_mask,
            self.light_pf_output_mask,
            p1,
            p2,
            p3,
            p4,
            p5,
            self.sound_fx_id,
            self.sound_file_id,
            self.sound_param1,
            self.sound_param2,
        ]
    }

    /// Whether every field is zero.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reset every field to zero.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Global command action.
    pub fn command(cmd: u8) -> Self {
        Self {
            command: cmd,
            ..Self::default()
        }
    }

    fn motor(channels: &[u8], action_id: u8, param1: u8, param2: u8) -> Self {
        Self {
            motor_action_id: (action_id & motor::ACTION_ID_MASK) | motor_mask(channels),
            motor_param1: param1,
            motor_param2: param2,
            ..Self::default()
        }
    }

    /// Set motor speed in percent (clamped to ±100), optionally for a fixed
    /// duration in seconds.
    pub fn set_motor_speed(channels: &[u8], speed: i32, duration: Option<f32>) -> Self {
        let param1 = encode_motor_speed(speed);
        match duration {
            Some(secs) => Self::motor(channels, motor::SET_SPD_TIMED, param1, fx::duration_code(secs)),
            None => Self::motor(channels, motor::SET_SPD, param1, 0),
        }
    }

    /// Stop motors, either with deceleration or as an emergency stop.
    pub fn stop_motor(channels: &[u8], estop: bool) -> Self {
        let id = if estop { motor::ESTOP } else { motor::STOP };
        Self::motor(channels, id, 0, 0)
    }

    /// Increase motor speed by a step code (see `map_pct_to_motor_step`).
    pub fn increase_speed(channels: &[u8], step: u8, bidir: bool) -> Self {
        let id = if bidir { motor::INC_SPD_BI } else { motor::INC_SPD };
        Self::motor(channels, id, step, 0)
    }

    /// Decrease motor speed by a step code.
    pub fn decrease_speed(channels: &[u8], step: u8, bidir: bool) -> Self {
        let id = if bidir { motor::DEC_SPD_BI } else { motor::DEC_SPD };
        Self::motor(channels, id, step, 0)
    }

    /// Reverse motor direction.
    pub fn change_dir(channels: &[u8]) -> Self {
        Self::motor(channels, motor::CHANGE_DIR, 0, 0)
    }

    fn on_off(channels: &[u8], transition: u8) -> Self {
        let mut params = [0u8; 5];
        params[3] = transition;
        Self::light_fx(channels, light::ON_OFF_TOGGLE, params)
    }

    /// Turn lights on.
    pub fn light_on(channels: &[u8]) -> Self {
        Self::on_off(channels, light::TRANSITION_ON)
    }

    /// Turn lights off.
    pub fn light_off(channels: &[u8]) -> Self {
        Self::on_off(channels, light::TRANSITION_OFF)
    }

    /// Toggle lights.
    pub fn light_toggle(channels: &[u8]) -> Self {
        Self::on_off(channels, light::TRANSITION_TOGGLE)
    }

    /// Set light brightness (0-255).
    pub fn set_brightness(channels: &[u8], brightness: u8) -> Self {
        Self::light_fx(channels, light::SET_BRIGHT, [brightness, 0, 0, 0, 0])
    }

    /// Individual light effect on the given outputs.
    pub fn light_fx(channels: &[u8], fx_id: u8, params: [u8; 5]) -> Self {
        Self {
            light_fx_id: fx_id,
            light_output_mask: light_mask(channels),
            light_params: params,
            ..Self::default()
        }
    }

    /// Combination light effect spanning all outputs.
    pub fn combo_light_fx(fx_id: u8, params: [u8; 5]) -> Self {
        Self::light_fx(&[], fx_id | light::COMBO_MASK, params)
    }

    /// Sound effect with optional file.
    pub fn sound_fx(fx_id: u8, params: [u8; 2], file_id: Option<u8>) -> Self {
        Self {
            sound_fx_id: fx_id,
            sound_file_id: file_id.unwrap_or(0),
            sound_param1: params[0],
            sound_param2: params[1],
            ..Self::default()
        }
    }

    /// Play a file once.
    pub fn play_audio_file(file_id: u8) -> Self {
        Self::sound_fx(sound::PLAY_ONCE, [0, 0], Some(file_id))
    }

    /// Play a file continuously.
    pub fn repeat_audio_file(file_id: u8) -> Self {
        Self::sound_fx(sound::PLAY_CONT, [0, 0], Some(file_id))
    }

    /// Stop playback of a file.
    pub fn stop_audio_file(file_id: u8) -> Self {
        Self::sound_fx(sound::STOP, [0, 0], Some(file_id))
    }

    /// Set audio volume in percent (clamped to 0-100).
    pub fn set_volume(volume: i32) -> Self {
        let scaled = volume.clamp(0, 100) * 255 / 100;
        let level = u8::try_from(scaled).unwrap_or(u8::MAX);
        Self::sound_fx(sound::SET_VOLUME, [level, 0], None)
    }

    /// Whether the light effect is a combo effect.
    pub fn is_combo_light(&self) -> bool {
        self.light_fx_id & light::COMBO_MASK != 0
    }

    /// Script statements for this action, one per line. `file_name`, if
    /// given, replaces the numeric sound file ID with a quoted name.
    pub fn to_script_str(&self, file_name: Option<&str>) -> String {
        let mut lines = Vec::new();
        if self.command != command::NONE {
            lines.push(format!("command 0x{:02X}", self.command));
        }
        let outputs = self.motor_action_id & motor::OUTPUT_MASK;
        if outputs != 0 {
            let chans: Vec<&str> = ["a", "b", "c", "d"]
                .into_iter()
                .zip(0u8..)
                .filter(|(_, bit)| outputs & (1 << bit) != 0)
                .map(|(name, _)| name)
                .collect();
            lines.push(format!(
                "motor [{}] fx 0x{:X} {} {}",
                chans.join(", "),
                self.motor_action_id >> 4,
                self.motor_param1,
                self.motor_param2
            ));
        }
        if self.light_fx_id != light::NONE || self.light_output_mask != 0 {
            let [p1, p2, p3, p4, p5] = self.light_params;
            if self.is_combo_light() {
                lines.push(format!(
                    "light combo fx 0x{:02X} {p1} {p2} {p3} {p4} {p5}",
                    self.light_fx_id & light::ID_MASK
                ));
            } else {
                let chans: Vec<String> = (1..=LIGHT_CHANNELS)
                    .filter(|ch| self.light_output_mask & (1 << (ch - 1)) != 0)
                    .map(|ch| ch.to_string())
                    .collect();
                lines.push(format!(
                    "light [{}] fx 0x{:02X} {p1} {p2} {p3} {p4} {p5}",
                    chans.join(", "),
                    self.light_fx_id
                ));
            }
        }
        if self.sound_fx_id != sound::NONE {
            let file = match file_name {
                Some(name) => format!("\"{name}\""),
                None => self.sound_file_id.to_string(),
            };
            lines.push(format!(
                "sound fx {} {file} {} {}",
                self.sound_fx_id, self.sound_param1, self.sound_param2
            ));
        }
        lines.join("\n")
    }

    /// Script block binding this action to a LUT address.
    pub fn to_event_script_str(&self, address: u8, file_name: Option<&str>) -> String {
        let body = self.to_script_str(file_name);
        if body.is_empty() {
            return format!("event 0x{address:02X} {{\n}}");
        }
        let indented: Vec<String> = body.lines().map(|l| format!("    {l}")).collect();
        format!("event 0x{address:02X} {{\n{}\n}}", indented.join("\n"))
    }
}

fn motor_outputs_str(id: u8) -> String {
    let outputs = id & motor::OUTPUT_MASK;
    let names: Vec<&str> = ["A", "B", "C", "D"]
        .into_iter()
        .zip(0u8..)
        .filter(|(_, bit)| outputs & (1 << bit) != 0)
        .map(|(name, _)| name)
        .collect();
    format!("Motor Ch {}", names.join(" "))
}

fn light_outputs_str(mask: u8) -> String {
    if mask == 0 {
        return "None".to_string();
    }
    let chans: Vec<String> = (1..=LIGHT_CHANNELS)
        .filter(|ch| mask & (1 << (ch - 1)) != 0)
        .map(|ch| ch.to_string())
        .collect();
    format!("Ch {}", chans.join(" "))
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = fx::command_name(self.command).unwrap_or("Unknown");
        writeln!(f, "Command           : [{:02X}] {cmd}", self.command)?;
        if self.motor_action_id & motor::OUTPUT_MASK == 0 {
            writeln!(f, "Motor Action ID   : [{:02X}] None", self.motor_action_id)?;
        } else {
            writeln!(
                f,
                "Motor Action ID   : [{:02X}] {} {}",
                self.motor_action_id,
                fx::motor_action_name(self.motor_action_id),
                motor_outputs_str(self.motor_action_id)
            )?;
        }
        writeln!(f, "Motor Param 1     : [{:02X}]", self.motor_param1)?;
        writeln!(f, "Motor Param 2     : [{:02X}]", self.motor_param2)?;
        let light_name = if self.is_combo_light() {
            fx::combo_fx_name(self.light_fx_id & light::ID_MASK)
        } else {
            fx::light_fx_name(self.light_fx_id)
        };
        writeln!(
            f,
            "Light Fx ID       : [{:02X}] {}",
            self.light_fx_id,
            light_name.unwrap_or("Unknown")
        )?;
        writeln!(
            f,
            "Light Output Mask : [{:02X}] {}",
            self.light_output_mask,
            light_outputs_str(self.light_output_mask)
        )?;
        writeln!(f, "Light PF Out Mask : [{:02X}]", self.light_pf_output_mask)?;
        for (i, p) in (1..).zip(self.light_params) {
            writeln!(f, "Light Param {i}     : [{p:02X}]")?;
        }
        writeln!(
            f,
            "Sound Fx ID       : [{:02X}] {}",
            self.sound_fx_id,
            fx::sound_fx_name(self.sound_fx_id).unwrap_or("Unknown")
        )?;
        writeln!(f, "Sound File ID     : [{:02X}]", self.sound_file_id)?;
        writeln!(f, "Sound Param 1     : [{:02X}]", self.sound_param1)?;
        write!(f, "Sound Param 2     : [{:02X}]", self.sound_param2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_motor_speed() {
        let a = Action::set_motor_speed(&[1], 50, None);
        assert_eq!(a.motor_param1, 0x9F);
        assert_eq!(a.motor_action_id, motor::SET_SPD | 0x01);
    }

    #[test]
    fn test_motor_speed_clamps() {
        assert_eq!(encode_motor_speed(250), encode_motor_speed(100));
        assert_eq!(encode_motor_speed(100), 0xBF);
        assert_eq!(encode_motor_speed(-100), 0xFF);
        assert_eq!(encode_motor_speed(0), 0x80);
        assert_eq!(decode_motor_speed(encode_motor_speed(-100)), -100);
    }

    #[test]
    fn test_timed_motor_speed() {
        let a = Action::set_motor_speed(&[1], -33, Some(2.0));
        assert_eq!(a.motor_action_id, motor::SET_SPD_TIMED | 0x01);
        assert_eq!(a.motor_param1, 0x80 | 0x40 | 20);
        assert_eq!(a.motor_param2, 4);
    }

    #[test]
    fn test_stop_motor() {
        let a = Action::stop_motor(&[1, 2], true);
        assert_eq!(a.motor_action_id, motor::ESTOP | 0x03);
        let b = Action::stop_motor(&[2], false);
        assert_eq!(b.motor_action_id, motor::STOP | 0x02);
    }

    #[test]
    fn test_light_on() {
        let a = Action::light_on(&[1, 8]);
        assert_eq!(a.light_fx_id, light::ON_OFF_TOGGLE);
        assert_eq!(a.light_output_mask, 0x81);
        assert_eq!(a.light_params[3], light::TRANSITION_ON);
    }

    #[test]
    fn test_out_of_range_light_channels_skipped() {
        assert_eq!(light_mask(&[0, 1, 9]), 0x01);
        assert_eq!(motor_mask(&[2, 5]), 0x02);
    }

    #[test]
    fn test_equality_and_empty() {
        let mut a1 = Action::new();
        let mut a2 = Action::new();
        assert!(a1.is_empty());
        assert_eq!(a1, a2);
        a1.light_fx_id = 5;
        assert_ne!(a1, a2);
        assert!(!a1.is_empty());
        a2.light_fx_id = 5;
        assert_eq!(a1, a2);
        let mut a3 = a1;
        a3.sound_fx_id = 3;
        assert_ne!(a1, a3);
        a3.clear();
        assert!(a3.is_empty());
    }

    #[test]
    fn test_byte_order() -> Result<(), Box<dyn std::error::Error>> {
        let bytes: Vec<u8> = (1..=16).collect();
        let a = Action::from_bytes(&bytes)?;
        assert_eq!(a.command, 1);
        assert_eq!(a.light_pf_output_mask, 7);
        assert_eq!(a.light_params, [8, 9, 10, 11, 12]);
        assert_eq!(a.sound_param2, 16);
        assert_eq!(a.to_bytes().to_vec(), bytes);
        Ok(())
    }

    #[test]
    fn test_short_record_rejected() {
        assert!(Action::from_bytes(&[0u8; 15]).is_err());
    }

    #[test]
    fn test_event_script_motor() {
        let a = Action::set_motor_speed(&[1, 2], 50, None);
        assert_eq!(a.motor_action_id, motor::SET_SPD | 0x03);
        let s = a.to_event_script_str(0x3C, None);
        assert!(s.contains("event 0x3C"));
        assert!(s.contains("motor [a, b]"));
        assert!(s.contains("fx 0x7 159 0"));
    }

    #[test]
    fn test_event_script_light() {
        let s = Action::light_on(&[1, 8]).to_event_script_str(0x40, None);
        assert!(s.contains("event 0x40"));
        assert!(s.contains("light [1, 8]"));
        assert!(s.contains("fx 0x01 0 0 0 1 0"));
    }

    #[test]
    fn test_sound_script_with_name() {
        let a = Action::sound_fx(sound::PLAY_RAND, [40, 0], None);
        assert_eq!(
            a.to_script_str(Some("horn.wav")),
            "sound fx 13 \"horn.wav\" 40 0"
        );
    }

    #[test]
    fn test_set_volume_clamps() {
        assert_eq!(Action::set_volume(150).sound_param1, 255);
        assert_eq!(Action::set_volume(-5).sound_param1, 0);
        assert_eq!(Action::set_volume(50).sound_param1, 127);
    }
}
