//! Brick configuration block (`GET_CONFIG` / `SET_CONFIG`).
//!
//! Byte offsets within the 64-byte block (byte 0 is the opcode or reply tag):
//!
//! | Bytes | Field |
//! |---|---|
//! | 1-6 | startup brightness, lights 1-6 |
//! | 7 | notch count |
//! | 8-14 | notch bounds |
//! | 15-18 | rapid accel / rapid decel / brake decel / brake speed thresholds |
//! | 19-25 | reserved, preserved as read |
//! | 26-30 | IR auto-off, BLE auto-off, BLE motor on disconnect, advertise and session power |
//! | 31-32 | startup brightness, lights 7-8 |
//! | 33-34 | PF output brightness A/B |
//! | 35-36 | bass / treble |
//! | 37 | packed settings byte |
//! | 38-61 | four motor blocks: config byte, vmin, vmid, vmax, accel, decel |
//! | 62 | default volume |
//! | 63 | default brightness |

use core::fmt;

use pfxbrick_errors::PfxResult;
use serde::{Deserialize, Serialize};

use crate::icd::{REPORT_LEN, cfg, opcodes};
use crate::report::ResponseReader;

/// Length of the configuration block inside a profile image.
pub const IMAGE_CONFIG_LEN: usize = 60;

/// ICD revision stamped into profile images.
pub const IMAGE_ICD_VERSION: [u8; 2] = [0x03, 0x37];

/// Product ID stamped into profile images.
pub const IMAGE_PRODUCT_ID: [u8; 2] = [0xA2, 0x16];

/// General settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub status_led: u8,
    pub volume_beep: bool,
    pub auto_power_down: u8,
    pub lockout_mode: u8,
    pub ir_auto_off: u8,
    pub ble_auto_off: u8,
    pub ble_motor_when_disconnect: u8,
    pub ble_advert_power: u8,
    pub ble_session_power: u8,
    pub notch_count: u8,
    pub notch_bounds: [u8; 7],
    pub rapid_accel_thr: u8,
    pub rapid_decel_thr: u8,
    pub brake_decel_thr: u8,
    pub brake_speed_thr: u8,
}

/// Per-channel motor configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorConfig {
    pub invert: bool,
    pub torque_comp: bool,
    pub tlg_mode: bool,
    pub accel: u8,
    pub decel: u8,
    pub vmin: u8,
    pub vmid: u8,
    pub vmax: u8,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            invert: false,
            torque_comp: false,
            tlg_mode: false,
            accel: 0,
            decel: 0,
            vmin: 0,
            vmid: 128,
            vmax: 255,
        }
    }
}

impl MotorConfig {
    /// Packed motor config byte.
    pub fn config_byte(&self) -> u8 {
        let mut b = 0;
        if self.invert {
            b |= cfg::MOTOR_INVERT;
        }
        if self.torque_comp {
            b |= cfg::MOTOR_TRQCOMP;
        }
        if self.tlg_mode {
            b |= cfg::MOTOR_TLGMODE;
        }
        b
    }

    fn set_config_byte(&mut self, b: u8) {
        self.invert = b & cfg::MOTOR_INVERT != 0;
        self.torque_comp = b & cfg::MOTOR_TRQCOMP != 0;
        self.tlg_mode = b & cfg::MOTOR_TLGMODE != 0;
    }

    /// `[vmin, vmid, vmax, accel, decel]`.
    pub fn speed_bytes(&self) -> [u8; 5] {
        [self.vmin, self.vmid, self.vmax, self.accel, self.decel]
    }
}

/// Light output configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightConfig {
    pub default_brightness: u8,
    pub startup_brightness: [u8; 8],
    pub pf_brightness_a: u8,
    pub pf_brightness_b: u8,
}

/// Audio configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub audio_drc: bool,
    pub bass: u8,
    pub treble: u8,
    pub default_volume: u8,
}

/// Decoded configuration block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickConfig {
    pub settings: Settings,
    pub motors: [MotorConfig; 4],
    pub lights: LightConfig,
    pub audio: AudioConfig,
    /// Bytes 19-25, written back unchanged.
    pub reserved: [u8; 7],
}

impl BrickConfig {
    /// Decode a `GET_CONFIG` response.
    ///
    /// # Errors
    ///
    /// Returns a short-response error if the response is under 64 bytes.
    pub fn from_response(msg: &[u8]) -> PfxResult<Self> {
        let mut r = ResponseReader::at(msg, 1);
        let mut c = Self::default();
        let first6: [u8; 6] = r.read_array()?;
        c.settings.notch_count = r.read_u8()?;
        c.settings.notch_bounds = r.read_array()?;
        c.settings.rapid_accel_thr = r.read_u8()?;
        c.settings.rapid_decel_thr = r.read_u8()?;
        c.settings.brake_decel_thr = r.read_u8()?;
        c.settings.brake_speed_thr = r.read_u8()?;
        c.reserved = r.read_array()?;
        c.settings.ir_auto_off = r.read_u8()?;
        c.settings.ble_auto_off = r.read_u8()?;
        c.settings.ble_motor_when_disconnect = r.read_u8()?;
        c.settings.ble_advert_power = r.read_u8()?;
        c.settings.ble_session_power = r.read_u8()?;
        let last2: [u8; 2] = r.read_array()?;
        let [a, b, cc, d, e, f] = first6;
        let [g, h] = last2;
        c.lights.startup_brightness = [a, b, cc, d, e, f, g, h];
        c.lights.pf_brightness_a = r.read_u8()?;
        c.lights.pf_brightness_b = r.read_u8()?;
        c.audio.bass = r.read_u8()?;
        c.audio.treble = r.read_u8()?;
        c.set_settings_byte(r.read_u8()?);
        for motor in &mut c.motors {
            motor.set_config_byte(r.read_u8()?);
            let [vmin, vmid, vmax, accel, decel] = r.read_array()?;
            motor.vmin = vmin;
            motor.vmid = vmid;
            motor.vmax = vmax;
            motor.accel = accel;
            motor.decel = decel;
        }
        c.audio.default_volume = r.read_u8()?;
        c.lights.default_brightness = r.read_u8()?;
        Ok(c)
    }

    /// Packed settings byte (status LED, volume beep, power save, lockout, DRC).
    pub fn settings_byte(&self) -> u8 {
        let s = &self.settings;
        let mut b = (s.status_led & cfg::STATLED_MASK)
            | (s.auto_power_down & cfg::POWERSAVE_MASK)
            | (s.lockout_mode & cfg::LOCKOUT_MASK);
        if s.volume_beep {
            b |= cfg::VOLBEEP_ON;
        }
        if self.audio.audio_drc {
            b |= cfg::AUDIO_DRC_ON;
        }
        b
    }

    fn set_settings_byte(&mut self, b: u8) {
        self.settings.status_led = b & cfg::STATLED_MASK;
        self.settings.volume_beep = b & cfg::VOLBEEP_MASK != 0;
        self.settings.auto_power_down = b & cfg::POWERSAVE_MASK;
        self.settings.lockout_mode = b & cfg::LOCKOUT_MASK;
        self.audio.audio_drc = b & cfg::AUDIO_DRC_MASK != 0;
    }

    /// Encode as a `SET_CONFIG` request.
    pub fn to_request(&self) -> Vec<u8> {
        let s = &self.settings;
        let [l1, l2, l3, l4, l5, l6, l7, l8] = self.lights.startup_brightness;
        let mut out = Vec::with_capacity(REPORT_LEN);
        out.push(opcodes::SET_CONFIG);
        out.extend_from_slice(&[l1, l2, l3, l4, l5, l6, s.notch_count]);
        out.extend_from_slice(&s.notch_bounds);
        out.extend_from_slice(&[
            s.rapid_accel_thr,
            s.rapid_decel_thr,
            s.brake_decel_thr,
            s.brake_speed_thr,
        ]);
        out.extend_from_slice(&self.reserved);
        out.extend_from_slice(&[
            s.ir_auto_off,
            s.ble_auto_off,
            s.ble_motor_when_disconnect,
            s.ble_advert_power,
            s.ble_session_power,
            l7,
            l8,
            self.lights.pf_brightness_a,
            self.lights.pf_brightness_b,
            self.audio.bass,
            self.audio.treble,
            self.settings_byte(),
        ]);
        for m in &self.motors {
            out.push(m.config_byte());
            out.extend_from_slice(&m.speed_bytes());
        }
        out.push(self.audio.default_volume);
        out.push(self.lights.default_brightness);
        out
    }

    /// Encode the 60-byte configuration block of a profile image.
    pub fn to_image_bytes(&self) -> Vec<u8> {
        let s = &self.settings;
        let mut out = Vec::with_capacity(IMAGE_CONFIG_LEN);
        out.extend_from_slice(&IMAGE_ICD_VERSION);
        out.extend_from_slice(&IMAGE_PRODUCT_ID);
        out.extend_from_slice(&[0, 0, 0, 0]);
        out.extend_from_slice(&[self.audio.bass, self.audio.treble, self.settings_byte()]);
        for m in &self.motors {
            out.push(m.config_byte());
            out.extend_from_slice(&m.speed_bytes());
        }
        out.push(self.audio.default_volume);
        out.push(self.lights.default_brightness);
        out.extend_from_slice(&self.lights.startup_brightness);
        out.push(self.lights.pf_brightness_a);
        out.push(self.lights.pf_brightness_b);
        out.push(s.notch_count);
        out.extend_from_slice(&s.notch_bounds);
        out.extend_from_slice(&[
            s.ir_auto_off,
            s.ble_auto_off,
            s.ble_motor_when_disconnect,
            s.ble_advert_power,
            s.ble_session_power,
        ]);
        out
    }
}

fn status_led_str(v: u8) -> &'static str {
    if v == cfg::STATLED_ON {
        "Normally ON, blink with activity"
    } else {
        "Normally OFF, blink with activity"
    }
}

fn power_save_str(v: u8) -> &'static str {
    match v {
        cfg::POWERSAVE_30M => "30 min",
        cfg::POWERSAVE_60M => "60 min",
        cfg::POWERSAVE_3HR => "3 hrs",
        _ => "OFF",
    }
}

fn lockout_str(v: u8) -> &'static str {
    match v {
        cfg::LOCKOUT_CH1 => "Toggle from ch 1",
        cfg::LOCKOUT_ALLCH => "Toggle from any ch",
        _ => "Inhibit",
    }
}

fn auto_off_str(v: u8) -> &'static str {
    match v {
        cfg::AUTO_OFF_1MIN => "After 1 min",
        cfg::AUTO_OFF_5MIN => "After 5 min",
        cfg::AUTO_OFF_IMMEDIATE => "Immediately",
        _ => "Never",
    }
}

fn hex_list(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X} ")).collect()
}

impl fmt::Display for BrickConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.settings;
        let on_off = |b: bool| if b { "ON" } else { "OFF" };
        writeln!(f, "Status LED            : {}", status_led_str(s.status_led))?;
        writeln!(f, "Volume Beep           : {}", on_off(s.volume_beep))?;
        writeln!(f, "Auto Power Down       : {}", power_save_str(s.auto_power_down))?;
        writeln!(f, "IR Lockout Mode       : {}", lockout_str(s.lockout_mode))?;
        writeln!(f, "IR Auto Off           : {}", auto_off_str(s.ir_auto_off))?;
        writeln!(f, "BLE Auto Off          : {}", auto_off_str(s.ble_auto_off))?;
        let ble_motor = if s.ble_motor_when_disconnect == cfg::BLE_MOTOR_STOP {
            "Stop motors"
        } else {
            "Continue operation"
        };
        writeln!(f, "BLE Motor Disconnect  : {ble_motor}")?;
        writeln!(f, "BLE Advert Power      : {}", s.ble_advert_power)?;
        writeln!(f, "BLE Session Power     : {}", s.ble_session_power)?;
        writeln!(f, "Motor sound notches   : {}", s.notch_count)?;
        writeln!(f, "Motor sound bounds    : {}", hex_list(&s.notch_bounds))?;
        writeln!(f, "Default brightness    : {:02X}", self.lights.default_brightness)?;
        writeln!(
            f,
            "Startup brightness    : {}",
            hex_list(&self.lights.startup_brightness)
        )?;
        writeln!(
            f,
            "PF output brightness  : {}",
            hex_list(&[self.lights.pf_brightness_a, self.lights.pf_brightness_b])
        )?;
        writeln!(
            f,
            "Audio DRC: {}  Bass: {:02X}  Treble: {:02X}  Volume: {}",
            on_off(self.audio.audio_drc),
            self.audio.bass,
            self.audio.treble,
            self.audio.default_volume
        )?;
        for (i, m) in self.motors.iter().enumerate() {
            writeln!(f, "Motor Channel {}", ['A', 'B', 'C', 'D'].get(i).unwrap_or(&'?'))?;
            writeln!(
                f,
                "  Invert : {}  Torque comp : {}  PF mode : {}",
                m.invert, m.torque_comp, m.tlg_mode
            )?;
            writeln!(f, "  Accel  : {}  Decel : {}", m.accel, m.decel)?;
            writeln!(f, "  vMin   : {}  vMid  : {}  vMax : {}", m.vmin, m.vmid, m.vmax)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> Vec<u8> {
        let mut msg: Vec<u8> = (0u8..64).collect();
        msg[0] = opcodes::GET_CONFIG | 0x80;
        msg[37] = cfg::STATLED_ON | cfg::VOLBEEP_ON | cfg::POWERSAVE_60M | cfg::LOCKOUT_ALLCH;
        msg
    }

    #[test]
    fn test_decode_offsets() -> Result<(), Box<dyn std::error::Error>> {
        let c = BrickConfig::from_response(&sample_response())?;
        assert_eq!(c.lights.startup_brightness, [1, 2, 3, 4, 5, 6, 31, 32]);
        assert_eq!(c.settings.notch_count, 7);
        assert_eq!(c.settings.notch_bounds, [8, 9, 10, 11, 12, 13, 14]);
        assert_eq!(c.settings.rapid_accel_thr, 15);
        assert_eq!(c.settings.brake_speed_thr, 18);
        assert_eq!(c.settings.ir_auto_off, 26);
        assert_eq!(c.settings.ble_session_power, 30);
        assert_eq!(c.lights.pf_brightness_b, 34);
        assert_eq!(c.audio.treble, 36);
        assert!(c.settings.volume_beep);
        assert_eq!(c.settings.auto_power_down, cfg::POWERSAVE_60M);
        assert_eq!(c.settings.lockout_mode, cfg::LOCKOUT_ALLCH);
        assert!(!c.audio.audio_drc);
        assert_eq!(c.motors[0].vmin, 39);
        assert_eq!(c.motors[3].decel, 61);
        assert_eq!(c.audio.default_volume, 62);
        assert_eq!(c.lights.default_brightness, 63);
        Ok(())
    }

    #[test]
    fn test_request_mirrors_response() -> Result<(), Box<dyn std::error::Error>> {
        let msg = sample_response();
        let c = BrickConfig::from_response(&msg)?;
        let req = c.to_request();
        assert_eq!(req.len(), REPORT_LEN);
        assert_eq!(req[0], opcodes::SET_CONFIG);
        // Motor config bytes are normalised to their defined bits.
        for (i, (got, want)) in req.iter().zip(&msg).enumerate().skip(1) {
            if [38, 44, 50, 56].contains(&i) {
                assert_eq!(*got, want & 0x07, "byte {i}");
            } else {
                assert_eq!(got, want, "byte {i}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_short_response_rejected() {
        assert!(BrickConfig::from_response(&[0x83; 40]).is_err());
    }

    #[test]
    fn test_image_block_length() {
        let c = BrickConfig::default();
        let img = c.to_image_bytes();
        assert_eq!(img.len(), IMAGE_CONFIG_LEN);
        assert_eq!(img[..4], [0x03, 0x37, 0xA2, 0x16]);
    }
}
