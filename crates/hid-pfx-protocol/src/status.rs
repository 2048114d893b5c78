//! Status, ICD revision and runtime state responses.

use core::fmt;

use pfxbrick_errors::{PfxResult, fs_error_message};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec::{bcd_version_from_bytes, hex_u16, hex_u32, parse_version};
use crate::file::decode_name;
use crate::icd::{FAST_WRITE_MIN_ICD, FILE_INVALID_ID, status_str};
use crate::report::ResponseReader;

/// Decoded `GET_STATUS` response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickStatus {
    pub status: u8,
    pub error: u8,
    /// Hex string, e.g. `A216`.
    pub product_id: String,
    /// Hex string of the 4-byte serial number.
    pub serial_no: String,
    pub product_desc: String,
    /// `M.mm`
    pub firmware_version: String,
    /// Hex string of the build number.
    pub firmware_build: String,
}

impl BrickStatus {
    /// Decode a `GET_STATUS` response.
    ///
    /// # Errors
    ///
    /// Returns a short-response error if the response is under 41 bytes.
    pub fn from_response(msg: &[u8]) -> PfxResult<Self> {
        let mut r = ResponseReader::at(msg, 1);
        let status = r.read_u8()?;
        let error = r.read_u8()?;
        r.skip(4);
        let [pid_hi, pid_lo] = r.read_array()?;
        let serial = r.read_array()?;
        let desc = decode_name(r.read_bytes(24)?);
        let [fw_hi, fw_lo] = r.read_array()?;
        let [build_hi, build_lo] = r.read_array()?;
        Ok(Self {
            status,
            error,
            product_id: hex_u16(pid_hi, pid_lo),
            serial_no: hex_u32(serial),
            product_desc: desc.trim_end().to_string(),
            firmware_version: bcd_version_from_bytes(fw_hi, fw_lo),
            firmware_build: hex_u16(build_hi, build_lo),
        })
    }

    pub fn status_str(&self) -> &'static str {
        status_str(self.status)
    }

    pub fn error_str(&self) -> &'static str {
        if self.error == 0 {
            "None"
        } else {
            fs_error_message(self.error)
        }
    }
}

impl fmt::Display for BrickStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "PFx Brick product ID  : {}, {}",
            self.product_id, self.product_desc
        )?;
        writeln!(f, "Serial number         : {}", self.serial_no)?;
        writeln!(
            f,
            "Firmware version      : {} build {}",
            self.firmware_version, self.firmware_build
        )?;
        writeln!(f, "Status                : {:02X} {}", self.status, self.status_str())?;
        write!(f, "Errors                : {:02X} {}", self.error, self.error_str())
    }
}

/// ICD revision reported by `GET_ICD_REV`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcdRevision {
    /// `M.mm` text as decoded from BCD.
    pub text: String,
}

impl IcdRevision {
    /// Decode `[tag, msb, lsb]`.
    ///
    /// # Errors
    ///
    /// Returns a short-response error if the response is under 3 bytes.
    pub fn from_response(msg: &[u8]) -> PfxResult<Self> {
        let [msb, lsb] = ResponseReader::at(msg, 1).read_array()?;
        Ok(Self {
            text: bcd_version_from_bytes(msb, lsb),
        })
    }

    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Whether `FILE_WRITE_FAST` is available (ICD 3.39 or later). A revision
    /// that does not parse as `M.mm` is treated as legacy.
    pub fn supports_fast_write(&self) -> bool {
        match parse_version(&self.text) {
            Ok(v) => v >= FAST_WRITE_MIN_ICD,
            Err(e) => {
                warn!(version = %self.text, error = %e, "unparseable ICD revision, using legacy file writes");
                false
            }
        }
    }
}

impl fmt::Display for IcdRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Decode the brick name from a `GET_NAME` response (bytes 1-24).
///
/// # Errors
///
/// Returns a short-response error if the response is under 25 bytes.
pub fn name_from_response(msg: &[u8]) -> PfxResult<String> {
    let bytes = ResponseReader::at(msg, 1).read_bytes(24)?;
    Ok(decode_name(bytes))
}

/// Runtime state of one motor channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorState {
    pub reverse: bool,
    pub target_speed: u8,
    pub current_speed: u8,
    pub pwm_speed: u8,
}

/// Runtime state of one light channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    pub active: bool,
    pub target_level: u8,
    pub current_level: u8,
}

/// Runtime state of one audio channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioChannelState {
    pub mode: u8,
    pub file_id: u8,
}

impl Default for AudioChannelState {
    fn default() -> Self {
        Self {
            mode: 0,
            file_id: FILE_INVALID_ID,
        }
    }
}

/// Number of light channels reported in the runtime state.
pub const STATE_LIGHT_CHANNELS: usize = 12;

/// Decoded `GET_CURRENT_STATE` response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickState {
    pub brightness: u8,
    pub volume: u8,
    pub motors: [MotorState; 2],
    pub motor_ptr: u8,
    pub motor_pwm_ptr: u8,
    pub motor_rate_ptr: u8,
    pub trig_change_dir_state: u8,
    pub trig_set_off_state: u8,
    pub trig_rapid_accel_state: u8,
    pub trig_rapid_decel_state: u8,
    pub trig_brake_state: u8,
    pub light_mask: u16,
    pub lights: [LightState; STATE_LIGHT_CHANNELS],
    pub audio_ch: [AudioChannelState; 4],
    pub millisec_count: u16,
    pub slow_count: u16,
    pub status_latch1: u8,
    pub status_latch2: u8,
    pub fs_state: u8,
    pub audio_peak: u8,
    pub audio_notch: u8,
    pub script_state: u8,
    pub script_line: u8,
}

impl BrickState {
    /// Decode a `GET_CURRENT_STATE` response.
    ///
    /// # Errors
    ///
    /// Returns a short-response error if the response is under 64 bytes.
    pub fn from_response(msg: &[u8]) -> PfxResult<Self> {
        let mut r = ResponseReader::at(msg, 1);
        let mut s = Self {
            brightness: r.read_u8()?,
            volume: r.read_u8()?,
            ..Self::default()
        };
        for m in &mut s.motors {
            let [dir, target, current, pwm] = r.read_array()?;
            *m = MotorState {
                reverse: dir & 0x01 != 0,
                target_speed: target,
                current_speed: current,
                pwm_speed: pwm,
            };
        }
        s.motor_ptr = r.read_u8()?;
        s.motor_pwm_ptr = r.read_u8()?;
        s.motor_rate_ptr = r.read_u8()?;
        s.trig_change_dir_state = r.read_u8()?;
        s.trig_set_off_state = r.read_u8()?;
        s.trig_rapid_accel_state = r.read_u8()?;
        s.trig_rapid_decel_state = r.read_u8()?;
        s.trig_brake_state = r.read_u8()?;
        let [mask_lo, mask_hi] = r.read_array()?;
        s.light_mask = u16::from_le_bytes([mask_lo, mask_hi]);
        let targets: [u8; STATE_LIGHT_CHANNELS] = r.read_array()?;
        let currents: [u8; STATE_LIGHT_CHANNELS] = r.read_array()?;
        for (i, light) in s.lights.iter_mut().enumerate() {
            light.active = s.light_mask & (1 << i) != 0;
            light.target_level = targets.get(i).copied().unwrap_or(0);
            light.current_level = currents.get(i).copied().unwrap_or(0);
        }
        for ch in &mut s.audio_ch {
            let [mode, file_id] = r.read_array()?;
            *ch = AudioChannelState { mode, file_id };
        }
        s.millisec_count = r.read_u16_be()?;
        s.slow_count = r.read_u16_be()?;
        s.status_latch1 = r.read_u8()?;
        s.status_latch2 = r.read_u8()?;
        s.fs_state = r.read_u8()?;
        s.audio_peak = r.read_u8()?;
        s.audio_notch = r.read_u8()?;
        s.script_state = r.read_u8()?;
        s.script_line = r.read_u8()?;
        Ok(s)
    }
}

impl fmt::Display for BrickState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Brightness: {:3}  Volume: {:3}", self.brightness, self.volume)?;
        writeln!(
            f,
            "Slow count: {:4X}  Millisec count: {:4X}",
            self.slow_count, self.millisec_count
        )?;
        writeln!(
            f,
            "File system: {:2X} Script exec: {:2X} Script line: {:3}",
            self.fs_state, self.script_state, self.script_line
        )?;
        writeln!(
            f,
            "Status 1: {:2X}  Status 2: {:2X}",
            self.status_latch1, self.status_latch2
        )?;
        for (i, m) in (1..).zip(&self.motors) {
            writeln!(
                f,
                "Motor Ch {i} : Dir: {:>7} Target speed: 0x{:02X}  Current: 0x{:02X}  PWM: 0x{:02X}",
                if m.reverse { "Reverse" } else { "Forward" },
                m.target_speed,
                m.current_speed,
                m.pwm_speed
            )?;
        }
        for (i, l) in (1..).zip(&self.lights) {
            writeln!(
                f,
                "Light Ch {i:2} : Active: {:>5} Target level: 0x{:02X}  Current level: 0x{:02X}",
                l.active, l.target_level, l.current_level
            )?;
        }
        for (i, a) in (1..).zip(&self.audio_ch) {
            writeln!(f, "Audio Ch {i} : Mode: {} Current file: {:3}", a.mode, a.file_id)?;
        }
        write!(
            f,
            "Audio Peak: {:3}  Audio notch: {}",
            self.audio_peak, self.audio_notch
        )
    }
}
