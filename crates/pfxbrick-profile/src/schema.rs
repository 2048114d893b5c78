//! Sound profile document types.
//!
//! A profile is a YAML mapping with fixed keys. File entries name audio
//! files relative to `source`; an entry may carry a trailing level
//! (`"idle1.wav 0.8"`) which is kept for compatibility and ignored here
//! because level adjustment happens before files reach this crate.

use std::path::{Path, PathBuf};

use pfxbrick_errors::{PfxResult, ProfileError};
use pfxbrick_hid_protocol::{MAX_NOTCHES, StepAmount, bounds_from_notchcount};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::roles::{FileRole, GATED_GROUPS};

/// Gain of gated loop playback when the profile does not set one.
pub const DEFAULT_GATED_GAIN: u8 = 50;

/// Motor output(s) the profile drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorChannel {
    #[default]
    #[serde(alias = "A")]
    A,
    #[serde(alias = "B")]
    B,
    #[serde(alias = "AB", alias = "both")]
    Ab,
}

impl MotorChannel {
    /// 1-based motor channels for action builders.
    pub fn action_channels(self) -> Vec<u8> {
        match self {
            Self::A => vec![1],
            Self::B => vec![2],
            Self::Ab => vec![1, 2],
        }
    }

    /// Indices into the configuration's motor blocks.
    pub fn config_indices(self) -> &'static [usize] {
        match self {
            Self::A => &[0],
            Self::B => &[1],
            Self::Ab => &[0, 1],
        }
    }

    /// Script names of the motor outputs.
    pub fn script_names(self) -> &'static [&'static str] {
        match self {
            Self::A => &["a"],
            Self::B => &["b"],
            Self::Ab => &["a", "b"],
        }
    }

    /// Motor-select bit of motor-driven sound effects. Only motor B sets it.
    pub fn sound_select(self) -> u8 {
        match self {
            Self::B => pfxbrick_hid_protocol::fx::sound::MOTOR_CH_B,
            Self::A | Self::Ab => 0,
        }
    }
}

/// Which motor speed drives indexed playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedSource {
    #[default]
    Target,
    Current,
}

impl SpeedSource {
    pub fn flag(self) -> u8 {
        match self {
            Self::Target => 0,
            Self::Current => pfxbrick_hid_protocol::fx::sound::SPEED_CURRENT,
        }
    }
}

/// A single gesture or a list of them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Triggers {
    One(String),
    Many(Vec<String>),
}

impl Triggers {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let items: &[String] = match self {
            Self::One(t) => core::slice::from_ref(t),
            Self::Many(ts) => ts,
        };
        items.iter().map(String::as_str)
    }
}

/// A remote control gesture bound to a motor, sound or light behaviour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteBinding {
    pub trigger: Triggers,
    /// Speed change per press; only used by speed bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<StepAmount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LightBinding {
    /// 1-based light outputs.
    pub channels: Vec<u8>,
}

/// A one-shot sound played at random while moving, or on a remote gesture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtherSound {
    pub file: String,
    /// Chance of playing, 0-255. Takes precedence over `trigger`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,
    #[serde(default, skip_serializing_if = "core::ops::Not::not")]
    pub repeat: bool,
}

/// A complete sound profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Directory the audio file entries are relative to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(default, alias = "default_volume", skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,

    #[serde(default)]
    pub motor_channel: MotorChannel,
    #[serde(default)]
    pub motor_speed: SpeedSource,
    #[serde(default, alias = "accel", skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<u8>,
    #[serde(default, alias = "decel", skip_serializing_if = "Option::is_none")]
    pub deceleration: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vmin: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vmid: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vmax: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor_invert: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor_pfmode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor_low_torque: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rapid_accel_thr: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rapid_decel_thr: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake_decel_thr: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake_speed_thr: Option<u8>,

    #[serde(default, alias = "notch_count", skip_serializing_if = "Option::is_none")]
    pub notch_levels: Option<u8>,
    /// Explicit boundaries; evenly spaced ones are derived when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notch_bounds: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notch_loops: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accel_loops: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decel_loops: Vec<String>,
    /// Skip the startup sound when indexed playback restarts; default on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_startup: Option<bool>,

    #[serde(default, alias = "gated_loops", skip_serializing_if = "Vec::is_empty")]
    pub gated_notch1: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gated_notch2: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gated_notch3: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gated_notch4: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gated_gain: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_dir_sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_off_sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rapid_accel_loop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rapid_decel_loop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake_stop_sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_whistle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_whistle: Option<String>,
    #[serde(
        default,
        alias = "random_sounds",
        alias = "random",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub other_sounds: Vec<OtherSound>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increase_speed: Option<RemoteBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decrease_speed: Option<RemoteBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<RemoteBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_stop: Option<RemoteBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_dir: Option<RemoteBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increase_volume: Option<RemoteBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decrease_volume: Option<RemoteBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increase_brightness: Option<RemoteBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decrease_brightness: Option<RemoteBinding>,
    /// Gestures whose LUT entries are cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear_remote: Option<Triggers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_lights: Option<LightBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_lights: Option<LightBinding>,
}

/// One audio file of a profile and where it goes on the brick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAssignment {
    pub role: FileRole,
    /// Path relative to the profile's `source` directory.
    pub source: String,
    /// Name stored on the brick.
    pub brick_name: String,
}

impl FileAssignment {
    pub fn file_id(&self) -> u8 {
        self.role.file_id()
    }

    pub fn attributes(&self) -> u16 {
        self.role.attributes()
    }
}

/// File part of a profile entry, without any trailing level.
pub fn entry_file(entry: &str) -> &str {
    entry.split_whitespace().next().unwrap_or(entry)
}

/// Base name of a profile entry as stored on the brick.
pub fn entry_brick_name(entry: &str) -> String {
    let file = entry_file(entry);
    Path::new(file)
        .file_name()
        .map_or_else(|| file.to_string(), |n| n.to_string_lossy().into_owned())
}

impl ProfileConfig {
    /// Parse a YAML profile and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidFormat`] for YAML that does not match the
    /// schema and [`ProfileError::ValidationFailed`] for inconsistent values.
    pub fn from_yaml_str(text: &str, origin: &str) -> PfxResult<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| ProfileError::invalid_format(origin, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a profile file. A relative `source` is resolved against the
    /// directory holding the profile; a missing one means that directory.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise the errors
    /// of [`from_yaml_str`](Self::from_yaml_str).
    pub async fn load(path: &Path) -> PfxResult<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        let mut config = Self::from_yaml_str(&text, &path.display().to_string())?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.source = Some(match config.source.take() {
            Some(src) if src.is_relative() => base.join(src),
            Some(src) => src,
            None => base.to_path_buf(),
        });
        debug!(path = %path.display(), "loaded sound profile");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidFormat`] if serialization fails.
    pub fn to_yaml_string(&self) -> PfxResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ProfileError::invalid_format("<profile>", e.to_string()).into())
    }

    pub fn skip_startup(&self) -> bool {
        self.skip_startup.unwrap_or(true)
    }

    pub fn gated_gain(&self) -> u8 {
        self.gated_gain.unwrap_or(DEFAULT_GATED_GAIN)
    }

    /// Notch level count: explicit, else one per idle loop.
    pub fn notch_count(&self) -> Option<usize> {
        self.notch_levels.map(usize::from).or_else(|| {
            (!self.notch_loops.is_empty()).then_some(self.notch_loops.len().min(MAX_NOTCHES))
        })
    }

    /// Notch boundaries: explicit, else evenly spaced for the level count.
    pub fn notch_bounds(&self) -> Vec<u8> {
        match (&self.notch_bounds, self.notch_count()) {
            (Some(bounds), _) => bounds.clone(),
            (None, Some(count)) => bounds_from_notchcount(count),
            (None, None) => Vec::new(),
        }
    }

    /// Gated loop groups in order, empty groups included.
    pub fn gated_groups(&self) -> [&[String]; GATED_GROUPS] {
        [
            &self.gated_notch1,
            &self.gated_notch2,
            &self.gated_notch3,
            &self.gated_notch4,
        ]
    }

    pub fn has_gated_loops(&self) -> bool {
        self.gated_groups().iter().any(|g| !g.is_empty())
    }

    /// Role-tagged special files, in script order.
    pub fn special_files(&self) -> [(FileRole, Option<&String>); 10] {
        [
            (FileRole::Startup, self.startup.as_ref()),
            (FileRole::Shutdown, self.shutdown.as_ref()),
            (FileRole::ChangeDir, self.change_dir_sound.as_ref()),
            (FileRole::SetOff, self.set_off_sound.as_ref()),
            (FileRole::BrakeStop, self.brake_stop_sound.as_ref()),
            (FileRole::RapidAccel, self.rapid_accel_loop.as_ref()),
            (FileRole::RapidDecel, self.rapid_decel_loop.as_ref()),
            (FileRole::Bell, self.bell.as_ref()),
            (FileRole::ShortWhistle, self.short_whistle.as_ref()),
            (FileRole::LongWhistle, self.long_whistle.as_ref()),
        ]
    }

    /// Every audio file of the profile with its reserved id, in a stable
    /// order: special files, idle, accel and decel loops, gated groups, then
    /// other sounds at ids `1, 2, ...`.
    pub fn file_assignments(&self) -> Vec<FileAssignment> {
        let mut out = Vec::new();
        let mut push = |role: FileRole, entry: &str, prefix: Option<String>| {
            let name = entry_brick_name(entry);
            out.push(FileAssignment {
                role,
                source: entry_file(entry).to_string(),
                brick_name: match prefix {
                    Some(p) => format!("{p}{name}"),
                    None => name,
                },
            });
        };
        for (role, entry) in self.special_files() {
            if let Some(entry) = entry {
                push(role, entry, None);
            }
        }
        let indexed: [(&Vec<String>, fn(u8) -> FileRole); 3] = [
            (&self.notch_loops, FileRole::IdleLoop),
            (&self.accel_loops, FileRole::AccelLoop),
            (&self.decel_loops, FileRole::DecelLoop),
        ];
        for (loops, role) in indexed {
            for (n, entry) in (0u8..).zip(loops.iter()) {
                push(role(n), entry, None);
            }
        }
        for (group, loops) in (0u8..).zip(self.gated_groups()) {
            for (slot, entry) in (0u8..).zip(loops.iter()) {
                push(
                    FileRole::GatedLoop { group, slot },
                    entry,
                    Some(format!("L{}", u16::from(group) + 1)),
                );
            }
        }
        for (id, sound) in (1u8..).zip(self.other_sounds.iter()) {
            push(FileRole::Effect(id), &sound.file, None);
        }
        out
    }

    /// Brick-side name of the other sound at `index`.
    pub fn other_sound_name(&self, index: usize) -> Option<String> {
        self.other_sounds.get(index).map(|s| entry_brick_name(&s.file))
    }

    /// Directory audio files are read from.
    pub fn source_dir(&self) -> &Path {
        self.source.as_deref().unwrap_or_else(|| Path::new(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const PROFILE: &str = r#"
source: sounds
volume: 80
motor_channel: b
motor_speed: current
accel: 3
notch_levels: 3
notch_loops: [idle1.wav, idle2.wav, "idle3.wav 0.8"]
accel_loops: [acc1.wav, acc2.wav]
gated_loops: [g1.wav, g2.wav]
gated_notch3: [hi.wav]
startup: start.wav
bell: ding.wav
other_sounds:
  - file: fx/squeal.wav
    probability: 20
  - file: horn.wav
    trigger: speed ch 1 left button
increase_speed:
  trigger: [speed ch 1 left up, joy ch 1 left fwd]
  amount: 10%
clear_remote: speed ch 2 left button
"#;

    #[test]
    fn test_parse_with_aliases() -> TestResult {
        let config = ProfileConfig::from_yaml_str(PROFILE, "test")?;
        assert_eq!(config.volume, Some(80));
        assert_eq!(config.acceleration, Some(3));
        assert_eq!(config.motor_channel, MotorChannel::B);
        assert_eq!(config.motor_speed, SpeedSource::Current);
        assert_eq!(config.gated_notch1.len(), 2);
        assert!(config.skip_startup());
        assert_eq!(config.gated_gain(), DEFAULT_GATED_GAIN);
        assert_eq!(config.notch_bounds(), vec![85, 170]);
        let triggers: Vec<&str> = config
            .increase_speed
            .as_ref()
            .map(|b| b.trigger.iter().collect())
            .unwrap_or_default();
        assert_eq!(triggers.len(), 2);
        Ok(())
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result = ProfileConfig::from_yaml_str("notch_levls: 3\n", "typo.yml");
        assert!(matches!(
            result,
            Err(pfxbrick_errors::PfxError::Profile(ProfileError::InvalidFormat { path, .. })) if path == "typo.yml"
        ));
    }

    #[test]
    fn test_file_assignments() -> TestResult {
        let config = ProfileConfig::from_yaml_str(PROFILE, "test")?;
        let files: Vec<(u8, u16, String)> = config
            .file_assignments()
            .into_iter()
            .map(|f| (f.file_id(), f.attributes(), f.brick_name))
            .collect();
        assert_eq!(
            files,
            vec![
                (0xEF, 0x5C, "start.wav".to_string()),
                (0xF8, 0x00, "ding.wav".to_string()),
                (0xE0, 0x20, "idle1.wav".to_string()),
                (0xE1, 0x24, "idle2.wav".to_string()),
                (0xE2, 0x28, "idle3.wav".to_string()),
                (0xE8, 0x40, "acc1.wav".to_string()),
                (0xE9, 0x44, "acc2.wav".to_string()),
                (0xD0, 0x10, "L1g1.wav".to_string()),
                (0xD1, 0x14, "L1g2.wav".to_string()),
                (0xD8, 0x10, "L3hi.wav".to_string()),
                (0x01, 0x00, "squeal.wav".to_string()),
                (0x02, 0x00, "horn.wav".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_notch_count_follows_loops() {
        let config = ProfileConfig {
            notch_loops: vec!["a.wav".into(), "b.wav".into(), "c.wav".into(), "d.wav".into()],
            ..ProfileConfig::default()
        };
        assert_eq!(config.notch_count(), Some(4));
        assert_eq!(config.notch_bounds(), vec![64, 128, 191]);
    }

    #[test]
    fn test_yaml_round_trip_keeps_defaults_implicit() -> TestResult {
        let config = ProfileConfig::from_yaml_str(PROFILE, "test")?;
        let text = config.to_yaml_string()?;
        assert!(!text.contains("skip_startup"));
        assert!(!text.contains("gated_gain"));
        assert_eq!(ProfileConfig::from_yaml_str(&text, "again")?, config);
        Ok(())
    }
}
