//! Profile validation

use pfxbrick_errors::{PfxError, PfxResult, ProfileError};
use pfxbrick_hid_protocol::icd::FILE_NAME_LEN;
use pfxbrick_hid_protocol::{LIGHT_CHANNELS, ir_gesture_to_address, validate_notch_table};

use crate::roles::{GATED_SLOTS, MAX_IDLE_LOOPS, MAX_TRANSITION_LOOPS};
use crate::schema::{ProfileConfig, RemoteBinding};

fn invalid(msg: impl Into<String>) -> PfxError {
    ProfileError::validation(msg).into()
}

fn check_gesture(key: &str, gesture: &str) -> PfxResult<()> {
    ir_gesture_to_address(gesture)
        .map(|_| ())
        .map_err(|e| invalid(format!("{key}: {e}")))
}

fn check_binding(key: &str, binding: Option<&RemoteBinding>) -> PfxResult<()> {
    let Some(binding) = binding else {
        return Ok(());
    };
    let mut any = false;
    for gesture in binding.trigger.iter() {
        check_gesture(key, gesture)?;
        any = true;
    }
    if !any {
        return Err(invalid(format!("{key} has no trigger")));
    }
    if let Some(amount) = &binding.amount {
        amount
            .percent()
            .map_err(|e| invalid(format!("{key} amount: {e}")))?;
    }
    Ok(())
}

fn check_loop_count(key: &str, loops: &[String], max: usize) -> PfxResult<()> {
    if loops.len() > max {
        return Err(invalid(format!(
            "{key} has {} files, at most {max} are supported",
            loops.len()
        )));
    }
    Ok(())
}

/// Check a profile for values the brick cannot represent.
///
/// # Errors
///
/// Returns [`ProfileError::ValidationFailed`] describing the first problem.
pub fn validate_profile(config: &ProfileConfig) -> PfxResult<()> {
    if let Some(count) = config.notch_count() {
        validate_notch_table(count, &config.notch_bounds())
            .map_err(|e| invalid(format!("notch table: {e}")))?;
    } else if config.notch_bounds.is_some() {
        return Err(invalid("notch_bounds given without notch_levels"));
    }

    check_loop_count("notch_loops", &config.notch_loops, MAX_IDLE_LOOPS)?;
    check_loop_count("accel_loops", &config.accel_loops, MAX_TRANSITION_LOOPS)?;
    check_loop_count("decel_loops", &config.decel_loops, MAX_TRANSITION_LOOPS)?;
    for (n, group) in config.gated_groups().iter().enumerate() {
        check_loop_count(&format!("gated_notch{}", n + 1), group, GATED_SLOTS)?;
    }

    let bindings = [
        ("increase_speed", config.increase_speed.as_ref()),
        ("decrease_speed", config.decrease_speed.as_ref()),
        ("stop", config.stop.as_ref()),
        ("emergency_stop", config.emergency_stop.as_ref()),
        ("change_dir", config.change_dir.as_ref()),
        ("increase_volume", config.increase_volume.as_ref()),
        ("decrease_volume", config.decrease_volume.as_ref()),
        ("increase_brightness", config.increase_brightness.as_ref()),
        ("decrease_brightness", config.decrease_brightness.as_ref()),
    ];
    for (key, binding) in bindings {
        check_binding(key, binding)?;
    }
    if let Some(clear) = &config.clear_remote {
        for gesture in clear.iter() {
            check_gesture("clear_remote", gesture)?;
        }
    }

    for (key, lights) in [
        ("forward_lights", config.forward_lights.as_ref()),
        ("reverse_lights", config.reverse_lights.as_ref()),
    ] {
        if let Some(lights) = lights
            && (lights.channels.is_empty()
                || lights.channels.iter().any(|ch| !(1..=LIGHT_CHANNELS).contains(ch)))
        {
            return Err(invalid(format!(
                "{key} channels {:?} must be light outputs 1-{LIGHT_CHANNELS}",
                lights.channels
            )));
        }
    }

    for sound in &config.other_sounds {
        match (&sound.probability, &sound.trigger) {
            (None, None) => {
                return Err(invalid(format!(
                    "sound {} needs a probability or a trigger",
                    sound.file
                )));
            }
            (None, Some(gesture)) => check_gesture(&sound.file, gesture)?,
            (Some(_), _) => {}
        }
    }

    for file in config.file_assignments() {
        if file.brick_name.is_empty() {
            return Err(invalid(format!("{} has an empty file name", file.role)));
        }
        if file.brick_name.len() > FILE_NAME_LEN {
            return Err(invalid(format!(
                "brick file name '{}' is {} bytes, at most {FILE_NAME_LEN} fit",
                file.brick_name,
                file.brick_name.len()
            )));
        }
    }
    Ok(())
}

impl ProfileConfig {
    /// # Errors
    ///
    /// See [`validate_profile`].
    pub fn validate(&self) -> PfxResult<()> {
        validate_profile(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LightBinding, OtherSound, Triggers};
    use pfxbrick_hid_protocol::StepAmount;

    fn rejected(config: &ProfileConfig, needle: &str) -> bool {
        matches!(
            validate_profile(config),
            Err(PfxError::Profile(ProfileError::ValidationFailed(msg))) if msg.contains(needle)
        )
    }

    #[test]
    fn test_empty_profile_is_valid() {
        assert!(validate_profile(&ProfileConfig::default()).is_ok());
    }

    #[test]
    fn test_notch_table_checks() {
        let mut config = ProfileConfig {
            notch_levels: Some(3),
            notch_bounds: Some(vec![100, 50]),
            ..ProfileConfig::default()
        };
        assert!(rejected(&config, "strictly increasing"));
        config.notch_bounds = Some(vec![50]);
        assert!(rejected(&config, "need 2 bounds"));
        config.notch_levels = Some(9);
        config.notch_bounds = None;
        assert!(rejected(&config, "notch count"));
        config.notch_levels = None;
        config.notch_bounds = Some(vec![10]);
        assert!(rejected(&config, "without notch_levels"));
    }

    #[test]
    fn test_loop_limits() {
        let config = ProfileConfig {
            accel_loops: (0..8).map(|i| format!("a{i}.wav")).collect(),
            ..ProfileConfig::default()
        };
        assert!(rejected(&config, "accel_loops has 8 files"));

        let config = ProfileConfig {
            gated_notch2: (0..5).map(|i| format!("g{i}.wav")).collect(),
            ..ProfileConfig::default()
        };
        assert!(rejected(&config, "gated_notch2"));
    }

    #[test]
    fn test_bad_bindings() {
        let config = ProfileConfig {
            stop: Some(RemoteBinding {
                trigger: Triggers::One("speed left button".into()),
                amount: None,
            }),
            ..ProfileConfig::default()
        };
        assert!(rejected(&config, "stop"));

        let config = ProfileConfig {
            increase_speed: Some(RemoteBinding {
                trigger: Triggers::One("speed ch 1 left up".into()),
                amount: Some(StepAmount::Text("lots".into())),
            }),
            ..ProfileConfig::default()
        };
        assert!(rejected(&config, "increase_speed amount"));

        let config = ProfileConfig {
            decrease_speed: Some(RemoteBinding {
                trigger: Triggers::Many(Vec::new()),
                amount: None,
            }),
            ..ProfileConfig::default()
        };
        assert!(rejected(&config, "no trigger"));
    }

    #[test]
    fn test_lights_and_sounds() {
        let config = ProfileConfig {
            forward_lights: Some(LightBinding { channels: vec![0, 1] }),
            ..ProfileConfig::default()
        };
        assert!(rejected(&config, "forward_lights"));

        let config = ProfileConfig {
            other_sounds: vec![OtherSound {
                file: "horn.wav".into(),
                probability: None,
                trigger: None,
                repeat: false,
            }],
            ..ProfileConfig::default()
        };
        assert!(rejected(&config, "needs a probability"));
    }

    #[test]
    fn test_long_brick_name() {
        let config = ProfileConfig {
            gated_notch1: vec![format!("{}.wav", "x".repeat(28))],
            ..ProfileConfig::default()
        };
        assert!(rejected(&config, "at most 32 fit"));
    }
}
