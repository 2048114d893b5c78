//! `startup.pfx` script generation.
//!
//! The script reproduces a profile with brick script statements so that a
//! brick configures itself on power-up without a host.

use pfxbrick_hid_protocol::{Action, ir_gesture_to_address};

use pfxbrick_hid_protocol::fx::sound;

use crate::compiler::{
    direction_light, gated_sound_action, indexed_sound_action, remote_bindings,
    triggered_sound_action,
};
use crate::schema::ProfileConfig;

fn config_lines(profile: &ProfileConfig, s: &mut Vec<String>) {
    if let Some(vol) = profile.volume {
        s.push(format!("set config vol = {vol}"));
    }
    for motor in profile.motor_channel.script_names() {
        let values = [
            ("accel", profile.acceleration),
            ("decel", profile.deceleration),
            ("v0", profile.vmin),
            ("v1", profile.vmid),
            ("v2", profile.vmax),
        ];
        for (key, value) in values {
            if let Some(v) = value {
                s.push(format!("set config motor {motor} {key} = {v}"));
            }
        }
        let flags = [
            ("invert", profile.motor_invert),
            ("pf", profile.motor_pfmode),
            ("torque", profile.motor_low_torque),
        ];
        for (key, value) in flags {
            if let Some(v) = value {
                s.push(format!("set config motor {motor} {key} = {}", u8::from(v)));
            }
        }
    }
    if let Some(count) = profile.notch_count() {
        s.push(format!("set config nc = {count}"));
        for (i, bound) in (1..).zip(profile.notch_bounds()) {
            s.push(format!("set config nb {i} = {bound}"));
        }
    }
    let thresholds = [
        ("accel", profile.rapid_accel_thr),
        ("decel", profile.rapid_decel_thr),
        ("rate", profile.brake_decel_thr),
        ("speed", profile.brake_speed_thr),
    ];
    for (key, value) in thresholds {
        if let Some(v) = value {
            s.push(format!("set config thr {key} = {v}"));
        }
    }
}

fn file_lines(profile: &ProfileConfig, s: &mut Vec<String>) {
    for file in profile.file_assignments() {
        if let Some(key) = file.role.script_key() {
            s.push(format!("set file {key} = \"{}\"", file.brick_name));
        }
    }
}

fn event(s: &mut Vec<String>, gesture: &str, action: &Action, name: Option<&str>) {
    // Gestures are checked by validation; an unknown one is left out.
    if let Ok(address) = ir_gesture_to_address(gesture) {
        s.push(action.to_event_script_str(address, name));
    }
}

/// Render the profile as a brick script.
///
/// The profile is expected to be valid; statements for values that do not
/// resolve (an unknown gesture, a malformed amount) are omitted.
pub fn export_script(profile: &ProfileConfig) -> String {
    let mut s = vec![
        "# Sound profile configuration script\n".to_string(),
        "# Set configuration\n".to_string(),
    ];
    config_lines(profile, &mut s);

    s.push("\n# Set file assignments\n".into());
    file_lines(profile, &mut s);

    if profile.notch_count().is_some_and(|n| n > 1) {
        let a = indexed_sound_action(profile);
        s.push("\n# Activate motor indexed sound effects".into());
        s.push(format!(
            "sound fx {} 0 0x{:02X} 0x{:02X}",
            a.sound_fx_id, a.sound_param1, a.sound_param2
        ));
    }
    if profile.has_gated_loops() {
        let a = gated_sound_action(profile);
        s.push("\n# Activate motor gated sound effects".into());
        s.push(format!(
            "sound fx {} 0 0x{:02X} 0x{:02X}",
            a.sound_fx_id, a.sound_param1, a.sound_param2
        ));
    }

    if !profile.other_sounds.is_empty() {
        s.push("\n# Other sound effects".into());
        for ((id, sound), i) in (1u8..).zip(profile.other_sounds.iter()).zip(0usize..) {
            let name = profile.other_sound_name(i).unwrap_or_default();
            if let Some(probability) = sound.probability {
                s.push("# random sound effect".into());
                let a = Action::sound_fx(sound::PLAY_RAND, [probability, 0], Some(id));
                s.push(a.to_script_str(Some(&name)));
            } else if let Some(trigger) = &sound.trigger {
                let a = triggered_sound_action(id, sound.repeat);
                event(&mut s, trigger, &a, Some(&name));
            }
        }
    }

    for (title, lights, reverse) in [
        ("Forward (head) lights", profile.forward_lights.as_ref(), false),
        ("Reverse (tail) lights", profile.reverse_lights.as_ref(), true),
    ] {
        if let Some(lights) = lights {
            s.push(format!("\n# {title}"));
            s.push(direction_light(lights, profile.motor_channel, reverse).to_script_str(None));
        }
    }

    s.push("\n# Setup remote control".into());
    if let Ok(bindings) = remote_bindings(profile) {
        for (title, binding, action) in bindings {
            s.push(format!("# {title}"));
            for gesture in binding.trigger.iter() {
                event(&mut s, gesture, &action, None);
            }
        }
    }
    if let Some(clear) = &profile.clear_remote {
        s.push("# clear actions from remote events".into());
        for gesture in clear.iter() {
            event(&mut s, gesture, &Action::new(), None);
        }
    }
    s.push("\n".into());
    s.join("\n")
}

/// File id the script takes in a profile image: the lowest id no audio
/// file of the profile uses.
pub fn image_script_id(profile: &ProfileConfig) -> u8 {
    let used: Vec<u8> = profile
        .file_assignments()
        .iter()
        .map(|f| f.role.file_id())
        .collect();
    (0..=u8::MAX).find(|id| !used.contains(id)).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LightBinding, MotorChannel, OtherSound, RemoteBinding, SpeedSource, Triggers};
    use pfxbrick_hid_protocol::StepAmount;

    #[test]
    fn test_minimal_script() {
        let script = export_script(&ProfileConfig {
            volume: Some(75),
            ..ProfileConfig::default()
        });
        insta::assert_snapshot!(script, @r"
        # Sound profile configuration script

        # Set configuration

        set config vol = 75

        # Set file assignments


        # Setup remote control


        ");
    }

    #[test]
    fn test_full_script() {
        let profile = ProfileConfig {
            motor_channel: MotorChannel::B,
            motor_speed: SpeedSource::Current,
            acceleration: Some(3),
            motor_invert: Some(false),
            rapid_accel_thr: Some(40),
            notch_loops: vec!["idle1.wav".into(), "idle2.wav".into()],
            startup: Some("start.wav".into()),
            bell: Some("bell.wav".into()),
            gated_notch1: vec!["g1.wav".into()],
            other_sounds: vec![
                OtherSound {
                    file: "squeal.wav".into(),
                    probability: Some(20),
                    trigger: None,
                    repeat: false,
                },
                OtherSound {
                    file: "horn.wav".into(),
                    probability: None,
                    trigger: Some("speed ch 1 left button".into()),
                    repeat: false,
                },
            ],
            forward_lights: Some(LightBinding { channels: vec![1, 2] }),
            increase_speed: Some(RemoteBinding {
                trigger: Triggers::One("speed ch 1 left up".into()),
                amount: Some(StepAmount::Percent(10)),
            }),
            clear_remote: Some(Triggers::One("speed ch 2 left button".into())),
            ..ProfileConfig::default()
        };
        insta::assert_snapshot!(export_script(&profile), @r#"
        # Sound profile configuration script

        # Set configuration

        set config motor b accel = 3
        set config motor b invert = 0
        set config nc = 2
        set config nb 1 = 128
        set config thr accel = 40

        # Set file assignments

        set file startup = "start.wav"
        set file speed 1 = "idle1.wav"
        set file speed 2 = "idle2.wav"
        set file gated 11 = "L1g1.wav"

        # Activate motor indexed sound effects
        sound fx 12 0 0x05 0x0C

        # Activate motor gated sound effects
        sound fx 9 0 0x05 0x32

        # Other sound effects
        # random sound effect
        sound fx 13 "squeal.wav" 20 0
        event 0x04 {
            sound fx 4 "horn.wav" 0 0
        }

        # Forward (head) lights
        light [1, 2] fx 0x01 3 4 0 1 0

        # Setup remote control
        # Increase speed
        event 0x0C {
            motor [b] fx 0x2 6 0
        }
        # clear actions from remote events
        event 0x05 {
        }


        "#);
    }

    #[test]
    fn test_script_id_skips_profile_files() {
        let profile = ProfileConfig {
            other_sounds: vec![OtherSound {
                file: "a.wav".into(),
                probability: Some(1),
                trigger: None,
                repeat: false,
            }],
            ..ProfileConfig::default()
        };
        assert_eq!(image_script_id(&profile), 0);
    }
}
