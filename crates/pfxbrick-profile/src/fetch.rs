//! Rebuild a profile from what is stored on a brick.

use std::collections::BTreeMap;

use pfxbrick::{PfxBrick, PfxResult};
use pfxbrick_hid_protocol::fx::sound;
use pfxbrick_hid_protocol::{Action, BrickConfig, DirEntry, STARTUP_ADDRESSES};
use pfxbrick_transport::DeviceChannel;
use tracing::debug;

use crate::roles::{FileRole, GATED_GROUPS};
use crate::schema::{MotorChannel, OtherSound, ProfileConfig, SpeedSource};

fn ordered(map: BTreeMap<u8, String>) -> Vec<String> {
    map.into_values().collect()
}

/// Strip the `L<group>` prefix added to gated loop names on upload.
fn gated_entry(group: u8, name: &str) -> String {
    let prefix = format!("L{}", u16::from(group) + 1);
    name.strip_prefix(&prefix).unwrap_or(name).to_string()
}

/// Motor the indexed playback action follows. Without one, motor A.
fn indexed_motor(startup: &[Action]) -> MotorChannel {
    startup
        .iter()
        .find(|a| a.sound_fx_id == sound::PLAY_IDX_MOTOR)
        .map_or(MotorChannel::A, |a| {
            if a.sound_param1 & 0x03 == sound::MOTOR_CH_B {
                MotorChannel::B
            } else {
                MotorChannel::A
            }
        })
}

/// Build a profile from a configuration block, directory listing and the
/// eight startup LUT slots.
///
/// File entries are brick names; `source` is left unset. Motor settings come
/// from the block of the motor the indexed playback action follows. Startup
/// is dropped when that action is present without its startup flag.
pub fn profile_from_brick(config: &BrickConfig, files: &[DirEntry], startup: &[Action]) -> ProfileConfig {
    let motor_channel = indexed_motor(startup);
    let motor = motor_channel
        .config_indices()
        .first()
        .and_then(|&i| config.motors.get(i))
        .cloned()
        .unwrap_or_default();
    let settings = &config.settings;
    let mut profile = ProfileConfig {
        volume: Some(config.audio.default_volume),
        motor_channel,
        acceleration: Some(motor.accel),
        deceleration: Some(motor.decel),
        vmin: Some(motor.vmin),
        vmid: Some(motor.vmid),
        vmax: Some(motor.vmax),
        motor_invert: Some(motor.invert),
        motor_pfmode: Some(motor.tlg_mode),
        motor_low_torque: Some(motor.torque_comp),
        rapid_accel_thr: Some(settings.rapid_accel_thr),
        rapid_decel_thr: Some(settings.rapid_decel_thr),
        brake_decel_thr: Some(settings.brake_decel_thr),
        brake_speed_thr: Some(settings.brake_speed_thr),
        ..ProfileConfig::default()
    };
    if (1..=8).contains(&settings.notch_count) {
        profile.notch_levels = Some(settings.notch_count);
        let bounds = usize::from(settings.notch_count).saturating_sub(1);
        profile.notch_bounds = Some(settings.notch_bounds.iter().take(bounds).copied().collect());
    }

    let mut idle = BTreeMap::new();
    let mut accel = BTreeMap::new();
    let mut decel = BTreeMap::new();
    let mut gated: [BTreeMap<u8, String>; GATED_GROUPS] = Default::default();
    for entry in files {
        let Some(role) = FileRole::from_dir_entry(entry) else {
            continue;
        };
        let name = entry.name.clone();
        match role {
            FileRole::IdleLoop(n) => {
                idle.insert(n, name);
            }
            FileRole::AccelLoop(n) => {
                accel.insert(n, name);
            }
            FileRole::DecelLoop(n) => {
                decel.insert(n, name);
            }
            FileRole::GatedLoop { group, slot } => {
                if let Some(g) = gated.get_mut(usize::from(group)) {
                    g.insert(slot, gated_entry(group, &name));
                }
            }
            FileRole::Startup => profile.startup = Some(name),
            FileRole::Shutdown => profile.shutdown = Some(name),
            FileRole::ChangeDir => profile.change_dir_sound = Some(name),
            FileRole::SetOff => profile.set_off_sound = Some(name),
            FileRole::RapidAccel => profile.rapid_accel_loop = Some(name),
            FileRole::RapidDecel => profile.rapid_decel_loop = Some(name),
            FileRole::BrakeStop => profile.brake_stop_sound = Some(name),
            FileRole::Bell => profile.bell = Some(name),
            FileRole::ShortWhistle => profile.short_whistle = Some(name),
            FileRole::LongWhistle => profile.long_whistle = Some(name),
            FileRole::Effect(_) => {}
        }
    }
    profile.notch_loops = ordered(idle);
    profile.accel_loops = ordered(accel);
    profile.decel_loops = ordered(decel);
    let [g1, g2, g3, g4] = gated;
    profile.gated_notch1 = ordered(g1);
    profile.gated_notch2 = ordered(g2);
    profile.gated_notch3 = ordered(g3);
    profile.gated_notch4 = ordered(g4);

    for action in startup {
        match action.sound_fx_id {
            sound::PLAY_IDX_MOTOR => {
                profile.motor_speed = if action.sound_param1 & sound::SPEED_CURRENT != 0 {
                    SpeedSource::Current
                } else {
                    SpeedSource::Target
                };
                profile.skip_startup = Some(action.sound_param2 & sound::IDX_SKIP_STARTUP != 0);
                if action.sound_param2 & sound::IDX_STARTUP == 0 {
                    profile.startup = None;
                }
            }
            sound::PLAY_GATED => profile.gated_gain = Some(action.sound_param2),
            sound::PLAY_RAND => {
                let file = files
                    .iter()
                    .find(|f| f.id == action.sound_file_id)
                    .map_or_else(|| format!("0x{:02X}", action.sound_file_id), |f| f.name.clone());
                profile.other_sounds.push(OtherSound {
                    file,
                    probability: Some(action.sound_param1),
                    trigger: None,
                    repeat: false,
                });
            }
            _ => {}
        }
    }
    profile
}

/// Read the configuration, directory and startup table of a brick and
/// rebuild the profile they implement.
///
/// # Errors
///
/// Returns the first failed transaction.
pub async fn fetch_from_brick<C: DeviceChannel>(brick: &mut PfxBrick<C>) -> PfxResult<ProfileConfig> {
    let config = brick.get_config().await?;
    let files = brick.refresh_file_dir().await?.files.clone();
    let mut startup = Vec::with_capacity(STARTUP_ADDRESSES.len());
    for address in STARTUP_ADDRESSES {
        startup.push(brick.get_action_by_address(address).await?);
    }
    let profile = profile_from_brick(&config, &files, &startup);
    debug!(
        files = files.len(),
        loops = profile.notch_loops.len(),
        "fetched profile from brick"
    );
    Ok(profile)
}
