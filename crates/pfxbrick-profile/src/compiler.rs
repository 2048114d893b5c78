//! Compile a profile into configuration changes and LUT entries.
//!
//! Compilation is pure: [`apply_to_config`] edits a [`BrickConfig`] in place
//! and [`lut_program`] lists the actions to store. The brick-facing half
//! lives in [`crate::program`]; [`LutProgram::apply_offline`] writes the same
//! entries into an in-memory table for image export.

use core::fmt;

use pfxbrick::{EffectKey, plan_startup_slot};
use pfxbrick_errors::PfxResult;
use pfxbrick_hid_protocol::fx::{light, sound};
use pfxbrick_hid_protocol::{
    Action, BrickConfig, EVT_LUT_MAX, LIGHT_CHANNELS, STARTUP_ADDRESSES, ir_gesture_to_address,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::roles::FileRole;
use crate::schema::{LightBinding, MotorChannel, ProfileConfig, RemoteBinding};

/// Outcome of one compilation step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Ok,
    Skipped(String),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub label: String,
    pub status: StepStatus,
}

/// Per-step results of programming a brick or building an image.
///
/// Steps are independent: one failure is recorded and the rest still run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileReport {
    pub steps: Vec<StepOutcome>,
}

impl CompileReport {
    pub fn ok(&mut self, label: impl Into<String>) {
        self.push(label, StepStatus::Ok);
    }

    pub fn skipped(&mut self, label: impl Into<String>, reason: impl Into<String>) {
        self.push(label, StepStatus::Skipped(reason.into()));
    }

    pub fn failed(&mut self, label: impl Into<String>, reason: impl Into<String>) {
        self.push(label, StepStatus::Failed(reason.into()));
    }

    fn push(&mut self, label: impl Into<String>, status: StepStatus) {
        self.steps.push(StepOutcome {
            label: label.into(),
            status,
        });
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed(_)))
    }

    pub fn count_ok(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Ok)
            .count()
    }
}

impl fmt::Display for CompileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match &step.status {
                StepStatus::Ok => writeln!(f, "  ok       {}", step.label)?,
                StepStatus::Skipped(why) => writeln!(f, "  skipped  {} ({why})", step.label)?,
                StepStatus::Failed(why) => writeln!(f, "  FAILED   {}: {why}", step.label)?,
            }
        }
        let failed = self.failures().count();
        write!(
            f,
            "{} steps, {} ok, {failed} failed",
            self.steps.len(),
            self.count_ok()
        )
    }
}

fn assign<T: Copy>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Copy the profile's motor, audio and notch settings into `config`.
///
/// Only values the profile sets are touched. Returns whether anything
/// changed.
pub fn apply_to_config(profile: &ProfileConfig, config: &mut BrickConfig) -> bool {
    let before = config.clone();
    assign(&mut config.audio.default_volume, profile.volume);
    for &i in profile.motor_channel.config_indices() {
        let Some(motor) = config.motors.get_mut(i) else {
            continue;
        };
        assign(&mut motor.accel, profile.acceleration);
        assign(&mut motor.decel, profile.deceleration);
        assign(&mut motor.vmin, profile.vmin);
        assign(&mut motor.vmid, profile.vmid);
        assign(&mut motor.vmax, profile.vmax);
        assign(&mut motor.invert, profile.motor_invert);
        assign(&mut motor.tlg_mode, profile.motor_pfmode);
        assign(&mut motor.torque_comp, profile.motor_low_torque);
    }
    let settings = &mut config.settings;
    assign(&mut settings.rapid_accel_thr, profile.rapid_accel_thr);
    assign(&mut settings.rapid_decel_thr, profile.rapid_decel_thr);
    assign(&mut settings.brake_decel_thr, profile.brake_decel_thr);
    assign(&mut settings.brake_speed_thr, profile.brake_speed_thr);
    if let Some(count) = profile.notch_count() {
        settings.notch_count = u8::try_from(count).unwrap_or(u8::MAX);
        let mut bounds = [0u8; 7];
        for (slot, bound) in bounds.iter_mut().zip(profile.notch_bounds()) {
            *slot = bound;
        }
        settings.notch_bounds = bounds;
    }
    let changed = *config != before;
    debug!(changed, "applied profile to brick configuration");
    changed
}

/// An action for one of the eight startup slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartupEntry {
    pub label: String,
    pub action: Action,
    /// Effect whose existing slot the action replaces; `None` only adds.
    pub key: Option<EffectKey>,
}

/// An action bound to a remote-control LUT address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventEntry {
    pub label: String,
    pub address: u8,
    pub action: Action,
}

/// Every LUT entry a profile needs, in programming order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LutProgram {
    pub startup: Vec<StartupEntry>,
    pub events: Vec<EventEntry>,
}

/// Number of LUT records an in-memory table holds.
pub const LUT_LEN: usize = EVT_LUT_MAX as usize + 1;

/// An all-empty in-memory LUT, indexed by address.
pub fn empty_lut() -> Vec<Action> {
    vec![Action::new(); LUT_LEN]
}

impl LutProgram {
    pub fn is_empty(&self) -> bool {
        self.startup.is_empty() && self.events.is_empty()
    }

    /// Write the program into `lut`, indexed by address, placing startup
    /// actions the way [`PfxBrick::configure_startup_action`] does.
    ///
    /// [`PfxBrick::configure_startup_action`]: pfxbrick::PfxBrick::configure_startup_action
    pub fn apply_offline(&self, lut: &mut [Action]) -> CompileReport {
        let mut report = CompileReport::default();
        for entry in &self.startup {
            let slots: Vec<(u8, Action)> = STARTUP_ADDRESSES
                .iter()
                .filter_map(|&a| lut.get(usize::from(a)).map(|action| (a, *action)))
                .collect();
            match plan_startup_slot(&slots, &entry.action, entry.key) {
                Ok(placement) => {
                    if let Some(slot) = lut.get_mut(usize::from(placement.address())) {
                        *slot = entry.action;
                    }
                    report.ok(format!("{}: {placement}", entry.label));
                }
                Err(e) => report.failed(&entry.label, e.to_string()),
            }
        }
        for entry in &self.events {
            match lut.get_mut(usize::from(entry.address)) {
                Some(slot) => {
                    *slot = entry.action;
                    report.ok(format!("{} at 0x{:02X}", entry.label, entry.address));
                }
                None => report.failed(&entry.label, format!("address 0x{:02X} outside table", entry.address)),
            }
        }
        report
    }
}

/// Light action that follows the motor direction: forward lights on
/// channel A use option 1, on B option 3; reverse lights 2 and 4.
pub(crate) fn direction_light(lights: &LightBinding, channel: MotorChannel, reverse: bool) -> Action {
    let mopt = match (channel, reverse) {
        (MotorChannel::B, false) => 3,
        (MotorChannel::B, true) => 4,
        (_, false) => 1,
        (_, true) => 2,
    };
    Action::light_fx(&lights.channels, light::ON_OFF_TOGGLE, [mopt, 4, 0, 1, 0])
}

/// Startup action that plays idle loops indexed by motor speed.
pub fn indexed_sound_action(profile: &ProfileConfig) -> Action {
    let motor_op = profile.motor_channel.sound_select() | profile.motor_speed.flag();
    let mut options = 0;
    if profile.startup.is_some() {
        options |= sound::IDX_STARTUP;
    }
    if profile.skip_startup() {
        options |= sound::IDX_SKIP_STARTUP;
    }
    Action::sound_fx(sound::PLAY_IDX_MOTOR, [motor_op, options], None)
}

/// Startup action that plays gated loops. Gated playback always follows
/// the current motor speed.
pub fn gated_sound_action(profile: &ProfileConfig) -> Action {
    let motor_op = profile.motor_channel.sound_select() | sound::SPEED_CURRENT;
    let first = FileRole::GatedLoop { group: 0, slot: 0 }.file_id();
    Action::sound_fx(
        sound::PLAY_GATED,
        [motor_op, profile.gated_gain()],
        Some(first),
    )
}

type BindingBuilder<'p, 'f> = (
    &'static str,
    Option<&'p RemoteBinding>,
    Box<dyn Fn(u8) -> Action + 'f>,
);

fn step_of(binding: &RemoteBinding) -> PfxResult<u8> {
    binding.amount.as_ref().map_or(Ok(0), |a| a.motor_step())
}

/// Remote bindings with the action each trigger stores, in script order.
pub(crate) fn remote_bindings(profile: &ProfileConfig) -> PfxResult<Vec<(&'static str, &RemoteBinding, Action)>> {
    let ch = profile.motor_channel.action_channels();
    let all_lights: Vec<u8> = (1..=LIGHT_CHANNELS).collect();
    let builders: Vec<BindingBuilder<'_, '_>> = vec![
        (
            "Increase speed",
            profile.increase_speed.as_ref(),
            Box::new(|step: u8| Action::increase_speed(&ch, step, false)),
        ),
        (
            "Decrease speed",
            profile.decrease_speed.as_ref(),
            Box::new(|step: u8| Action::decrease_speed(&ch, step, false)),
        ),
        ("Stop", profile.stop.as_ref(), Box::new(|_: u8| Action::stop_motor(&ch, false))),
        (
            "Emergency Stop",
            profile.emergency_stop.as_ref(),
            Box::new(|_: u8| Action::stop_motor(&ch, true)),
        ),
        ("Change direction", profile.change_dir.as_ref(), Box::new(|_: u8| Action::change_dir(&ch))),
        (
            "Increase volume",
            profile.increase_volume.as_ref(),
            Box::new(|_: u8| Action::sound_fx(sound::INC_VOLUME, [0, 0], None)),
        ),
        (
            "Decrease volume",
            profile.decrease_volume.as_ref(),
            Box::new(|_: u8| Action::sound_fx(sound::DEC_VOLUME, [0, 0], None)),
        ),
        (
            "Increase brightness",
            profile.increase_brightness.as_ref(),
            Box::new(|_: u8| Action::light_fx(&all_lights, light::INC_BRIGHT, [0; 5])),
        ),
        (
            "Decrease brightness",
            profile.decrease_brightness.as_ref(),
            Box::new(|_: u8| Action::light_fx(&all_lights, light::DEC_BRIGHT, [0; 5])),
        ),
    ];
    let mut out = Vec::new();
    for (label, binding, build) in builders {
        if let Some(binding) = binding {
            out.push((label, binding, build(step_of(binding)?)));
        }
    }
    Ok(out)
}

/// Action stored for an other sound that fires on a gesture.
pub(crate) fn triggered_sound_action(file_id: u8, repeat: bool) -> Action {
    if repeat {
        Action::repeat_audio_file(file_id)
    } else {
        Action::play_audio_file(file_id)
    }
}

/// List the LUT entries for `profile`.
///
/// # Errors
///
/// Returns a validation error for an unknown gesture or speed amount.
/// Validated profiles do not fail.
pub fn lut_program(profile: &ProfileConfig) -> PfxResult<LutProgram> {
    let mut program = LutProgram::default();

    if profile.notch_count().is_some_and(|n| n > 1) {
        program.startup.push(StartupEntry {
            label: "motor indexed sound".into(),
            action: indexed_sound_action(profile),
            key: Some(EffectKey::Sound(sound::PLAY_IDX_MOTOR)),
        });
    }
    if profile.has_gated_loops() {
        program.startup.push(StartupEntry {
            label: "motor gated sound".into(),
            action: gated_sound_action(profile),
            key: Some(EffectKey::Sound(sound::PLAY_GATED)),
        });
    }
    for ((id, sound), i) in (1u8..).zip(profile.other_sounds.iter()).zip(0usize..) {
        let name = profile.other_sound_name(i).unwrap_or_default();
        if let Some(probability) = sound.probability {
            program.startup.push(StartupEntry {
                label: format!("random sound {name}"),
                action: Action::sound_fx(sound::PLAY_RAND, [probability, 0], Some(id)),
                key: None,
            });
        } else if let Some(trigger) = &sound.trigger {
            program.events.push(EventEntry {
                label: format!("sound {name}"),
                address: ir_gesture_to_address(trigger)?,
                action: triggered_sound_action(id, sound.repeat),
            });
        }
    }
    for (label, lights, reverse) in [
        ("forward lights", profile.forward_lights.as_ref(), false),
        ("reverse lights", profile.reverse_lights.as_ref(), true),
    ] {
        if let Some(lights) = lights {
            program.startup.push(StartupEntry {
                label: label.into(),
                action: direction_light(lights, profile.motor_channel, reverse),
                key: None,
            });
        }
    }

    for (label, binding, action) in remote_bindings(profile)? {
        for gesture in binding.trigger.iter() {
            program.events.push(EventEntry {
                label: format!("{} ({gesture})", label.to_lowercase()),
                address: ir_gesture_to_address(gesture)?,
                action,
            });
        }
    }
    if let Some(clear) = &profile.clear_remote {
        for gesture in clear.iter() {
            program.events.push(EventEntry {
                label: format!("clear ({gesture})"),
                address: ir_gesture_to_address(gesture)?,
                action: Action::new(),
            });
        }
    }
    debug!(
        startup = program.startup.len(),
        events = program.events.len(),
        "compiled LUT program"
    );
    Ok(program)
}
