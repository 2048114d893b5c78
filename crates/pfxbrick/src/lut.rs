//! Event/action LUT helpers: startup-slot allocation and table dumps.

use core::fmt;

use pfxbrick_errors::{PfxResult, ValidationError};
use pfxbrick_hid_protocol::{Action, EVT_CHANNELS, EVT_ID_TEST_EVENT, address_description, evtch_to_address};
use serde::{Deserialize, Serialize};

/// Which effect an action is identified by when searching startup slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKey {
    Sound(u8),
    Light(u8),
    Motor(u8),
}

impl EffectKey {
    /// Key of the first populated effect of `action`, checked sound first.
    pub fn of(action: &Action) -> Option<Self> {
        if action.sound_fx_id != 0 {
            Some(Self::Sound(action.sound_fx_id))
        } else if action.light_fx_id != 0 {
            Some(Self::Light(action.light_fx_id))
        } else if action.motor_action_id != 0 {
            Some(Self::Motor(action.motor_action_id))
        } else {
            None
        }
    }

    pub fn matches(&self, action: &Action) -> bool {
        match *self {
            Self::Sound(id) => action.sound_fx_id == id,
            Self::Light(id) => action.light_fx_id == id,
            Self::Motor(id) => action.motor_action_id == id,
        }
    }
}

/// Where a startup action ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartupPlacement {
    /// An identical action was already stored; nothing was written.
    Unchanged(u8),
    /// A slot with the same effect was overwritten.
    Updated(u8),
    /// The first empty slot was used.
    Allocated(u8),
}

impl StartupPlacement {
    pub fn address(&self) -> u8 {
        match *self {
            Self::Unchanged(a) | Self::Updated(a) | Self::Allocated(a) => a,
        }
    }

    /// Whether the LUT must be written.
    pub fn needs_write(&self) -> bool {
        !matches!(self, Self::Unchanged(_))
    }
}

impl fmt::Display for StartupPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged(a) => write!(f, "startup action already configured at 0x{a:02X}"),
            Self::Updated(a) => write!(f, "updated existing startup action at 0x{a:02X}"),
            Self::Allocated(a) => write!(f, "configured free startup slot 0x{a:02X}"),
        }
    }
}

/// Choose a startup slot for `new` given the current contents of the eight
/// startup addresses, in address order.
///
/// An identical action wins, then a slot whose effect matches `key`, then
/// the first empty slot.
///
/// # Errors
///
/// Returns [`ValidationError::LutFull`] when no slot qualifies.
pub fn plan_startup_slot(
    slots: &[(u8, Action)],
    new: &Action,
    key: Option<EffectKey>,
) -> PfxResult<StartupPlacement> {
    for (address, existing) in slots {
        if existing == new {
            return Ok(StartupPlacement::Unchanged(*address));
        }
        if key.is_some_and(|k| !existing.is_empty() && k.matches(existing)) {
            return Ok(StartupPlacement::Updated(*address));
        }
    }
    slots
        .iter()
        .find(|(_, a)| a.is_empty())
        .map(|(address, _)| StartupPlacement::Allocated(*address))
        .ok_or_else(|| ValidationError::LutFull.into())
}

/// Every `(event id, channel)` pair covered by a LUT dump or clear: event
/// ids `0..0x13`, four channels each.
pub fn dump_coordinates() -> impl Iterator<Item = (u8, u8)> {
    (0..EVT_ID_TEST_EVENT).flat_map(|evt| (0..EVT_CHANNELS).map(move |ch| (evt, ch)))
}

/// One row of a LUT dump.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LutEntry {
    pub address: u8,
    pub event_id: u8,
    pub channel: u8,
    pub action: Action,
}

impl LutEntry {
    /// # Errors
    ///
    /// Returns a validation error for coordinates outside the LUT.
    pub fn new(event_id: u8, channel: u8, action: Action) -> PfxResult<Self> {
        Ok(Self {
            address: evtch_to_address(event_id, channel)?,
            event_id,
            channel,
            action,
        })
    }
}

impl fmt::Display for LutEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:02X}] {:<32} {}",
            self.address,
            address_description(self.address),
            self.action
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfxbrick_hid_protocol::STARTUP_ADDRESSES;

    fn slots(actions: &[Action]) -> Vec<(u8, Action)> {
        STARTUP_ADDRESSES
            .iter()
            .copied()
            .zip(actions.iter().copied().chain(std::iter::repeat(Action::default())))
            .collect()
    }

    #[test]
    fn test_identical_action_is_left_alone() -> Result<(), Box<dyn std::error::Error>> {
        let a = Action::play_audio_file(0x21);
        let plan = plan_startup_slot(&slots(&[Action::default(), a]), &a, EffectKey::of(&a))?;
        assert_eq!(plan, StartupPlacement::Unchanged(0x3D));
        assert!(!plan.needs_write());
        Ok(())
    }

    #[test]
    fn test_matching_effect_is_updated_before_empty_slot() -> Result<(), Box<dyn std::error::Error>> {
        let old = Action::play_audio_file(0x21);
        let new = Action::play_audio_file(0x22);
        let plan = plan_startup_slot(&slots(&[Action::default(), old]), &new, EffectKey::of(&new))?;
        assert_eq!(plan, StartupPlacement::Updated(0x3D));
        Ok(())
    }

    #[test]
    fn test_first_empty_slot_allocated() -> Result<(), Box<dyn std::error::Error>> {
        let other = Action::light_on(&[1]);
        let new = Action::play_audio_file(0x21);
        let plan = plan_startup_slot(&slots(&[other, other]), &new, EffectKey::of(&new))?;
        assert_eq!(plan, StartupPlacement::Allocated(0x3E));
        Ok(())
    }

    #[test]
    fn test_full_table_is_rejected() {
        let other = Action::light_on(&[2]);
        let new = Action::play_audio_file(0x21);
        let full = slots(&[other; 8]);
        assert!(matches!(
            plan_startup_slot(&full, &new, EffectKey::of(&new)),
            Err(pfxbrick_errors::PfxError::Validation(ValidationError::LutFull))
        ));
    }

    #[test]
    fn test_dump_covers_test_event_range() {
        let coords: Vec<_> = dump_coordinates().collect();
        assert_eq!(coords.len(), 0x13 * 4);
        assert_eq!(coords.first(), Some(&(0, 0)));
        assert_eq!(coords.last(), Some(&(0x12, 3)));
    }
}
