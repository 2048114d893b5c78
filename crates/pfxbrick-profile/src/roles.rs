//! Reserved file ids and attributes for sound-profile roles.
//!
//! The firmware finds profile audio by file id and attribute, so every role
//! maps to a fixed slot:
//!
//! | Role | File id | Attributes |
//! |---|---|---|
//! | idle loop *n* | `0xE0 + n` (n < 8) | `0x20 + 4n` |
//! | accel transition *n* | `0xE8 + n` (n < 7) | `0x40 + 4n` |
//! | decel transition *n* | `0xF0 + n` (n < 7) | `0x60 + 4n` |
//! | gated group *g*, slot *s* | `0xD0 + 4g + s` | `0x10 + 4s` |
//! | startup | `0xEF` | `0x5C` |
//! | shutdown | `0xF7` | `0x7C` |
//! | other fixed sounds | see [`FIXED_ROLES`] | `0` |

use core::fmt;

use pfxbrick_hid_protocol::DirEntry;
use serde::{Deserialize, Serialize};

pub const IDLE_LOOP_BASE: u8 = 0xE0;
pub const ACCEL_LOOP_BASE: u8 = 0xE8;
pub const DECEL_LOOP_BASE: u8 = 0xF0;
pub const GATED_LOOP_BASE: u8 = 0xD0;

pub const IDLE_ATTR_BASE: u16 = 0x20;
pub const ACCEL_ATTR_BASE: u16 = 0x40;
pub const DECEL_ATTR_BASE: u16 = 0x60;
pub const GATED_ATTR_BASE: u16 = 0x10;

pub const MAX_IDLE_LOOPS: usize = 8;
pub const MAX_TRANSITION_LOOPS: usize = 7;
pub const GATED_GROUPS: usize = 4;
pub const GATED_SLOTS: usize = 4;

/// Name of the generated profile script on the brick.
pub const SCRIPT_FILE_NAME: &str = "startup.pfx";

/// What a profile audio file is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileRole {
    IdleLoop(u8),
    AccelLoop(u8),
    DecelLoop(u8),
    GatedLoop { group: u8, slot: u8 },
    Startup,
    Shutdown,
    ChangeDir,
    SetOff,
    RapidAccel,
    RapidDecel,
    BrakeStop,
    Bell,
    ShortWhistle,
    LongWhistle,
    /// Random or triggered sound effect at a free file id.
    Effect(u8),
}

/// Roles with a fixed file id: `(role, file id, attributes)`.
pub const FIXED_ROLES: [(FileRole, u8, u16); 10] = [
    (FileRole::Startup, 0xEF, 0x5C),
    (FileRole::Shutdown, 0xF7, 0x7C),
    (FileRole::ChangeDir, 0xFA, 0),
    (FileRole::SetOff, 0xFB, 0),
    (FileRole::RapidAccel, 0xFC, 0),
    (FileRole::RapidDecel, 0xFD, 0),
    (FileRole::BrakeStop, 0xFE, 0),
    (FileRole::Bell, 0xF8, 0),
    (FileRole::ShortWhistle, 0xF9, 0),
    (FileRole::LongWhistle, 0xCF, 0),
];

fn fixed(role: FileRole) -> Option<(u8, u16)> {
    FIXED_ROLES
        .iter()
        .find(|(r, _, _)| *r == role)
        .map(|&(_, id, attr)| (id, attr))
}

fn indexed_id(base: u8, n: u8) -> u8 {
    base.wrapping_add(n)
}

fn indexed_attr(base: u16, n: u8) -> u16 {
    base.wrapping_add(u16::from(n).wrapping_mul(4))
}

impl FileRole {
    pub fn file_id(&self) -> u8 {
        match *self {
            Self::IdleLoop(n) => indexed_id(IDLE_LOOP_BASE, n),
            Self::AccelLoop(n) => indexed_id(ACCEL_LOOP_BASE, n),
            Self::DecelLoop(n) => indexed_id(DECEL_LOOP_BASE, n),
            Self::GatedLoop { group, slot } => {
                indexed_id(GATED_LOOP_BASE, group.wrapping_mul(4).wrapping_add(slot))
            }
            Self::Effect(id) => id,
            role => fixed(role).map_or(0, |(id, _)| id),
        }
    }

    pub fn attributes(&self) -> u16 {
        match *self {
            Self::IdleLoop(n) => indexed_attr(IDLE_ATTR_BASE, n),
            Self::AccelLoop(n) => indexed_attr(ACCEL_ATTR_BASE, n),
            Self::DecelLoop(n) => indexed_attr(DECEL_ATTR_BASE, n),
            Self::GatedLoop { slot, .. } => indexed_attr(GATED_ATTR_BASE, slot),
            Self::Effect(_) => 0,
            role => fixed(role).map_or(0, |(_, attr)| attr),
        }
    }

    /// Key used by `set file <key> = "<name>"` script statements. Bells,
    /// whistles and effects have no script key.
    pub fn script_key(&self) -> Option<String> {
        let key = match *self {
            Self::IdleLoop(n) => format!("speed {}", u16::from(n) + 1),
            Self::AccelLoop(n) => format!("accel {}", u16::from(n) + 1),
            Self::DecelLoop(n) => format!("decel {}", u16::from(n) + 1),
            Self::GatedLoop { group, slot } => {
                format!("gated {}{}", u16::from(group) + 1, u16::from(slot) + 1)
            }
            Self::Startup => "startup".into(),
            Self::Shutdown => "shutdown".into(),
            Self::ChangeDir => "changedir".into(),
            Self::SetOff => "brake off".into(),
            Self::BrakeStop => "brake on".into(),
            Self::RapidAccel => "thr accel".into(),
            Self::RapidDecel => "thr decel".into(),
            Self::Bell | Self::ShortWhistle | Self::LongWhistle | Self::Effect(_) => return None,
        };
        Some(key)
    }

    /// Recover the role of a file already on the brick.
    ///
    /// Startup, shutdown and the motor-indexed loops are recognised by
    /// attribute; gated loops and the other fixed sounds by file id.
    /// Anything else is `None`.
    pub fn from_dir_entry(entry: &DirEntry) -> Option<Self> {
        let attr = entry.attributes & 0x00FF;
        let idx = u8::try_from((attr & 0x1C) >> 2).unwrap_or(0);
        match attr {
            0x5C => return Some(Self::Startup),
            0x7C => return Some(Self::Shutdown),
            _ => {}
        }
        match attr & 0xF0 {
            0x20 | 0x30 => return Some(Self::IdleLoop(idx)),
            0x40 | 0x50 => return Some(Self::AccelLoop(idx)),
            0x60 | 0x70 => return Some(Self::DecelLoop(idx)),
            _ => {}
        }
        if entry.id & 0xF0 == GATED_LOOP_BASE {
            return Some(Self::GatedLoop {
                group: (entry.id & 0x0C) >> 2,
                slot: entry.id & 0x03,
            });
        }
        FIXED_ROLES
            .iter()
            .find(|(_, id, _)| *id == entry.id)
            .map(|&(role, _, _)| role)
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdleLoop(n) => write!(f, "idle loop {}", u16::from(*n) + 1),
            Self::AccelLoop(n) => write!(f, "accel loop {}", u16::from(*n) + 1),
            Self::DecelLoop(n) => write!(f, "decel loop {}", u16::from(*n) + 1),
            Self::GatedLoop { group, slot } => {
                write!(f, "gated loop {}/{}", u16::from(*group) + 1, u16::from(*slot) + 1)
            }
            Self::Startup => f.write_str("startup"),
            Self::Shutdown => f.write_str("shutdown"),
            Self::ChangeDir => f.write_str("change direction"),
            Self::SetOff => f.write_str("set off"),
            Self::RapidAccel => f.write_str("rapid accel loop"),
            Self::RapidDecel => f.write_str("rapid decel loop"),
            Self::BrakeStop => f.write_str("brake stop"),
            Self::Bell => f.write_str("bell"),
            Self::ShortWhistle => f.write_str("short whistle"),
            Self::LongWhistle => f.write_str("long whistle"),
            Self::Effect(id) => write!(f, "sound effect 0x{id:02X}"),
        }
    }
}
