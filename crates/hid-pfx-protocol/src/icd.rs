//! ICD opcodes, challenge bytes and bitfield constants.
//!
//! A request is `[opcode, ...]`; the matching response starts with
//! `opcode | 0x80`. Over BLE the brick can also push unsolicited
//! notification frames tagged with [`MSG_NOTIFICATION`].

#![deny(static_mut_refs)]

pub use pfxbrick_errors::filesystem::{FS_STATUS_MAX_OK, codes as fs_codes};

/// Bit set in the first byte of every response.
pub const REPLY_BIT: u8 = 0x80;

/// Tag byte of an unsolicited BLE notification frame.
pub const MSG_NOTIFICATION: u8 = 0x7E;

/// Size of a HID report payload (excluding the report ID byte).
pub const REPORT_LEN: usize = 64;

/// Bytes written per HID transaction: report ID 0 followed by the payload.
pub const OUTPUT_REPORT_LEN: usize = REPORT_LEN + 1;

/// Command opcodes.
pub mod opcodes {
    pub const GET_ICD_REV: u8 = 0x01;
    pub const GET_STATUS: u8 = 0x02;
    pub const GET_CONFIG: u8 = 0x03;
    pub const SET_CONFIG: u8 = 0x04;
    pub const SET_FACTORY_DEFAULTS: u8 = 0x05;
    pub const REBOOT: u8 = 0x06;
    pub const GET_EVENT_ACTION: u8 = 0x07;
    pub const SET_EVENT_ACTION: u8 = 0x08;
    pub const TEST_ACTION: u8 = 0x09;
    pub const GET_NAME: u8 = 0x0C;
    pub const SET_NAME: u8 = 0x0D;
    pub const SET_NOTIFICATIONS: u8 = 0x0E;
    pub const GET_CURRENT_STATE: u8 = 0x0F;
    pub const FILE_OPEN: u8 = 0x40;
    pub const FILE_CLOSE: u8 = 0x41;
    pub const FILE_READ: u8 = 0x42;
    pub const FILE_WRITE: u8 = 0x43;
    pub const FILE_WRITE_FAST: u8 = 0x45;
    pub const FILE_DIR: u8 = 0x46;
    pub const FILE_FORMAT_FS: u8 = 0x47;
    pub const RUN_SCRIPT: u8 = 0x48;
}

/// Display name of an opcode, used in logs.
pub fn opcode_name(opcode: u8) -> &'static str {
    use opcodes::*;
    match opcode & !REPLY_BIT {
        GET_ICD_REV => "GET_ICD_REV",
        GET_STATUS => "GET_STATUS",
        GET_CONFIG => "GET_CONFIG",
        SET_CONFIG => "SET_CONFIG",
        SET_FACTORY_DEFAULTS => "SET_FACTORY_DEFAULTS",
        REBOOT => "REBOOT",
        GET_EVENT_ACTION => "GET_EVENT_ACTION",
        SET_EVENT_ACTION => "SET_EVENT_ACTION",
        TEST_ACTION => "TEST_ACTION",
        GET_NAME => "GET_NAME",
        SET_NAME => "SET_NAME",
        SET_NOTIFICATIONS => "SET_NOTIFICATIONS",
        GET_CURRENT_STATE => "GET_CURRENT_STATE",
        FILE_OPEN => "FILE_OPEN",
        FILE_CLOSE => "FILE_CLOSE",
        FILE_READ => "FILE_READ",
        FILE_WRITE => "FILE_WRITE",
        FILE_WRITE_FAST => "FILE_WRITE_FAST",
        FILE_DIR => "FILE_DIR",
        FILE_FORMAT_FS => "FILE_FORMAT_FS",
        RUN_SCRIPT => "RUN_SCRIPT",
        _ => "UNKNOWN",
    }
}

/// Challenge bytes that must follow certain opcodes.
pub mod magic {
    /// `GET_ICD_REV`
    pub const ICD_REV: [u8; 3] = [0xA5, 0x5A, 0x6E];
    /// `GET_STATUS`
    pub const STATUS: [u8; 7] = [0xA5, 0x5A, 0x6E, 0x40, 0x54, 0xA8, 0xE7];
    /// `REBOOT`
    pub const REBOOT: [u8; 7] = [0xA5, 0x5A, 0x6E, 0x40, 0x54, 0xA8, 0xE7];
    /// `SET_FACTORY_DEFAULTS`
    pub const FACTORY_DEFAULTS: [u8; 7] = [0x5F, 0x75, 0x78, 0xA5, 0x5A, 0xE7, 0x0F];
    /// `FILE_FORMAT_FS`
    pub const FORMAT_FS: [u8; 3] = [0xA5, 0x5A, 0x6E];
}

/// `FILE_FORMAT_FS` flag selecting a quick (directory-only) format.
pub const FORMAT_QUICK: u8 = 0x01;

/// `FILE_DIR` sub-requests, carried in request byte 1.
pub mod dir_req {
    pub const GET_DIR_ENTRY_IDX: u8 = 0x01;
    pub const GET_DIR_ENTRY_ID: u8 = 0x02;
    pub const GET_FILE_COUNT: u8 = 0x03;
    pub const GET_FREE_SPACE: u8 = 0x04;
    pub const REMOVE_ID: u8 = 0x05;
    pub const SET_NAME_ID: u8 = 0x06;
    pub const SET_ATTR_ID: u8 = 0x07;
    pub const GET_NAMED_FILE_ID: u8 = 0x08;
}

/// `FILE_OPEN` mode bits.
pub mod file_mode {
    pub const READ: u8 = 0x01;
    pub const WRITE: u8 = 0x02;
    pub const APPEND: u8 = 0x04;
    pub const CREATE: u8 = 0x08;
}

/// File ID that never refers to a stored file.
pub const FILE_INVALID_ID: u8 = 0xFF;

/// `RUN_SCRIPT` argument that stops the running script.
pub const SCRIPT_STOP_ID: u8 = 0xFF;

/// Maximum file name length on the wire.
pub const FILE_NAME_LEN: usize = 32;

/// Maximum brick name length in bytes.
pub const BRICK_NAME_LEN: usize = 24;

/// Largest payload of a legacy `FILE_WRITE` chunk.
pub const FILE_WRITE_CHUNK: usize = 61;

/// Largest payload of a `FILE_WRITE_FAST` chunk.
pub const FILE_WRITE_FAST_CHUNK: usize = 62;

/// Largest payload requested per `FILE_READ`.
pub const FILE_READ_CHUNK: usize = 62;

/// First ICD revision that supports `FILE_WRITE_FAST`.
pub const FAST_WRITE_MIN_ICD: (u8, u8) = (3, 39);

/// Number of file slots in the brick's directory.
pub const PFX_AUDIO_FILES_MAX: usize = 128;

/// Highest assignable file ID.
pub const FILE_ID_MAX: u8 = 0xFE;

/// Brick status byte values.
pub mod status {
    pub const NORMAL: u8 = 0x00;
    pub const NORMAL_PENDING: u8 = 0x01;
    pub const SERVICE: u8 = 0x02;
    pub const SERVICE_PENDING: u8 = 0x03;
    pub const SERVICE_BUSY: u8 = 0x04;
}

/// Human-readable brick status.
pub fn status_str(status: u8) -> &'static str {
    match status {
        status::NORMAL => "Normal",
        status::NORMAL_PENDING => "Normal, upgrade pending",
        status::SERVICE => "Service",
        status::SERVICE_PENDING => "Service, upgrade pending",
        status::SERVICE_BUSY => "Service, busy",
        _ => "Unknown",
    }
}

/// `SET_NOTIFICATIONS` flags and notification type bytes.
pub mod notify {
    pub const AUDIO_PLAY_DONE: u8 = 0x01;
    pub const AUDIO_PLAY: u8 = 0x02;
    pub const MOTORA_CURR_SPD: u8 = 0x04;
    pub const MOTORA_STOP: u8 = 0x08;
    pub const MOTORB_CURR_SPD: u8 = 0x10;
    pub const MOTORB_STOP: u8 = 0x20;
    /// Route notifications to the BLE link.
    pub const TO_BLE: u8 = 0x40;
    /// Route notifications to the USB link.
    pub const TO_USB: u8 = 0x80;
    /// All event flags.
    pub const ALL_EVENTS: u8 = 0x3F;
}

/// Configuration bitfields.
pub mod cfg {
    pub const STATLED_MASK: u8 = 0x01;
    pub const STATLED_ON: u8 = 0x01;
    pub const VOLBEEP_MASK: u8 = 0x02;
    pub const VOLBEEP_ON: u8 = 0x02;
    pub const POWERSAVE_MASK: u8 = 0x0C;
    pub const POWERSAVE_OFF: u8 = 0x00;
    pub const POWERSAVE_30M: u8 = 0x04;
    pub const POWERSAVE_60M: u8 = 0x08;
    pub const POWERSAVE_3HR: u8 = 0x0C;
    pub const LOCKOUT_MASK: u8 = 0x30;
    pub const LOCKOUT_INH: u8 = 0x00;
    pub const LOCKOUT_CH1: u8 = 0x10;
    pub const LOCKOUT_ALLCH: u8 = 0x20;
    pub const AUDIO_DRC_MASK: u8 = 0x80;
    pub const AUDIO_DRC_ON: u8 = 0x80;

    pub const MOTOR_INVERT: u8 = 0x01;
    pub const MOTOR_TRQCOMP: u8 = 0x02;
    pub const MOTOR_TLGMODE: u8 = 0x04;

    pub const AUTO_OFF_NEVER: u8 = 0x00;
    pub const AUTO_OFF_1MIN: u8 = 0x01;
    pub const AUTO_OFF_5MIN: u8 = 0x02;
    pub const AUTO_OFF_IMMEDIATE: u8 = 0x03;

    pub const BLE_MOTOR_CONTINUE: u8 = 0x00;
    pub const BLE_MOTOR_STOP: u8 = 0x01;
}

/// File attribute bitfields.
pub mod attr {
    pub const FORMAT_MASK: u16 = 0xF000;
    pub const FORMAT_WAV: u16 = 0x0000;
    pub const FORMAT_SCRIPT: u16 = 0x3000;
    /// Script runs automatically at power-up.
    pub const SCRIPT_STARTUP: u16 = 0x0080;
    /// Attribute of the generated profile script.
    pub const PROFILE_SCRIPT: u16 = FORMAT_SCRIPT | SCRIPT_STARTUP;
    /// Role bits used by sound profiles.
    pub const ROLE_MASK: u16 = 0x00FC;
}
