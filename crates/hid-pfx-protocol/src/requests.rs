//! Request builders for every ICD command.
//!
//! Each function returns the request payload without the HID report id; the
//! transport adds framing.

use pfxbrick_errors::{PfxResult, ValidationError};

use crate::action::Action;
use crate::config::BrickConfig;
use crate::events::{EVT_CHANNELS, EVT_ID_MAX};
use crate::icd::{
    BRICK_NAME_LEN, FILE_NAME_LEN, FORMAT_QUICK, REPORT_LEN, SCRIPT_STOP_ID, dir_req, file_mode,
    magic, opcodes,
};
use crate::report::RequestBuilder;

pub fn get_icd_rev(silent: bool) -> Vec<u8> {
    RequestBuilder::new(opcodes::GET_ICD_REV)
        .bytes(&magic::ICD_REV)
        .u8(u8::from(silent))
        .build()
}

pub fn get_status() -> Vec<u8> {
    RequestBuilder::new(opcodes::GET_STATUS)
        .bytes(&magic::STATUS)
        .build()
}

pub fn get_config() -> Vec<u8> {
    vec![opcodes::GET_CONFIG]
}

pub fn set_config(config: &BrickConfig) -> Vec<u8> {
    config.to_request()
}

pub fn set_factory_defaults() -> Vec<u8> {
    RequestBuilder::new(opcodes::SET_FACTORY_DEFAULTS)
        .bytes(&magic::FACTORY_DEFAULTS)
        .build()
}

pub fn reboot() -> Vec<u8> {
    RequestBuilder::new(opcodes::REBOOT)
        .bytes(&magic::REBOOT)
        .build()
}

pub fn get_name() -> Vec<u8> {
    vec![opcodes::GET_NAME]
}

/// `SET_NAME` with the UTF-8 name, NUL-padded to 24 bytes.
///
/// # Errors
///
/// Returns a validation error if the name is longer than 24 bytes.
pub fn set_name(name: &str) -> PfxResult<Vec<u8>> {
    if name.len() > BRICK_NAME_LEN {
        return Err(ValidationError::too_long("brick name", name.len(), BRICK_NAME_LEN).into());
    }
    Ok(RequestBuilder::new(opcodes::SET_NAME)
        .padded_str(name, BRICK_NAME_LEN)
        .build())
}

fn check_event_channel(event_id: u8, channel: u8) -> PfxResult<()> {
    if event_id > EVT_ID_MAX {
        return Err(ValidationError::out_of_range("event id", event_id, 0, EVT_ID_MAX).into());
    }
    if channel >= EVT_CHANNELS {
        return Err(ValidationError::out_of_range("channel", channel, 0, EVT_CHANNELS - 1).into());
    }
    Ok(())
}

/// # Errors
///
/// Returns a validation error for an event id above `0x20` or a channel above 3.
pub fn get_event_action(event_id: u8, channel: u8) -> PfxResult<Vec<u8>> {
    check_event_channel(event_id, channel)?;
    Ok(vec![opcodes::GET_EVENT_ACTION, event_id, channel])
}

/// # Errors
///
/// Returns a validation error for an event id above `0x20` or a channel above 3.
pub fn set_event_action(event_id: u8, channel: u8, action: &Action) -> PfxResult<Vec<u8>> {
    check_event_channel(event_id, channel)?;
    Ok(RequestBuilder::new(opcodes::SET_EVENT_ACTION)
        .u8(event_id)
        .u8(channel)
        .bytes(&action.to_bytes())
        .build())
}

pub fn test_action(action: &Action) -> Vec<u8> {
    RequestBuilder::new(opcodes::TEST_ACTION)
        .bytes(&action.to_bytes())
        .build()
}

pub fn set_notifications(mask: u8) -> Vec<u8> {
    vec![opcodes::SET_NOTIFICATIONS, mask]
}

pub fn get_current_state() -> Vec<u8> {
    vec![opcodes::GET_CURRENT_STATE]
}

pub fn run_script(file_id: u8) -> Vec<u8> {
    vec![opcodes::RUN_SCRIPT, file_id]
}

pub fn stop_script() -> Vec<u8> {
    run_script(SCRIPT_STOP_ID)
}

pub fn format_fs(quick: bool) -> Vec<u8> {
    RequestBuilder::new(opcodes::FILE_FORMAT_FS)
        .bytes(&magic::FORMAT_FS)
        .u8(if quick { FORMAT_QUICK } else { 0 })
        .build()
}

/// `FILE_OPEN` for creating and writing a new file.
pub fn file_open_write(file_id: u8, size: u32, name: &str) -> Vec<u8> {
    RequestBuilder::new(opcodes::FILE_OPEN)
        .u8(file_id)
        .u8(file_mode::CREATE | file_mode::WRITE)
        .u32_be(size)
        .padded_str(name, FILE_NAME_LEN)
        .build()
}

/// `FILE_OPEN` for reading.
pub fn file_open_read(file_id: u8) -> Vec<u8> {
    vec![opcodes::FILE_OPEN, file_id, file_mode::READ]
}

/// Legacy `FILE_WRITE`: `[op, id, len, bytes]`, at most 61 data bytes.
///
/// # Errors
///
/// Returns a validation error if the chunk does not fit one report.
pub fn file_write(file_id: u8, chunk: &[u8]) -> PfxResult<Vec<u8>> {
    let req = RequestBuilder::new(opcodes::FILE_WRITE)
        .u8(file_id)
        .u8(chunk_len(chunk, REPORT_LEN - 3)?)
        .bytes(chunk);
    Ok(req.build())
}

/// `FILE_WRITE_FAST`: `[op, len, bytes]` to the open file, at most 62 bytes.
///
/// # Errors
///
/// Returns a validation error if the chunk does not fit one report.
pub fn file_write_fast(chunk: &[u8]) -> PfxResult<Vec<u8>> {
    let req = RequestBuilder::new(opcodes::FILE_WRITE_FAST)
        .u8(chunk_len(chunk, REPORT_LEN - 2)?)
        .bytes(chunk);
    Ok(req.build())
}

fn chunk_len(chunk: &[u8], max: usize) -> PfxResult<u8> {
    if chunk.len() > max {
        return Err(ValidationError::too_long("file chunk", chunk.len(), max).into());
    }
    u8::try_from(chunk.len())
        .map_err(|e| ValidationError::constraint(format!("file chunk length: {e}")).into())
}

pub fn file_read(file_id: u8, max_len: u8) -> Vec<u8> {
    vec![opcodes::FILE_READ, file_id, max_len]
}

pub fn file_close(file_id: u8) -> Vec<u8> {
    vec![opcodes::FILE_CLOSE, file_id]
}

/// Directory entry by 1-based index.
pub fn dir_entry_by_index(index: u16) -> Vec<u8> {
    RequestBuilder::new(opcodes::FILE_DIR)
        .u8(dir_req::GET_DIR_ENTRY_IDX)
        .u16_be(index)
        .build()
}

pub fn dir_entry_by_id(file_id: u8) -> Vec<u8> {
    vec![opcodes::FILE_DIR, dir_req::GET_DIR_ENTRY_ID, file_id]
}

pub fn file_count() -> Vec<u8> {
    vec![opcodes::FILE_DIR, dir_req::GET_FILE_COUNT]
}

pub fn free_space() -> Vec<u8> {
    vec![opcodes::FILE_DIR, dir_req::GET_FREE_SPACE]
}

pub fn remove_file(file_id: u8) -> Vec<u8> {
    vec![opcodes::FILE_DIR, dir_req::REMOVE_ID, file_id]
}

/// Rename a file; the name is NUL-padded to 32 bytes.
///
/// # Errors
///
/// Returns a validation error if the name is longer than 32 bytes.
pub fn rename_file(file_id: u8, name: &str) -> PfxResult<Vec<u8>> {
    if name.len() > FILE_NAME_LEN {
        return Err(ValidationError::too_long("file name", name.len(), FILE_NAME_LEN).into());
    }
    Ok(RequestBuilder::new(opcodes::FILE_DIR)
        .u8(dir_req::SET_NAME_ID)
        .u8(file_id)
        .padded_str(name, FILE_NAME_LEN)
        .build())
}

pub fn set_file_attributes(file_id: u8, attributes: u16) -> Vec<u8> {
    RequestBuilder::new(opcodes::FILE_DIR)
        .u8(dir_req::SET_ATTR_ID)
        .u8(file_id)
        .u16_be(attributes)
        .build()
}

/// Look up a file id by name: `[op, req, len, utf8...]`.
///
/// # Errors
///
/// Returns a validation error if the name is longer than 32 bytes.
pub fn named_file_id(name: &str) -> PfxResult<Vec<u8>> {
    if name.len() > FILE_NAME_LEN {
        return Err(ValidationError::too_long("file name", name.len(), FILE_NAME_LEN).into());
    }
    let len = u8::try_from(name.len())
        .map_err(|e| ValidationError::constraint(format!("file name length: {e}")))?;
    Ok(RequestBuilder::new(opcodes::FILE_DIR)
        .u8(dir_req::GET_NAMED_FILE_ID)
        .u8(len)
        .bytes(name.as_bytes())
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_requests() {
        assert_eq!(get_icd_rev(true), vec![0x01, 0xA5, 0x5A, 0x6E, 0x01]);
        assert_eq!(
            get_status(),
            vec![0x02, 0xA5, 0x5A, 0x6E, 0x40, 0x54, 0xA8, 0xE7]
        );
        assert_eq!(
            set_factory_defaults(),
            vec![0x05, 0x5F, 0x75, 0x78, 0xA5, 0x5A, 0xE7, 0x0F]
        );
        assert_eq!(format_fs(true), vec![0x47, 0xA5, 0x5A, 0x6E, 0x01]);
        assert_eq!(stop_script(), vec![0x48, 0xFF]);
    }

    #[test]
    fn test_name_limits() -> Result<(), Box<dyn std::error::Error>> {
        let req = set_name("Loco 42")?;
        assert_eq!(req.len(), 1 + BRICK_NAME_LEN);
        assert_eq!(req.get(1..8), Some(&b"Loco 42"[..]));
        assert!(set_name(&"x".repeat(25)).is_err());
        assert!(rename_file(1, &"y".repeat(33)).is_err());
        Ok(())
    }

    #[test]
    fn test_event_action_checks_ranges() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(get_event_action(0x0F, 3)?, vec![0x07, 0x0F, 0x03]);
        assert!(get_event_action(0x21, 0).is_err());
        assert!(get_event_action(0x00, 4).is_err());
        let req = set_event_action(0x0F, 0, &Action::play_audio_file(0x10))?;
        assert_eq!(req.len(), 3 + 16);
        Ok(())
    }

    #[test]
    fn test_file_requests() -> Result<(), Box<dyn std::error::Error>> {
        let open = file_open_write(0x21, 0x0102_0304, "bell.wav");
        assert_eq!(open.get(..7), Some(&[0x40, 0x21, 0x0A, 0x01, 0x02, 0x03, 0x04][..]));
        assert_eq!(open.len(), 7 + FILE_NAME_LEN);
        assert_eq!(file_write(0x21, &[0xAA; 61])?.len(), 64);
        assert!(file_write(0x21, &[0xAA; 62]).is_err());
        assert_eq!(file_write_fast(&[0xBB; 62])?.len(), 64);
        assert_eq!(named_file_id("a.wav")?, vec![0x46, 0x08, 5, b'a', b'.', b'w', b'a', b'v']);
        assert_eq!(set_file_attributes(0x05, 0x3080), vec![0x46, 0x07, 0x05, 0x30, 0x80]);
        Ok(())
    }
}
