//! File directory records.

use core::fmt;

use pfxbrick_errors::PfxResult;
use serde::{Deserialize, Serialize};

use crate::icd::{FILE_NAME_LEN, attr};
use crate::report::ResponseReader;

/// One entry of the brick's flat file table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub id: u8,
    pub size: u32,
    pub first_sector: u16,
    pub attributes: u16,
    /// Sample rate for audio files.
    pub user_data1: u32,
    /// Bit depth for audio files.
    pub user_data2: u32,
    pub crc32: u32,
    pub name: String,
}

impl DirEntry {
    /// Decode a `GET_DIR_ENTRY_*` response (`[tag, req, status, id, ...]`).
    ///
    /// # Errors
    ///
    /// Returns a short-response error if the response is under 56 bytes.
    pub fn from_response(msg: &[u8]) -> PfxResult<Self> {
        let mut r = ResponseReader::at(msg, 3);
        Ok(Self {
            id: r.read_u8()?,
            size: r.read_u32_be()?,
            first_sector: r.read_u16_be()?,
            attributes: r.read_u16_be()?,
            user_data1: r.read_u32_be()?,
            user_data2: r.read_u32_be()?,
            crc32: r.read_u32_be()?,
            name: decode_name(r.read_bytes(FILE_NAME_LEN)?),
        })
    }

    /// WAV format with sample rate and bit depth filled in.
    pub fn is_audio_file(&self) -> bool {
        self.attributes & attr::FORMAT_MASK == attr::FORMAT_WAV
            && self.user_data1 != 0
            && self.user_data2 != 0
    }

    pub fn is_script_file(&self) -> bool {
        self.attributes & attr::FORMAT_MASK == attr::FORMAT_SCRIPT
    }

    pub fn sample_rate(&self) -> u32 {
        self.user_data1
    }

    pub fn bit_depth(&self) -> u32 {
        self.user_data2
    }

    /// Sound-profile role bits of the attributes.
    pub fn role_bits(&self) -> u16 {
        self.attributes & attr::ROLE_MASK
    }
}

/// Decode a NUL-padded UTF-8 name. Invalid UTF-8 falls back to the
/// printable ASCII bytes only.
pub fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let trimmed = bytes.get(..end).unwrap_or(bytes);
    match core::str::from_utf8(trimmed) {
        Ok(s) => s.to_string(),
        Err(_) => trimmed
            .iter()
            .filter(|b| b.is_ascii_graphic() || **b == b' ')
            .map(|&b| char::from(b))
            .collect(),
    }
}

impl fmt::Display for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X} {:<24} {:6.1} kB {:04X} {:08X} {:08X} {:08X}",
            self.id,
            self.name,
            f64::from(self.size) / 1000.0,
            self.attributes,
            self.user_data1,
            self.user_data2,
            self.crc32
        )
    }
}

/// Header line matching [`DirEntry`]'s display layout.
pub fn dir_listing_header() -> String {
    format!(
        "{:>2} {:<24} {:>6}    {:>4} {:>8} {:>8} {:>8}",
        "ID", "Name", "Size", "Attr", "User1", "User2", "CRC32"
    )
}

/// Free-space report from `GET_FREE_SPACE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSpace {
    pub bytes_left: u32,
    pub capacity: u32,
}

impl FreeSpace {
    /// Decode `[tag, req, status, left:4, capacity:4]`.
    ///
    /// # Errors
    ///
    /// Returns a short-response error if the response is under 11 bytes.
    pub fn from_response(msg: &[u8]) -> PfxResult<Self> {
        let mut r = ResponseReader::at(msg, 3);
        Ok(Self {
            bytes_left: r.read_u32_be()?,
            capacity: r.read_u32_be()?,
        })
    }

    pub fn bytes_used(&self) -> u32 {
        self.capacity.saturating_sub(self.bytes_left)
    }
}

/// Decode the file count from `GET_FILE_COUNT` (`[tag, req, status, count:2]`).
///
/// # Errors
///
/// Returns a short-response error if the response is under 5 bytes.
pub fn file_count_from_response(msg: &[u8]) -> PfxResult<u16> {
    ResponseReader::at(msg, 3).read_u16_be()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_response(name: &[u8]) -> Vec<u8> {
        let mut msg = vec![0xC6, 0x02, 0x00, 0xE1];
        msg.extend_from_slice(&0x0001_2345u32.to_be_bytes());
        msg.extend_from_slice(&0x0042u16.to_be_bytes());
        msg.extend_from_slice(&0x0024u16.to_be_bytes());
        msg.extend_from_slice(&22050u32.to_be_bytes());
        msg.extend_from_slice(&16u32.to_be_bytes());
        msg.extend_from_slice(&0xCAFE_F00Du32.to_be_bytes());
        let mut padded = name.to_vec();
        padded.resize(32, 0);
        msg.extend_from_slice(&padded);
        msg.resize(64, 0);
        msg
    }

    #[test]
    fn test_entry_offsets() -> Result<(), Box<dyn std::error::Error>> {
        let e = DirEntry::from_response(&entry_response(b"idle1.wav"))?;
        assert_eq!(e.id, 0xE1);
        assert_eq!(e.size, 0x0001_2345);
        assert_eq!(e.first_sector, 0x42);
        assert_eq!(e.attributes, 0x24);
        assert_eq!(e.sample_rate(), 22050);
        assert_eq!(e.bit_depth(), 16);
        assert_eq!(e.crc32, 0xCAFE_F00D);
        assert_eq!(e.name, "idle1.wav");
        assert!(e.is_audio_file());
        assert!(!e.is_script_file());
        Ok(())
    }

    #[test]
    fn test_name_fallback_filters_invalid_utf8() {
        assert_eq!(decode_name(b"ab\xFFc\x01d\0\0"), "abcd");
        assert_eq!(decode_name("caf\u{e9}.wav".as_bytes()), "caf\u{e9}.wav");
    }

    #[test]
    fn test_script_classification() {
        let e = DirEntry {
            attributes: attr::PROFILE_SCRIPT,
            ..DirEntry::default()
        };
        assert!(e.is_script_file());
        assert!(!e.is_audio_file());
    }

    #[test]
    fn test_free_space() -> Result<(), Box<dyn std::error::Error>> {
        let mut msg = vec![0xC6, 0x04, 0x00];
        msg.extend_from_slice(&1000u32.to_be_bytes());
        msg.extend_from_slice(&4000u32.to_be_bytes());
        let fs = FreeSpace::from_response(&msg)?;
        assert_eq!(fs.bytes_used(), 3000);
        assert_eq!(file_count_from_response(&[0xC6, 0x03, 0x00, 0x01, 0x02])?, 0x0102);
        Ok(())
    }
}
