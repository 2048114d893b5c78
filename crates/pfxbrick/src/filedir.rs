//! Host-side mirror of the brick's file directory.
//!
//! The cache is filled by [`PfxBrick::refresh_file_dir`](crate::PfxBrick::refresh_file_dir)
//! and goes stale after any file operation; nothing is pushed by the brick.

use core::fmt;
use core::str::FromStr;

use pfxbrick_errors::{PfxResult, ValidationError};
use pfxbrick_hid_protocol::icd::FILE_ID_MAX;
use pfxbrick_hid_protocol::{DirEntry, FreeSpace, dir_listing_header};
use serde::{Deserialize, Serialize};

/// Snapshot of the file directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDir {
    /// File count reported by the brick.
    pub num_files: u16,
    pub files: Vec<DirEntry>,
    pub bytes_used: u32,
    pub bytes_left: u32,
}

impl FileDir {
    pub(crate) fn set_space(&mut self, space: FreeSpace) {
        self.bytes_left = space.bytes_left;
        self.bytes_used = space.bytes_used();
    }

    pub fn get(&self, id: u8) -> Option<&DirEntry> {
        self.files.iter().find(|f| f.id == id)
    }

    /// First entry named `name`. The brick itself is the authority for
    /// name lookups; see [`PfxBrick::file_id_from_name`](crate::PfxBrick::file_id_from_name).
    pub fn get_by_name(&self, name: &str) -> Option<&DirEntry> {
        self.files.iter().find(|f| f.name == name)
    }

    pub fn has_file(&self, id: u8) -> bool {
        self.get(id).is_some()
    }

    /// Lowest id in `0..=0xFE` not used by any cached entry.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoFreeFileId`] when every id is taken.
    pub fn find_available_file_id(&self) -> PfxResult<u8> {
        (0..=FILE_ID_MAX)
            .find(|id| !self.has_file(*id))
            .ok_or_else(|| ValidationError::NoFreeFileId.into())
    }

    pub fn audio_files(&self) -> impl Iterator<Item = &DirEntry> {
        self.files.iter().filter(|f| f.is_audio_file())
    }

    pub fn script_files(&self) -> impl Iterator<Item = &DirEntry> {
        self.files.iter().filter(|f| f.is_script_file())
    }

    /// Id-to-name pairs, used to label audio notifications.
    pub fn names(&self) -> impl Iterator<Item = (u8, String)> + '_ {
        self.files.iter().map(|f| (f.id, f.name.clone()))
    }
}

impl fmt::Display for FileDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", dir_listing_header())?;
        for file in &self.files {
            writeln!(f, "{file}")?;
        }
        write!(
            f,
            "{} files, {:.1} kB used, {:.1} kB remaining",
            self.files.len(),
            f64::from(self.bytes_used) / 1000.0,
            f64::from(self.bytes_left) / 1000.0
        )
    }
}

/// A file named either by id or by name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileSpec {
    Id(u8),
    Name(String),
}

impl From<u8> for FileSpec {
    fn from(id: u8) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for FileSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl FromStr for FileSpec {
    type Err = std::convert::Infallible;

    /// `0x21` and `33` are ids; anything else is a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u8::from_str_radix(hex, 16).ok(),
            None => s.parse::<u8>().ok(),
        };
        Ok(id.map_or_else(|| Self::Name(s.to_string()), Self::Id))
    }
}

impl fmt::Display for FileSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "0x{id:02X}"),
            Self::Name(name) => write!(f, "\"{name}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfxbrick_hid_protocol::attr;

    fn entry(id: u8, name: &str, attributes: u16) -> DirEntry {
        DirEntry {
            id,
            size: 1500,
            attributes,
            user_data1: if attributes & attr::FORMAT_MASK == 0 { 22050 } else { 0 },
            user_data2: if attributes & attr::FORMAT_MASK == 0 { 16 } else { 0 },
            name: name.to_string(),
            ..DirEntry::default()
        }
    }

    #[test]
    fn test_first_available_id_skips_used() -> Result<(), Box<dyn std::error::Error>> {
        let dir = FileDir {
            files: vec![entry(0, "a.wav", 0), entry(1, "b.wav", 0), entry(3, "c.wav", 0)],
            ..FileDir::default()
        };
        assert_eq!(dir.find_available_file_id()?, 2);
        Ok(())
    }

    #[test]
    fn test_full_directory_has_no_id() {
        let dir = FileDir {
            files: (0..=FILE_ID_MAX).map(|id| entry(id, "x", 0)).collect(),
            ..FileDir::default()
        };
        assert!(dir.find_available_file_id().is_err());
    }

    #[test]
    fn test_classification() {
        let dir = FileDir {
            files: vec![entry(0xE0, "idle.wav", 0x20), entry(0x10, "boot.txt", attr::PROFILE_SCRIPT)],
            ..FileDir::default()
        };
        assert_eq!(dir.audio_files().count(), 1);
        assert_eq!(dir.script_files().map(|f| f.id).collect::<Vec<_>>(), vec![0x10]);
        assert_eq!(dir.get_by_name("idle.wav").map(|f| f.id), Some(0xE0));
    }

    #[test]
    fn test_file_spec_parsing() {
        assert_eq!("0x21".parse::<FileSpec>().ok(), Some(FileSpec::Id(0x21)));
        assert_eq!("33".parse::<FileSpec>().ok(), Some(FileSpec::Id(33)));
        assert_eq!(
            "horn.wav".parse::<FileSpec>().ok(),
            Some(FileSpec::Name("horn.wav".into()))
        );
        assert_eq!("300".parse::<FileSpec>().ok(), Some(FileSpec::Name("300".into())));
    }

    #[test]
    fn test_listing_totals() {
        let dir = FileDir {
            num_files: 1,
            files: vec![entry(0xE0, "idle.wav", 0x20)],
            bytes_used: 1500,
            bytes_left: 98_500,
        };
        let text = dir.to_string();
        assert!(text.ends_with("1 files, 1.5 kB used, 98.5 kB remaining"), "{text}");
        assert_eq!(text.lines().count(), 3);
    }

    proptest::proptest! {
        #[test]
        fn prop_hex_and_decimal_ids_parse(id in 0u8..=255) {
            proptest::prop_assert_eq!(format!("0x{id:02X}").parse::<FileSpec>().ok(), Some(FileSpec::Id(id)));
            proptest::prop_assert_eq!(id.to_string().parse::<FileSpec>().ok(), Some(FileSpec::Id(id)));
        }
    }
}
