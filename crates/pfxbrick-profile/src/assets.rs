//! Audio payloads referenced by a profile.

use std::collections::HashMap;

use pfxbrick_errors::{PfxResult, ProfileError};
use tracing::debug;

use crate::schema::{FileAssignment, ProfileConfig};
use crate::wav::WavFormat;

/// An audio file ready for the brick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileFile {
    pub assignment: FileAssignment,
    pub format: WavFormat,
    pub data: Vec<u8>,
}

impl ProfileFile {
    pub fn file_id(&self) -> u8 {
        self.assignment.file_id()
    }

    pub fn attributes(&self) -> u16 {
        self.assignment.attributes()
    }

    pub fn name(&self) -> &str {
        &self.assignment.brick_name
    }

    pub fn crc32(&self) -> u32 {
        crc32fast::hash(&self.data)
    }
}

/// Every audio file of a profile, in assignment order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileAssets {
    pub files: Vec<ProfileFile>,
}

impl ProfileAssets {
    /// Read every file the profile references from its source directory.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::AudioFile`] for a file that is missing or not
    /// a WAV file.
    pub async fn load(config: &ProfileConfig) -> PfxResult<Self> {
        let dir = config.source_dir();
        let mut files = Vec::new();
        for assignment in config.file_assignments() {
            let path = dir.join(&assignment.source);
            let origin = path.display().to_string();
            let data = tokio::fs::read(&path)
                .await
                .map_err(|e| ProfileError::audio_file(&origin, e.to_string()))?;
            let format = WavFormat::parse(&data, &origin)?;
            debug!(file = %origin, id = assignment.file_id(), bytes = data.len(), "loaded profile audio");
            files.push(ProfileFile {
                assignment,
                format,
                data,
            });
        }
        Ok(Self { files })
    }

    /// Build the asset set from in-memory payloads keyed by the profile's
    /// source entries.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::AudioFile`] for a missing key or a payload
    /// that is not a WAV file.
    pub fn from_memory(config: &ProfileConfig, payloads: &HashMap<String, Vec<u8>>) -> PfxResult<Self> {
        let mut files = Vec::new();
        for assignment in config.file_assignments() {
            let data = payloads
                .get(&assignment.source)
                .ok_or_else(|| ProfileError::audio_file(&assignment.source, "no payload supplied"))?
                .clone();
            let format = WavFormat::parse(&data, &assignment.source)?;
            files.push(ProfileFile {
                assignment,
                format,
                data,
            });
        }
        Ok(Self { files })
    }

    pub fn get(&self, file_id: u8) -> Option<&ProfileFile> {
        self.files.iter().find(|f| f.file_id() == file_id)
    }

    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.data.len()).sum()
    }
}
