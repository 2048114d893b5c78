//! `.pfxconfig` profile images.
//!
//! Layout, all multi-byte fields big-endian:
//!
//! | Part | Bytes |
//! |---|---|
//! | magic `PFX0002` | 7 |
//! | configuration block | 60 |
//! | per file: id, size, sample rate, bit depth (16), 0, attributes, name | 1+4+2+1+1+2+32 |
//! | per file: raw contents | size |
//! | `0xFF` padding | one byte per unused file slot |
//! | LUT records, channel-major, events `0..0x13` | 16 each |

use std::path::Path;

use pfxbrick_errors::{PfxResult, ProfileError};
use pfxbrick_hid_protocol::icd::{FILE_NAME_LEN, attr};
use pfxbrick_hid_protocol::{
    ACTION_LEN, Action, BrickConfig, EVT_CHANNELS, EVT_ID_TEST_EVENT, PFX_AUDIO_FILES_MAX,
    evtch_to_address,
};
use tracing::info;

use crate::assets::ProfileAssets;
use crate::roles::SCRIPT_FILE_NAME;
use crate::schema::ProfileConfig;
use crate::script::{export_script, image_script_id};

/// Leading bytes of every profile image.
pub const IMAGE_MAGIC: &[u8; 7] = b"PFX0002";

/// Length of one file record header.
pub const FILE_RECORD_LEN: usize = 43;

/// Bit depth recorded for every audio file.
const BIT_DEPTH: u8 = 16;

struct FileRecord<'a> {
    id: u8,
    size: usize,
    sample_rate: u16,
    bit_depth: u8,
    attributes: u16,
    name: &'a str,
}

fn push_record(out: &mut Vec<u8>, r: &FileRecord<'_>) {
    out.push(r.id);
    out.extend_from_slice(&u32::try_from(r.size).unwrap_or(u32::MAX).to_be_bytes());
    out.extend_from_slice(&r.sample_rate.to_be_bytes());
    out.push(r.bit_depth);
    out.push(0);
    out.extend_from_slice(&r.attributes.to_be_bytes());
    let mut field = [0u8; FILE_NAME_LEN];
    for (dst, src) in field.iter_mut().zip(r.name.bytes()) {
        *dst = src;
    }
    out.extend_from_slice(&field);
}

/// Serialize a profile, the configuration it runs with and the LUT it
/// programs into one image.
///
/// `lut` is indexed by address; records past its end are written empty.
///
/// # Errors
///
/// Returns [`ProfileError::ValidationFailed`] if the profile has more files
/// than the brick has slots.
pub fn build_image(
    profile: &ProfileConfig,
    config: &BrickConfig,
    assets: &ProfileAssets,
    lut: &[Action],
) -> PfxResult<Vec<u8>> {
    let file_count = assets.files.len().saturating_add(1);
    if file_count > PFX_AUDIO_FILES_MAX {
        return Err(ProfileError::validation(format!(
            "{file_count} files do not fit in {PFX_AUDIO_FILES_MAX} slots"
        ))
        .into());
    }
    let script = export_script(profile);
    let lut_records = usize::from(EVT_CHANNELS).saturating_mul(usize::from(EVT_ID_TEST_EVENT));
    let mut out = Vec::with_capacity(
        assets
            .total_bytes()
            .saturating_add(script.len())
            .saturating_add(file_count.saturating_mul(FILE_RECORD_LEN))
            .saturating_add(lut_records.saturating_mul(ACTION_LEN))
            .saturating_add(PFX_AUDIO_FILES_MAX),
    );
    out.extend_from_slice(IMAGE_MAGIC);
    out.extend_from_slice(&config.to_image_bytes());

    for file in &assets.files {
        let record = FileRecord {
            id: file.file_id(),
            size: file.data.len(),
            sample_rate: u16::try_from(file.format.sample_rate).unwrap_or(u16::MAX),
            bit_depth: BIT_DEPTH,
            attributes: file.attributes(),
            name: file.name(),
        };
        push_record(&mut out, &record);
        out.extend_from_slice(&file.data);
    }
    // The script record carries no audio format.
    let record = FileRecord {
        id: image_script_id(profile),
        size: script.len(),
        sample_rate: 0,
        bit_depth: 0,
        attributes: attr::PROFILE_SCRIPT,
        name: SCRIPT_FILE_NAME,
    };
    push_record(&mut out, &record);
    out.extend_from_slice(script.as_bytes());
    let padding = PFX_AUDIO_FILES_MAX.saturating_sub(file_count);
    out.resize(out.len().saturating_add(padding), 0xFF);

    let empty = Action::new();
    for channel in 0..EVT_CHANNELS {
        for event in 0..EVT_ID_TEST_EVENT {
            let address = evtch_to_address(event, channel)?;
            let action = lut.get(usize::from(address)).unwrap_or(&empty);
            out.extend_from_slice(&action.to_bytes());
        }
    }
    Ok(out)
}

/// Build an image and write it to `path`.
///
/// # Errors
///
/// Returns the errors of [`build_image`], or [`ProfileError::ExportFailed`]
/// if the file cannot be written.
pub async fn write_image(
    path: &Path,
    profile: &ProfileConfig,
    config: &BrickConfig,
    assets: &ProfileAssets,
    lut: &[Action],
) -> PfxResult<usize> {
    let image = build_image(profile, config, assets, lut)?;
    tokio::fs::write(path, &image)
        .await
        .map_err(|e| ProfileError::export_failed(path.display().to_string(), e.to_string()))?;
    info!(path = %path.display(), bytes = image.len(), files = assets.files.len(), "wrote profile image");
    Ok(image.len())
}
