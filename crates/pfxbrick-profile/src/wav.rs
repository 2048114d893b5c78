//! Minimal RIFF/WAVE header reader.
//!
//! Only the `fmt ` chunk is inspected; sample data is passed through
//! untouched.

use pfxbrick_errors::{PfxResult, ProfileError};

/// Format of a WAV file as found in its `fmt ` chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

fn le_u16(data: &[u8], at: usize) -> Option<u16> {
    let bytes = data.get(at..at.checked_add(2)?)?;
    Some(u16::from_le_bytes(bytes.try_into().ok()?))
}

fn le_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn find_fmt(data: &[u8]) -> Option<WavFormat> {
    if data.get(0..4)? != b"RIFF" || data.get(8..12)? != b"WAVE" {
        return None;
    }
    let mut at = 12usize;
    while let Some(id) = data.get(at..at.checked_add(4)?) {
        let size = usize::try_from(le_u32(data, at.checked_add(4)?)?).ok()?;
        let body = at.checked_add(8)?;
        if id == b"fmt " {
            return Some(WavFormat {
                channels: le_u16(data, body.checked_add(2)?)?,
                sample_rate: le_u32(data, body.checked_add(4)?)?,
                bits_per_sample: le_u16(data, body.checked_add(14)?)?,
            });
        }
        // Chunks are padded to an even length.
        at = body.checked_add(size)?.checked_add(size & 1)?;
    }
    None
}

impl WavFormat {
    /// Read the format of `data`; `origin` names the file in errors.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::AudioFile`] if `data` is not a RIFF/WAVE file
    /// with a complete `fmt ` chunk.
    pub fn parse(data: &[u8], origin: &str) -> PfxResult<Self> {
        find_fmt(data)
            .ok_or_else(|| ProfileError::audio_file(origin, "not a RIFF/WAVE file with a fmt chunk").into())
    }
}

/// Build a canonical 44-byte header followed by `samples`. Used to make
/// fixture audio.
pub fn wav_bytes(sample_rate: u32, bits_per_sample: u16, samples: &[u8]) -> Vec<u8> {
    let data_len = u32::try_from(samples.len()).unwrap_or(u32::MAX);
    let block_align = bits_per_sample / 8;
    let mut out = Vec::with_capacity(samples.len().saturating_add(44));
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&data_len.saturating_add(36).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&sample_rate.saturating_mul(u32::from(block_align)).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(samples);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_header() -> Result<(), Box<dyn std::error::Error>> {
        let data = wav_bytes(22050, 16, &[0; 100]);
        assert_eq!(data.len(), 144);
        let fmt = WavFormat::parse(&data, "idle.wav")?;
        assert_eq!(
            fmt,
            WavFormat {
                channels: 1,
                sample_rate: 22050,
                bits_per_sample: 16
            }
        );
        Ok(())
    }

    #[test]
    fn test_fmt_after_other_chunk() -> Result<(), Box<dyn std::error::Error>> {
        let plain = wav_bytes(11025, 8, &[0x80; 10]);
        let mut data = plain.get(..12).unwrap_or_default().to_vec();
        data.extend_from_slice(b"LIST");
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 0]);
        data.extend_from_slice(plain.get(12..).unwrap_or_default());
        assert_eq!(WavFormat::parse(&data, "x.wav")?.sample_rate, 11025);
        Ok(())
    }

    #[test]
    fn test_not_a_wav() {
        assert!(WavFormat::parse(b"ID3\x03 mp3 data", "song.mp3").is_err());
        assert!(WavFormat::parse(b"RIFF", "short.wav").is_err());
    }
}
