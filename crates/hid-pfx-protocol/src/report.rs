//! Cursor helpers for reading responses and assembling requests.

use pfxbrick_errors::{PfxResult, TransportError};

use crate::icd::REPORT_LEN;

/// Big-endian cursor over a response payload.
///
/// Every read past the end yields a short-response error tagged with the
/// response's first byte, so parsers can use `?` throughout.
pub struct ResponseReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ResponseReader<'a> {
    /// Reader starting at byte 0 (the response tag).
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Reader starting at `offset`.
    pub fn at(buffer: &'a [u8], offset: usize) -> Self {
        Self {
            buffer,
            position: offset,
        }
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.position
    }

    fn short(&self, wanted: usize) -> TransportError {
        TransportError::short_response(
            self.buffer.first().copied().unwrap_or(0),
            self.position.saturating_add(wanted),
            self.buffer.len(),
        )
    }

    /// Read `count` bytes.
    ///
    /// # Errors
    ///
    /// Returns a short-response error if fewer than `count` bytes remain.
    pub fn read_bytes(&mut self, count: usize) -> PfxResult<&'a [u8]> {
        let end = self.position.saturating_add(count);
        let slice = self
            .buffer
            .get(self.position..end)
            .ok_or_else(|| self.short(count))?;
        self.position = end;
        Ok(slice)
    }

    /// Read a fixed-size array.
    ///
    /// # Errors
    ///
    /// Returns a short-response error if fewer than `N` bytes remain.
    pub fn read_array<const N: usize>(&mut self) -> PfxResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        <[u8; N]>::try_from(bytes).map_err(|_e| self.short(N).into())
    }

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// Returns a short-response error at the end of the buffer.
    pub fn read_u8(&mut self) -> PfxResult<u8> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    /// Read a big-endian `u16`.
    ///
    /// # Errors
    ///
    /// Returns a short-response error if fewer than 2 bytes remain.
    pub fn read_u16_be(&mut self) -> PfxResult<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian `u32`.
    ///
    /// # Errors
    ///
    /// Returns a short-response error if fewer than 4 bytes remain.
    pub fn read_u32_be(&mut self) -> PfxResult<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Advance the cursor, clamped to the buffer end.
    pub fn skip(&mut self, count: usize) -> &mut Self {
        self.position = self.position.saturating_add(count).min(self.buffer.len());
        self
    }
}

/// Request assembler. Requests are at most one report payload long.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    buffer: Vec<u8>,
}

impl RequestBuilder {
    /// Start a request with its opcode.
    pub fn new(opcode: u8) -> Self {
        let mut buffer = Vec::with_capacity(REPORT_LEN);
        buffer.push(opcode);
        Self { buffer }
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.buffer.push(value);
        self
    }

    pub fn u16_be(mut self, value: u16) -> Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn u32_be(mut self, value: u32) -> Self {
        self.buffer.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.buffer.extend_from_slice(data);
        self
    }

    /// Append `text` as UTF-8, truncated or NUL-padded to exactly `width`
    /// bytes. Truncation never splits a character.
    pub fn padded_str(mut self, text: &str, width: usize) -> Self {
        let mut end = text.len().min(width);
        while !text.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        let head = text.as_bytes().get(..end).unwrap_or_default();
        self.buffer.extend_from_slice(head);
        self.buffer.resize(self.buffer.len() + (width - end), 0);
        self
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_big_endian() -> Result<(), Box<dyn std::error::Error>> {
        let data = [0xC6, 0x12, 0x34, 0xDE, 0xAD, 0xBE, 0xEF];
        let mut r = ResponseReader::at(&data, 1);
        assert_eq!(r.read_u16_be()?, 0x1234);
        assert_eq!(r.read_u32_be()?, 0xDEAD_BEEF);
        assert_eq!(r.remaining(), 0);
        assert!(r.read_u8().is_err());
        Ok(())
    }

    #[test]
    fn test_reader_short_error_names_tag() {
        let data = [0x82, 0x00];
        let mut r = ResponseReader::at(&data, 1);
        let err = r.read_u32_be().err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("0x82"), "{err}");
    }

    #[test]
    fn test_builder_layout() {
        let req = RequestBuilder::new(0x40)
            .u8(0x05)
            .u8(0x0A)
            .u32_be(0x0000_1234)
            .padded_str("horn.wav", 12)
            .build();
        assert_eq!(
            req,
            vec![
                0x40, 0x05, 0x0A, 0x00, 0x00, 0x12, 0x34, b'h', b'o', b'r', b'n', b'.', b'w',
                b'a', b'v', 0, 0, 0, 0
            ]
        );
    }

    #[test]
    fn test_padded_str_truncates_on_char_boundary() {
        let req = RequestBuilder::new(0x0D).padded_str("aé", 2).build();
        assert_eq!(req, vec![0x0D, b'a', 0]);
    }
}
