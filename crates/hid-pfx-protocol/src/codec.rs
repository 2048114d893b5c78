//! Big-endian integer and BCD version helpers.
//!
//! Every multi-byte field on the wire is big-endian. The fixed-width helpers
//! here are contract-checked: handing them a slice of the wrong length is a
//! programming error and panics.

use pfxbrick_errors::{PfxResult, ValidationError};

/// Decode a 2-byte big-endian integer.
///
/// # Panics
///
/// Panics if `bytes` is not exactly 2 bytes long.
pub fn u16_from_be(bytes: &[u8]) -> u16 {
    match <[u8; 2]>::try_from(bytes) {
        Ok(b) => u16::from_be_bytes(b),
        Err(_) => panic_len("u16_from_be", 2, bytes.len()),
    }
}

/// Decode a 4-byte big-endian integer.
///
/// # Panics
///
/// Panics if `bytes` is not exactly 4 bytes long.
pub fn u32_from_be(bytes: &[u8]) -> u32 {
    match <[u8; 4]>::try_from(bytes) {
        Ok(b) => u32::from_be_bytes(b),
        Err(_) => panic_len("u32_from_be", 4, bytes.len()),
    }
}

#[expect(
    clippy::panic,
    reason = "mis-sized codec input is a caller contract violation"
)]
#[track_caller]
fn panic_len(func: &str, want: usize, got: usize) -> ! {
    panic!("{func}: expected {want} bytes, got {got}")
}

/// Encode a `u16` as 2 big-endian bytes.
pub fn u16_to_be(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Encode a `u32` as 4 big-endian bytes.
pub fn u32_to_be(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Decode a two's-complement signed byte (motor velocity telemetry).
pub fn i8_from_wire(value: u8) -> i8 {
    i8::from_ne_bytes([value])
}

/// Format two bytes as an upper-case hex string, e.g. `A216`.
pub fn hex_u16(msb: u8, lsb: u8) -> String {
    format!("{msb:02X}{lsb:02X}")
}

/// Format four bytes as an upper-case hex string.
pub fn hex_u32(bytes: [u8; 4]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Decode a BCD version pair into `M.mm` text, e.g. `[0x03, 0x39]` -> `"3.39"`.
pub fn bcd_version_from_bytes(msb: u8, lsb: u8) -> String {
    format!("{msb:X}.{lsb:02X}")
}

/// Encode `M.mm` version text into its BCD byte pair.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedVersion`] unless the input is one or
/// two decimal digits, a dot, and exactly two decimal digits.
pub fn bcd_version_to_bytes(version: &str) -> PfxResult<[u8; 2]> {
    let (major, minor) = parse_version(version)?;
    Ok([bcd(major), bcd(minor)])
}

/// Parse `M.mm` version text into numeric `(major, minor)`.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedVersion`] for anything that is not
/// `M.mm` or `MM.mm` with decimal digits.
pub fn parse_version(version: &str) -> PfxResult<(u8, u8)> {
    let malformed = || ValidationError::MalformedVersion(version.to_string());
    let (major, minor) = version.trim().split_once('.').ok_or_else(malformed)?;
    let digits_ok = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits_ok(major, 1, 2) || !digits_ok(minor, 2, 2) {
        return Err(malformed().into());
    }
    let major: u8 = major.parse().map_err(|_e| malformed())?;
    let minor: u8 = minor.parse().map_err(|_e| malformed())?;
    Ok((major, minor))
}

fn bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}
