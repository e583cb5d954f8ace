//! Byte codec helpers
//!
//! Fixed-width little-endian integers, fill buffers, hex dumps and exact
//! byte-pattern search. Every multi-byte integer in the BIN is little-endian.

use crate::error::{FirmwareError, Result};
use memchr::memmem;

fn check_bounds(bytes: &[u8], offset: usize, width: usize) -> Result<()> {
    let needed = offset.saturating_add(width);
    if needed > bytes.len() {
        return Err(FirmwareError::Truncated {
            needed,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Read a little-endian `u16` at `offset`
pub fn read_u16(bytes: &[u8], offset: usize) -> Result<u16> {
    check_bounds(bytes, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[offset], bytes[offset + 1]]))
}

/// Read a little-endian `u32` at `offset`
pub fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    check_bounds(bytes, offset, 4)?;
    Ok(u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]))
}

/// Write a little-endian `u16` at `offset`
pub fn write_u16(bytes: &mut [u8], offset: usize, value: u16) -> Result<()> {
    check_bounds(bytes, offset, 2)?;
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Write a little-endian `u32` at `offset`
pub fn write_u32(bytes: &mut [u8], offset: usize, value: u32) -> Result<()> {
    check_bounds(bytes, offset, 4)?;
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Copy `len` bytes starting at `offset` into a new buffer
pub fn copy_part(bytes: &[u8], offset: usize, len: usize) -> Result<Vec<u8>> {
    check_bounds(bytes, offset, len)?;
    Ok(bytes[offset..offset + len].to_vec())
}

/// Find the first occurrence of `pattern` in `data` at or after `from`
///
/// Returns the absolute offset of the match. An empty pattern never matches.
pub fn find(data: &[u8], pattern: &[u8], from: usize) -> Option<usize> {
    if pattern.is_empty() || from >= data.len() {
        return None;
    }
    memmem::find(&data[from..], pattern).map(|pos| pos + from)
}

/// Decode a hex string such as `"55AA00010400"`
pub fn from_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(s).map_err(|e| FirmwareError::Config(format!("invalid hex '{}': {}", s, e)))
}

/// Lowercase hex dump with `|` separators, for diagnostics only
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .chunks(1)
        .map(hex::encode)
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_u16() {
        let mut buf = vec![0u8; 4];
        write_u16(&mut buf, 1, 0xBEEF).unwrap();
        assert_eq!(buf, [0x00, 0xEF, 0xBE, 0x00]);
        assert_eq!(read_u16(&buf, 1).unwrap(), 0xBEEF);
    }

    #[test]
    fn test_u16_is_unsigned() {
        let buf = [0xFF, 0xFF];
        assert_eq!(usize::from(read_u16(&buf, 0).unwrap()), 65535);
    }

    #[test]
    fn test_read_write_u32() {
        let mut buf = vec![0u8; 8];
        write_u32(&mut buf, 4, 5000).unwrap();
        assert_eq!(&buf[4..], &[0x88, 0x13, 0x00, 0x00]);
        assert_eq!(read_u32(&buf, 4).unwrap(), 5000);
    }

    #[test]
    fn test_out_of_bounds() {
        let buf = [0u8; 3];
        assert!(matches!(
            read_u32(&buf, 0),
            Err(FirmwareError::Truncated { needed: 4, actual: 3 })
        ));
        assert!(read_u16(&buf, usize::MAX).is_err());
    }

    #[test]
    fn test_find() {
        let data = b"xxABABCABxxABC";
        assert_eq!(find(data, b"ABC", 0), Some(4));
        assert_eq!(find(data, b"ABC", 5), Some(11));
        assert_eq!(find(data, b"ABD", 0), None);
        assert_eq!(find(data, b"", 0), None);
        assert_eq!(find(data, b"x", 100), None);
    }

    #[test]
    fn test_find_overlapping_prefix() {
        // Partial match that must fall back without skipping the real one
        let data = [0x55, 0x55, 0xAA, 0x00, 0x01];
        assert_eq!(find(&data, &[0x55, 0xAA, 0x00], 0), Some(1));
    }

    #[test]
    fn test_hex() {
        assert_eq!(from_hex("55AA00").unwrap(), vec![0x55, 0xAA, 0x00]);
        assert!(from_hex("5").is_err());
        assert_eq!(to_hex(&[0x0A, 0xFF]), "0a|ff");
    }
}
