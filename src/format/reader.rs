//! Low-level little-endian reading and writing utilities for zip records.

use std::io::{self, Read, Write};

/// Reads an unsigned 16-bit little-endian integer.
pub fn read_u16_le<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Reads an unsigned 32-bit little-endian integer.
pub fn read_u32_le<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Reads exact number of bytes into a new vector.
pub fn read_bytes<R: Read>(r: &mut R, count: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; count];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Writes an unsigned 16-bit little-endian integer.
pub fn write_u16_le<W: Write>(w: &mut W, value: u16) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

/// Writes an unsigned 32-bit little-endian integer.
pub fn write_u32_le<W: Write>(w: &mut W, value: u32) -> io::Result<()> {
    w.write_all(&value.to_le_bytes())
}

/// Reads a little-endian u16 at `offset` of a slice, if in bounds.
#[inline]
pub fn u16_at(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Reads a little-endian u32 at `offset` of a slice, if in bounds.
#[inline]
pub fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_le() {
        let data = [0x34u8, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut cursor = Cursor::new(&data);
        assert_eq!(read_u16_le(&mut cursor).unwrap(), 0x1234);
        assert_eq!(read_u32_le(&mut cursor).unwrap(), 0x1234_5678);
        assert!(read_u16_le(&mut cursor).is_err());
    }

    #[test]
    fn test_write_le() {
        let mut buf = Vec::new();
        write_u16_le(&mut buf, 0x0102).unwrap();
        write_u32_le(&mut buf, 0x0304_0506).unwrap();
        assert_eq!(buf, [0x02, 0x01, 0x06, 0x05, 0x04, 0x03]);
    }

    #[test]
    fn test_slice_accessors() {
        let data = [0x50u8, 0x4b, 0x05, 0x06];
        assert_eq!(u32_at(&data, 0), Some(0x0605_4b50));
        assert_eq!(u16_at(&data, 2), Some(0x0605));
        assert_eq!(u16_at(&data, 3), None);
        assert_eq!(u32_at(&data, usize::MAX), None);
    }

    #[test]
    fn test_read_bytes() {
        let mut cursor = Cursor::new(b"abcdef".to_vec());
        assert_eq!(read_bytes(&mut cursor, 3).unwrap(), b"abc");
        assert!(read_bytes(&mut cursor, 4).is_err());
    }
}
