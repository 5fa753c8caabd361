//! Zip header records: end of central directory, central directory file
//! headers and local file headers.
//!
//! Parsing works on in-memory slices; every length and offset read from the
//! archive is untrusted and checked before use.

use std::io::{self, Write};

use super::reader::{u16_at, u32_at, write_u16_le, write_u32_le};
use super::{
    CENTRAL_HEADER_LEN, EOCD_LEN, LOCAL_HEADER_LEN, SIG_CENTRAL_HEADER, SIG_END_OF_CENTRAL_DIR,
    SIG_LOCAL_HEADER, flags,
};
use crate::archive_path::EntryName;
use crate::codec::CompressionMethod;
use crate::read::ZipEntry;
use crate::{Error, Result};

/// Zip64 end of central directory locator signature.
const SIG_ZIP64_LOCATOR: u32 = 0x0706_4b50;

/// Length of the Zip64 locator record.
const ZIP64_LOCATOR_LEN: usize = 20;

/// The end of central directory record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndOfCentralDirectory {
    /// Number of central directory entries.
    pub entry_count: u16,
    /// Size of the central directory in bytes.
    pub central_dir_size: u32,
    /// Offset of the central directory from the start of the archive.
    pub central_dir_offset: u32,
    /// Archive comment.
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Locates and parses the EOCD in the trailing bytes of an archive.
    ///
    /// `tail` holds the last bytes of the archive and `tail_offset` is the
    /// archive offset of `tail[0]`. Returns the record and its offset.
    pub fn find(tail: &[u8], tail_offset: u64) -> Result<(Self, u64)> {
        if tail.len() < EOCD_LEN {
            return Err(Error::InvalidFormat(format!(
                "{} bytes is too short for a zip archive",
                tail.len()
            )));
        }

        // Prefer a record whose comment ends exactly at end of file, then
        // fall back to the last signature whose comment fits.
        let mut fallback = None;
        for pos in (0..=tail.len() - EOCD_LEN).rev() {
            if u32_at(tail, pos) != Some(SIG_END_OF_CENTRAL_DIR) {
                continue;
            }
            let comment_len = u16_at(tail, pos + 20).unwrap_or(0) as usize;
            let end = pos + EOCD_LEN + comment_len;
            if end == tail.len() {
                return Self::parse_at(tail, pos, tail_offset);
            }
            if end < tail.len() && fallback.is_none() {
                fallback = Some(pos);
            }
        }

        match fallback {
            Some(pos) => Self::parse_at(tail, pos, tail_offset),
            None => Err(Error::InvalidFormat(
                "end of central directory record not found".into(),
            )),
        }
    }

    fn parse_at(tail: &[u8], pos: usize, tail_offset: u64) -> Result<(Self, u64)> {
        let field = |off: usize| u16_at(tail, pos + off).unwrap_or(0);
        let disk_number = field(4);
        let central_dir_disk = field(6);
        let entries_on_disk = field(8);
        let entry_count = field(10);
        let central_dir_size = u32_at(tail, pos + 12).unwrap_or(0);
        let central_dir_offset = u32_at(tail, pos + 16).unwrap_or(0);
        let comment_len = field(20) as usize;

        if disk_number != 0 || central_dir_disk != 0 || entries_on_disk != entry_count {
            return Err(Error::UnsupportedFeature {
                feature: "split archives",
            });
        }
        if pos >= ZIP64_LOCATOR_LEN
            && u32_at(tail, pos - ZIP64_LOCATOR_LEN) == Some(SIG_ZIP64_LOCATOR)
        {
            return Err(Error::UnsupportedFeature { feature: "zip64" });
        }
        if entry_count == u16::MAX
            || central_dir_size == u32::MAX
            || central_dir_offset == u32::MAX
        {
            return Err(Error::UnsupportedFeature { feature: "zip64" });
        }

        let comment_start = pos + EOCD_LEN;
        let comment = tail
            .get(comment_start..comment_start + comment_len)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();

        Ok((
            Self {
                entry_count,
                central_dir_size,
                central_dir_offset,
                comment,
            },
            tail_offset + pos as u64,
        ))
    }

    /// Writes the record.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_u32_le(w, SIG_END_OF_CENTRAL_DIR)?;
        write_u16_le(w, 0)?;
        write_u16_le(w, 0)?;
        write_u16_le(w, self.entry_count)?;
        write_u16_le(w, self.entry_count)?;
        write_u32_le(w, self.central_dir_size)?;
        write_u32_le(w, self.central_dir_offset)?;
        write_u16_le(w, self.comment.len() as u16)?;
        w.write_all(&self.comment)
    }
}

/// Parses one central directory file header at `pos` within `cd`.
///
/// `cd_offset` is the archive offset of `cd[0]`, used for error reporting.
/// Returns the entry and the position of the next header.
pub fn parse_central_header(
    cd: &[u8],
    pos: usize,
    cd_offset: u64,
    index: usize,
) -> Result<(ZipEntry, usize)> {
    let at = cd_offset + pos as u64;
    if cd.len().saturating_sub(pos) < CENTRAL_HEADER_LEN {
        return Err(Error::corrupt_header(at, "truncated central directory header"));
    }
    if u32_at(cd, pos) != Some(SIG_CENTRAL_HEADER) {
        return Err(Error::corrupt_header(at, "bad central directory signature"));
    }

    let u16f = |off: usize| u16_at(cd, pos + off).unwrap_or(0);
    let u32f = |off: usize| u32_at(cd, pos + off).unwrap_or(0);

    let name_len = u16f(28) as usize;
    let extra_len = u16f(30) as usize;
    let comment_len = u16f(32) as usize;
    let name_start = pos + CENTRAL_HEADER_LEN;
    let extra_start = name_start + name_len;
    let comment_start = extra_start + extra_len;
    let next = comment_start + comment_len;
    if next > cd.len() {
        return Err(Error::corrupt_header(
            at,
            "central directory header overruns the directory",
        ));
    }

    let compressed_size = u32f(20);
    let uncompressed_size = u32f(24);
    let local_header_offset = u32f(42);
    if compressed_size == u32::MAX
        || uncompressed_size == u32::MAX
        || local_header_offset == u32::MAX
    {
        return Err(Error::UnsupportedFeature { feature: "zip64" });
    }

    let entry_flags = u16f(8);
    if entry_flags & flags::ENCRYPTED != 0 {
        return Err(Error::UnsupportedFeature {
            feature: "encrypted entries",
        });
    }

    let raw_name = cd[name_start..extra_start].to_vec();
    let name = decode_name(&raw_name).map_err(|e| match e {
        Error::InvalidEntryName(reason) => Error::corrupt_header(at, reason),
        other => other,
    })?;
    let extra_field = cd[extra_start..comment_start].to_vec();

    let entry = ZipEntry {
        name,
        raw_name,
        version_made_by: u16f(4),
        version_needed: u16f(6),
        flags: entry_flags,
        method: CompressionMethod::from_id(u16f(10)),
        last_modified_time: u16f(12),
        last_modified_date: u16f(14),
        crc32: u32f(16),
        compressed_size,
        uncompressed_size,
        internal_attributes: u16f(36),
        external_attributes: u32f(38),
        local_extra_field: extra_field.clone(),
        extra_field,
        comment: cd[comment_start..next].to_vec(),
        local_header_offset,
        index,
    };
    Ok((entry, next))
}

/// Parses the fixed part of a local header and returns the name and extra
/// lengths. `fixed` must hold exactly [`LOCAL_HEADER_LEN`] bytes.
pub fn parse_local_fixed(fixed: &[u8], offset: u64) -> Result<(usize, usize)> {
    if fixed.len() < LOCAL_HEADER_LEN || u32_at(fixed, 0) != Some(SIG_LOCAL_HEADER) {
        return Err(Error::corrupt_header(offset, "bad local header signature"));
    }
    let name_len = u16_at(fixed, 26).unwrap_or(0) as usize;
    let extra_len = u16_at(fixed, 28).unwrap_or(0) as usize;
    Ok((name_len, extra_len))
}

/// Writes a local file header for `entry`.
///
/// Sizes and CRC are always written in the header, so the data descriptor
/// flag is cleared.
pub fn write_local_header<W: Write>(w: &mut W, entry: &ZipEntry) -> io::Result<()> {
    write_u32_le(w, SIG_LOCAL_HEADER)?;
    write_u16_le(w, entry.version_needed)?;
    write_u16_le(w, entry.flags & !flags::DATA_DESCRIPTOR)?;
    write_u16_le(w, entry.method.id())?;
    write_u16_le(w, entry.last_modified_time)?;
    write_u16_le(w, entry.last_modified_date)?;
    write_u32_le(w, entry.crc32)?;
    write_u32_le(w, entry.compressed_size)?;
    write_u32_le(w, entry.uncompressed_size)?;
    write_u16_le(w, entry.raw_name.len() as u16)?;
    write_u16_le(w, entry.local_extra_field.len() as u16)?;
    w.write_all(&entry.raw_name)?;
    w.write_all(&entry.local_extra_field)
}

/// Writes a central directory file header for `entry` whose local header
/// starts at `local_header_offset`.
pub fn write_central_header<W: Write>(
    w: &mut W,
    entry: &ZipEntry,
    local_header_offset: u32,
) -> io::Result<()> {
    write_u32_le(w, SIG_CENTRAL_HEADER)?;
    write_u16_le(w, entry.version_made_by)?;
    write_u16_le(w, entry.version_needed)?;
    write_u16_le(w, entry.flags & !flags::DATA_DESCRIPTOR)?;
    write_u16_le(w, entry.method.id())?;
    write_u16_le(w, entry.last_modified_time)?;
    write_u16_le(w, entry.last_modified_date)?;
    write_u32_le(w, entry.crc32)?;
    write_u32_le(w, entry.compressed_size)?;
    write_u32_le(w, entry.uncompressed_size)?;
    write_u16_le(w, entry.raw_name.len() as u16)?;
    write_u16_le(w, entry.extra_field.len() as u16)?;
    write_u16_le(w, entry.comment.len() as u16)?;
    write_u16_le(w, 0)?;
    write_u16_le(w, entry.internal_attributes)?;
    write_u32_le(w, entry.external_attributes)?;
    write_u32_le(w, local_header_offset)?;
    w.write_all(&entry.raw_name)?;
    w.write_all(&entry.extra_field)?;
    w.write_all(&entry.comment)
}

/// Decodes a raw zip name.
///
/// Names that are not valid UTF-8 are decoded lossily; the raw bytes are
/// kept separately so they are written back unchanged.
fn decode_name(raw: &[u8]) -> Result<EntryName> {
    EntryName::new(&String::from_utf8_lossy(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eocd_bytes(entries: u16, size: u32, offset: u32, comment: &[u8]) -> Vec<u8> {
        let record = EndOfCentralDirectory {
            entry_count: entries,
            central_dir_size: size,
            central_dir_offset: offset,
            comment: comment.to_vec(),
        };
        let mut buf = Vec::new();
        record.write_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_eocd_roundtrip_with_comment() {
        let mut data = vec![0xAAu8; 10];
        data.extend(eocd_bytes(3, 120, 400, b"built by gradle"));
        let (eocd, at) = EndOfCentralDirectory::find(&data, 1000).unwrap();
        assert_eq!(at, 1010);
        assert_eq!(eocd.entry_count, 3);
        assert_eq!(eocd.central_dir_size, 120);
        assert_eq!(eocd.central_dir_offset, 400);
        assert_eq!(eocd.comment, b"built by gradle");
    }

    #[test]
    fn test_eocd_missing() {
        let err = EndOfCentralDirectory::find(&[0u8; 64], 0).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
        let err = EndOfCentralDirectory::find(b"PK", 0).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_eocd_rejects_split_archives() {
        let mut data = eocd_bytes(1, 46, 0, b"");
        data[4] = 1; // disk number
        let err = EndOfCentralDirectory::find(&data, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedFeature {
                feature: "split archives"
            }
        ));
    }

    #[test]
    fn test_eocd_rejects_zip64_sentinels() {
        let data = eocd_bytes(1, 46, u32::MAX, b"");
        let err = EndOfCentralDirectory::find(&data, 0).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature { feature: "zip64" }));
    }

    #[test]
    fn test_central_header_roundtrip() {
        let mut entry = ZipEntry::new(
            EntryName::new("com/Foo.class").unwrap(),
            CompressionMethod::Deflated,
        );
        entry.crc32 = 0xDEAD_BEEF;
        entry.compressed_size = 10;
        entry.uncompressed_size = 20;
        entry.extra_field = vec![0xFE, 0xCA, 0, 0];
        entry.comment = b"note".to_vec();
        entry.external_attributes = 0o644 << 16;

        let mut cd = Vec::new();
        write_central_header(&mut cd, &entry, 1234).unwrap();
        let (parsed, next) = parse_central_header(&cd, 0, 0, 7).unwrap();
        assert_eq!(next, cd.len());
        assert_eq!(parsed.name.as_str(), "com/Foo.class");
        assert_eq!(parsed.crc32, 0xDEAD_BEEF);
        assert_eq!(parsed.method, CompressionMethod::Deflated);
        assert_eq!(parsed.extra_field, entry.extra_field);
        assert_eq!(parsed.comment, b"note");
        assert_eq!(parsed.external_attributes, 0o644 << 16);
        assert_eq!(parsed.local_header_offset, 1234);
        assert_eq!(parsed.index, 7);
    }

    #[test]
    fn test_central_header_rejects_encrypted() {
        let mut entry = ZipEntry::new(EntryName::new("a").unwrap(), CompressionMethod::Stored);
        entry.flags = flags::ENCRYPTED;
        let mut cd = Vec::new();
        write_central_header(&mut cd, &entry, 0).unwrap();
        let err = parse_central_header(&cd, 0, 0, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedFeature {
                feature: "encrypted entries"
            }
        ));
    }

    #[test]
    fn test_central_header_truncated() {
        let entry = ZipEntry::new(EntryName::new("abc").unwrap(), CompressionMethod::Stored);
        let mut cd = Vec::new();
        write_central_header(&mut cd, &entry, 0).unwrap();
        cd.truncate(cd.len() - 1);
        let err = parse_central_header(&cd, 0, 0x40, 0).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 0x40, .. }));
    }

    #[test]
    fn test_local_header_clears_data_descriptor() {
        let mut entry = ZipEntry::new(EntryName::new("x").unwrap(), CompressionMethod::Stored);
        entry.flags = flags::DATA_DESCRIPTOR;
        entry.local_extra_field = vec![0; 3];
        let mut buf = Vec::new();
        write_local_header(&mut buf, &entry).unwrap();
        assert_eq!(u16_at(&buf, 6), Some(0));
        let (name_len, extra_len) = parse_local_fixed(&buf[..LOCAL_HEADER_LEN], 0).unwrap();
        assert_eq!((name_len, extra_len), (1, 3));
        assert_eq!(LOCAL_HEADER_LEN + name_len + extra_len, buf.len());
    }
}
