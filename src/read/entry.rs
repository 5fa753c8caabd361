//! Zip entry header metadata.

use crate::archive_path::EntryName;
use crate::checksum::verify_crc32;
use crate::codec::{self, CompressionMethod};
use crate::format::{VERSION_DEFLATE, flags};
use crate::Result;

/// DOS date for 1980-01-01, the earliest representable zip timestamp.
const DOS_EPOCH_DATE: u16 = (1 << 5) | 1;

/// An entry of a zip archive, as described by its central directory header.
///
/// Every field the rewriter does not have to change is kept so the entry can
/// be written back with identical metadata: raw name bytes, timestamps,
/// attributes, extra fields, comment and version fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ZipEntry {
    /// The decoded entry name.
    pub name: EntryName,
    /// The name exactly as stored.
    pub raw_name: Vec<u8>,
    /// Version made by (host system and format version).
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// General purpose flags.
    pub flags: u16,
    /// Compression method.
    pub method: CompressionMethod,
    /// DOS modification time.
    pub last_modified_time: u16,
    /// DOS modification date.
    pub last_modified_date: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Size of the stored payload.
    pub compressed_size: u32,
    /// Size of the uncompressed data.
    pub uncompressed_size: u32,
    /// Internal file attributes.
    pub internal_attributes: u16,
    /// External file attributes (Unix mode in the high 16 bits).
    pub external_attributes: u32,
    /// Extra field from the central directory.
    pub extra_field: Vec<u8>,
    /// Extra field from the local header.
    ///
    /// Equal to [`extra_field`](Self::extra_field) until the payload has been
    /// read; aligners such as zipalign pad only the local copy.
    pub local_extra_field: Vec<u8>,
    /// Entry comment.
    pub comment: Vec<u8>,
    /// Offset of the local header in the source archive.
    pub(crate) local_header_offset: u32,
    /// Position in the central directory.
    pub(crate) index: usize,
}

impl ZipEntry {
    /// Creates an entry header with default metadata.
    pub fn new(name: EntryName, method: CompressionMethod) -> Self {
        let raw_name = name.as_str().as_bytes().to_vec();
        let flags = if name.as_str().is_ascii() {
            0
        } else {
            flags::UTF8_NAMES
        };
        Self {
            name,
            raw_name,
            version_made_by: VERSION_DEFLATE,
            version_needed: VERSION_DEFLATE,
            flags,
            method,
            last_modified_time: 0,
            last_modified_date: DOS_EPOCH_DATE,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            internal_attributes: 0,
            external_attributes: 0,
            extra_field: Vec::new(),
            local_extra_field: Vec::new(),
            comment: Vec::new(),
            local_header_offset: 0,
            index: 0,
        }
    }

    /// Returns true if this is a directory entry.
    pub fn is_directory(&self) -> bool {
        self.name.is_directory()
    }

    /// Position of this entry in its archive's central directory.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Decodes a raw payload of this entry and verifies its CRC.
    pub fn decompress(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let data = codec::decompress(
            self.method,
            raw,
            u64::from(self.uncompressed_size),
            self.name.as_str(),
        )?;
        verify_crc32(self.name.as_str(), &data, self.crc32)?;
        Ok(data)
    }
}
