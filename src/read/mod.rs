//! Zip archive reading.
//!
//! [`ZipArchive`] parses the central directory once on open and then reads
//! entry payloads on demand, in any order, through their local headers.
//!
//! # Example
//!
//! ```rust,no_run
//! use sourcefile_fixer::read::ZipArchive;
//!
//! let mut archive = ZipArchive::open_path("app.jar")?;
//! for index in 0..archive.len() {
//!     let data = archive.read(index)?;
//!     println!("{}: {} bytes", archive.entries()[index].name, data.len());
//! }
//! # Ok::<(), sourcefile_fixer::Error>(())
//! ```

mod entry;

pub use entry::ZipEntry;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::format::header::{EndOfCentralDirectory, parse_central_header, parse_local_fixed};
use crate::format::reader::read_bytes;
use crate::format::{EOCD_SEARCH_MAX, LOCAL_HEADER_LEN};
use crate::{Error, Result};

/// Payload of an entry as stored, plus its local extra field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// The extra field of the local header.
    pub local_extra_field: Vec<u8>,
    /// The compressed payload.
    pub data: Vec<u8>,
}

/// A zip archive opened for reading.
#[derive(Debug)]
pub struct ZipArchive<R> {
    reader: R,
    archive_len: u64,
    entries: Vec<ZipEntry>,
    comment: Vec<u8>,
}

impl ZipArchive<BufReader<File>> {
    /// Opens a zip file from a path.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::open(BufReader::new(file))
    }
}

impl<R: Read + Seek> ZipArchive<R> {
    /// Opens a zip archive by parsing its central directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no end of central directory record is found, if
    /// the central directory is truncated or inconsistent, or if the archive
    /// uses zip64, multiple disks or encryption.
    pub fn open(mut reader: R) -> Result<Self> {
        let archive_len = reader.seek(SeekFrom::End(0))?;
        let tail_len = archive_len.min(EOCD_SEARCH_MAX as u64);
        let tail_offset = archive_len - tail_len;
        reader.seek(SeekFrom::Start(tail_offset))?;
        let tail = read_bytes(&mut reader, tail_len as usize)?;

        let (eocd, eocd_offset) = EndOfCentralDirectory::find(&tail, tail_offset)?;
        let cd_offset = u64::from(eocd.central_dir_offset);
        let cd_end = cd_offset + u64::from(eocd.central_dir_size);
        if cd_end > eocd_offset {
            return Err(Error::corrupt_header(
                eocd_offset,
                format!(
                    "central directory [{:#x}, {:#x}) overlaps the end record",
                    cd_offset, cd_end
                ),
            ));
        }

        reader.seek(SeekFrom::Start(cd_offset))?;
        let cd = read_bytes(&mut reader, eocd.central_dir_size as usize)?;

        let mut entries = Vec::with_capacity(usize::from(eocd.entry_count));
        let mut pos = 0;
        for index in 0..usize::from(eocd.entry_count) {
            let (entry, next) = parse_central_header(&cd, pos, cd_offset, index)?;
            if u64::from(entry.local_header_offset) >= cd_offset {
                return Err(Error::corrupt_header(
                    cd_offset + pos as u64,
                    format!(
                        "local header of '{}' points into the central directory",
                        entry.name
                    ),
                ));
            }
            entries.push(entry);
            pos = next;
        }
        log::trace!(
            "opened zip archive: {} entries, central directory at {:#x}",
            entries.len(),
            cd_offset
        );

        Ok(Self {
            reader,
            archive_len,
            entries,
            comment: eocd.comment,
        })
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries in central directory order.
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Returns the archive comment.
    pub fn comment(&self) -> &[u8] {
        &self.comment
    }

    /// Reads the stored payload of the entry at `index`.
    pub fn read_raw(&mut self, index: usize) -> Result<RawEntry> {
        let entry = self.entries.get(index).ok_or_else(|| {
            Error::InvalidFormat(format!("entry index {} out of range", index))
        })?;
        let header_offset = u64::from(entry.local_header_offset);
        let compressed_size = u64::from(entry.compressed_size);

        self.reader.seek(SeekFrom::Start(header_offset))?;
        let fixed = read_bytes(&mut self.reader, LOCAL_HEADER_LEN)?;
        let (name_len, extra_len) = parse_local_fixed(&fixed, header_offset)?;

        let data_offset = header_offset + (LOCAL_HEADER_LEN + name_len + extra_len) as u64;
        if data_offset + compressed_size > self.archive_len {
            return Err(Error::corrupt_header(
                header_offset,
                format!("payload of '{}' extends past end of archive", entry.name),
            ));
        }

        self.reader.seek(SeekFrom::Current(name_len as i64))?;
        let local_extra_field = read_bytes(&mut self.reader, extra_len)?;
        let data = read_bytes(&mut self.reader, compressed_size as usize)?;
        Ok(RawEntry {
            local_extra_field,
            data,
        })
    }

    /// Reads and decompresses the entry at `index`, verifying its CRC.
    pub fn read(&mut self, index: usize) -> Result<Vec<u8>> {
        let raw = self.read_raw(index)?;
        self.entries[index].decompress(&raw.data)
    }

    /// Consumes the archive and returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
