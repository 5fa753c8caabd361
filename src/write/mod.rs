//! Zip archive writing.
//!
//! [`ZipWriter`] appends entries whose headers are taken from an existing
//! archive. An entry can either be copied with its stored payload
//! ([`add_raw`](ZipWriter::add_raw)) or rebuilt from new uncompressed data
//! ([`add`](ZipWriter::add)), in which case only CRC, sizes and payload
//! change. Everything else in the header is written back as read.
//!
//! # Example
//!
//! ```rust
//! use sourcefile_fixer::codec::CompressionMethod;
//! use sourcefile_fixer::read::{ZipArchive, ZipEntry};
//! use sourcefile_fixer::write::ZipWriter;
//! use sourcefile_fixer::EntryName;
//! use std::io::Cursor;
//!
//! let mut writer = ZipWriter::new(Vec::new());
//! let header = ZipEntry::new(EntryName::new("hello.txt")?, CompressionMethod::Deflated);
//! writer.add(&header, b"Hello, World!")?;
//! let (result, bytes) = writer.finish_into_inner()?;
//! assert_eq!(result.entries_written, 1);
//!
//! let mut archive = ZipArchive::open(Cursor::new(bytes))?;
//! assert_eq!(archive.read(0)?, b"Hello, World!");
//! # Ok::<(), sourcefile_fixer::Error>(())
//! ```

pub(crate) mod options;

pub use options::{WriteOptions, WriteResult};

use std::io::Write;

use crate::checksum::Crc32;
use crate::codec::{self, CompressionMethod};
use crate::format::header::{EndOfCentralDirectory, write_central_header, write_local_header};
use crate::format::LOCAL_HEADER_LEN;
use crate::read::ZipEntry;
use crate::{Error, Result};

/// Largest entry count that fits a plain end of central directory record.
const MAX_ENTRIES: usize = u16::MAX as usize - 1;

/// State of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Accepting new entries.
    AcceptingEntries,
    /// Archive is finished.
    Finished,
}

/// A zip archive writer.
pub struct ZipWriter<W> {
    sink: W,
    options: WriteOptions,
    state: WriterState,
    /// Written entries with their local header offsets.
    central: Vec<(ZipEntry, u32)>,
    /// Bytes written to the sink so far.
    offset: u64,
    comment: Vec<u8>,
    result: WriteResult,
}

impl<W> std::fmt::Debug for ZipWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipWriter")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("entries", &self.central.len())
            .field("offset", &self.offset)
            .finish()
    }
}

impl<W: Write> ZipWriter<W> {
    /// Creates a writer that emits an archive into `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            options: WriteOptions::default(),
            state: WriterState::AcceptingEntries,
            central: Vec::new(),
            offset: 0,
            comment: Vec::new(),
            result: WriteResult::default(),
        }
    }

    /// Sets the write options.
    pub fn options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the archive comment.
    pub fn set_comment(&mut self, comment: impl Into<Vec<u8>>) {
        self.comment = comment.into();
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.central.len()
    }

    /// Returns `true` if no entry has been written.
    pub fn is_empty(&self) -> bool {
        self.central.is_empty()
    }

    /// Writes an entry with new uncompressed `data`.
    ///
    /// The payload is compressed with the template's method; CRC and sizes
    /// are recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] if the template's method cannot
    /// be encoded, or [`Error::UnsupportedFeature`] if the archive would
    /// need zip64.
    pub fn add(&mut self, template: &ZipEntry, data: &[u8]) -> Result<()> {
        self.ensure_accepting()?;
        let mut header = template.clone();
        if template.is_directory() && !data.is_empty() {
            return Err(Error::InvalidFormat(format!(
                "directory entry '{}' cannot carry data",
                template.name
            )));
        }
        let packed = codec::compress(
            header.method,
            data,
            &self.options.encoder_options(),
            header.name.as_str(),
        )?;
        header.crc32 = Crc32::compute(data);
        header.uncompressed_size = fit_u32(data.len() as u64)?;
        header.compressed_size = fit_u32(packed.len() as u64)?;
        if header.method == CompressionMethod::Deflated && header.version_needed < 20 {
            header.version_needed = crate::format::VERSION_DEFLATE;
        }
        self.result.entries_recompressed += 1;
        self.write_entry(header, &packed)
    }

    /// Writes an entry by copying its stored payload unchanged.
    ///
    /// `raw` must be the payload described by `header`, with the header's
    /// CRC and sizes still valid. The local extra field is taken from
    /// [`ZipEntry::local_extra_field`].
    pub fn add_raw(&mut self, header: &ZipEntry, raw: &[u8]) -> Result<()> {
        self.ensure_accepting()?;
        if raw.len() as u64 != u64::from(header.compressed_size) {
            return Err(Error::InvalidFormat(format!(
                "payload of '{}' is {} bytes, header says {}",
                header.name,
                raw.len(),
                header.compressed_size
            )));
        }
        self.write_entry(header.clone(), raw)
    }

    /// Writes the central directory and end record.
    pub fn finish(self) -> Result<WriteResult> {
        self.finish_into_inner().map(|(result, _)| result)
    }

    /// Writes the central directory and end record, returning the sink.
    pub fn finish_into_inner(mut self) -> Result<(WriteResult, W)> {
        self.ensure_accepting()?;

        let central_dir_offset = fit_u32(self.offset)?;
        let mut directory = Vec::new();
        for (entry, local_header_offset) in &self.central {
            write_central_header(&mut directory, entry, *local_header_offset)?;
        }
        let central_dir_size = fit_u32(directory.len() as u64)?;
        self.sink.write_all(&directory)?;
        self.offset += directory.len() as u64;

        let comment_len = self.comment.len();
        if comment_len > u16::MAX as usize {
            return Err(Error::InvalidFormat(format!(
                "archive comment of {} bytes is too long",
                comment_len
            )));
        }
        let end = EndOfCentralDirectory {
            entry_count: self.central.len() as u16,
            central_dir_size,
            central_dir_offset,
            comment: std::mem::take(&mut self.comment),
        };
        let mut record = Vec::new();
        end.write_to(&mut record)?;
        self.sink.write_all(&record)?;
        self.offset += record.len() as u64;
        self.sink.flush()?;

        self.state = WriterState::Finished;
        self.result.archive_size = self.offset;
        log::trace!(
            "finished zip archive: {} entries, {} bytes",
            self.central.len(),
            self.offset
        );
        Ok((self.result, self.sink))
    }

    fn ensure_accepting(&self) -> Result<()> {
        if self.state != WriterState::AcceptingEntries {
            return Err(Error::InvalidFormat("writer already finished".into()));
        }
        Ok(())
    }

    fn write_entry(&mut self, header: ZipEntry, payload: &[u8]) -> Result<()> {
        if self.central.len() >= MAX_ENTRIES {
            return Err(Error::UnsupportedFeature { feature: "zip64" });
        }
        let local_header_offset = fit_u32(self.offset)?;
        let header_len =
            LOCAL_HEADER_LEN + header.raw_name.len() + header.local_extra_field.len();
        if header.raw_name.len() > u16::MAX as usize
            || header.local_extra_field.len() > u16::MAX as usize
            || header.extra_field.len() > u16::MAX as usize
            || header.comment.len() > u16::MAX as usize
        {
            return Err(Error::InvalidFormat(format!(
                "header field of '{}' exceeds 65535 bytes",
                header.name
            )));
        }

        let mut local = Vec::with_capacity(header_len);
        write_local_header(&mut local, &header)?;
        self.sink.write_all(&local)?;
        self.sink.write_all(payload)?;
        self.offset += (local.len() + payload.len()) as u64;

        if header.is_directory() {
            self.result.directories_written += 1;
        } else {
            self.result.entries_written += 1;
        }
        self.result.total_size += u64::from(header.uncompressed_size);
        self.central.push((header, local_header_offset));
        Ok(())
    }
}

fn fit_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::UnsupportedFeature { feature: "zip64" })
}
