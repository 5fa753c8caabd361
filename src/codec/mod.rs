//! Compression methods for zip entry payloads.
//!
//! Only the two methods found in practice in jar, aar and zip files are
//! implemented: stored (0) and deflated (8). Entries with any other method
//! can still be copied verbatim, they just cannot be opened.

pub mod deflate;

pub use deflate::DeflateEncoderOptions;

use crate::{Error, Result};

/// Zip compression method ids.
pub mod method {
    /// No compression.
    pub const STORED: u16 = 0;
    /// Raw deflate.
    pub const DEFLATED: u16 = 8;
}

/// The compression method of a zip entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Method 0.
    Stored,
    /// Method 8.
    Deflated,
    /// Any other method id, kept so the entry can be copied unchanged.
    Other(u16),
}

impl CompressionMethod {
    /// Maps a zip method id.
    pub fn from_id(id: u16) -> Self {
        match id {
            method::STORED => Self::Stored,
            method::DEFLATED => Self::Deflated,
            other => Self::Other(other),
        }
    }

    /// Returns the zip method id.
    pub fn id(self) -> u16 {
        match self {
            Self::Stored => method::STORED,
            Self::Deflated => method::DEFLATED,
            Self::Other(id) => id,
        }
    }

    /// Returns `true` if entries with this method can be decoded and encoded.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Decodes an entry payload into exactly `expected_size` bytes.
pub(crate) fn decompress(
    method: CompressionMethod,
    raw: &[u8],
    expected_size: u64,
    entry_name: &str,
) -> Result<Vec<u8>> {
    let data = match method {
        CompressionMethod::Stored => raw.to_vec(),
        CompressionMethod::Deflated => deflate::inflate(raw, expected_size.saturating_add(1))
            .map_err(|e| {
                Error::InvalidFormat(format!("entry '{}' does not inflate: {}", entry_name, e))
            })?,
        CompressionMethod::Other(method) => {
            return Err(Error::UnsupportedMethod {
                method,
                entry_name: entry_name.to_string(),
            });
        }
    };

    if data.len() as u64 != expected_size {
        return Err(Error::InvalidFormat(format!(
            "entry '{}' decodes to {} bytes, header says {}",
            entry_name,
            data.len(),
            expected_size
        )));
    }
    Ok(data)
}

/// Encodes `data` with `method`.
pub(crate) fn compress(
    method: CompressionMethod,
    data: &[u8],
    options: &DeflateEncoderOptions,
    entry_name: &str,
) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::Stored => Ok(data.to_vec()),
        CompressionMethod::Deflated => Ok(deflate::deflate(data, options)?),
        CompressionMethod::Other(method) => Err(Error::UnsupportedMethod {
            method,
            entry_name: entry_name.to_string(),
        }),
    }
}
