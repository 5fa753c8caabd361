//! Raw deflate streams (method 8).
//!
//! Zip stores deflated payloads without a zlib header or trailer, so the
//! flate2 `Deflate*` types are used rather than the `Zlib*` ones.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

/// Upper bound for the initial output buffer when inflating.
const MAX_PREALLOC: usize = 64 << 20;

/// Deflate encoder options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateEncoderOptions {
    /// Compression level (0-9, default 6).
    pub level: u32,
}

impl Default for DeflateEncoderOptions {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl DeflateEncoderOptions {
    /// Creates options with the given compression level, clamped to 9.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

/// Inflates `raw`, producing at most `limit` bytes.
///
/// Output beyond `limit` is not read, so a caller expecting exactly `n`
/// bytes passes `n + 1` and checks the length.
pub fn inflate(raw: &[u8], limit: u64) -> io::Result<Vec<u8>> {
    let capacity = usize::try_from(limit).unwrap_or(usize::MAX).min(MAX_PREALLOC);
    let mut out = Vec::with_capacity(capacity);
    DeflateDecoder::new(raw).take(limit).read_to_end(&mut out)?;
    Ok(out)
}

/// Deflates `data` in one call.
pub fn deflate(data: &[u8], options: &DeflateEncoderOptions) -> io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(
        Vec::with_capacity(data.len() / 2 + 64),
        Compression::new(options.level),
    );
    encoder.write_all(data)?;
    encoder.finish()
}
