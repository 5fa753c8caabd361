//! CRC-32 computation for zip entries.
//!
//! Zip stores the CRC-32 (IEEE 802.3 polynomial) of every entry's
//! uncompressed data in both its local and central headers.
//!
//! # Example
//!
//! ```rust
//! use sourcefile_fixer::checksum::Crc32;
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.finalize(), 0xEC4AC3D0);
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

use crate::{Error, Result};

/// CRC-32 checksum calculator.
#[derive(Clone)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.hasher.clone().finalize())
            .finish()
    }
}

impl Crc32 {
    /// Creates a new checksum calculator.
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Updates the checksum with additional data.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the checksum of all data seen so far.
    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Computes the checksum of a single slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

/// Checks `data` against the CRC stored for `entry_name`.
pub(crate) fn verify_crc32(entry_name: &str, data: &[u8], expected: u32) -> Result<()> {
    let actual = Crc32::compute(data);
    if actual != expected {
        return Err(Error::CrcMismatch {
            entry_name: entry_name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
