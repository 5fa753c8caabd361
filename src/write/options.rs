//! Write options and result types.

use crate::codec::DeflateEncoderOptions;

/// Default deflate level for recompressed entries.
pub const DEFAULT_LEVEL: u32 = 6;

/// Options for writing zip archives.
///
/// Only entries whose payload changed are recompressed; everything else is
/// copied as stored, so these options never affect untouched entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Deflate level (0-9) for recompressed entries.
    pub level: u32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

impl WriteOptions {
    /// Creates new write options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression level (strict validation).
    ///
    /// Valid values are 0-9. Use [`level_clamped`] instead if values above 9
    /// should silently become 9.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] if level is greater than 9.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sourcefile_fixer::write::WriteOptions;
    ///
    /// let opts = WriteOptions::new().level(9)?;
    /// assert_eq!(opts.level, 9);
    ///
    /// assert!(WriteOptions::new().level(15).is_err());
    /// # Ok::<(), sourcefile_fixer::Error>(())
    /// ```
    ///
    /// [`level_clamped`]: Self::level_clamped
    /// [`Error::InvalidCompressionLevel`]: crate::Error::InvalidCompressionLevel
    pub fn level(mut self, level: u32) -> crate::Result<Self> {
        if level > 9 {
            return Err(crate::Error::InvalidCompressionLevel { level });
        }
        self.level = level;
        Ok(self)
    }

    /// Sets the compression level, clamping values above 9.
    ///
    /// ```rust
    /// use sourcefile_fixer::write::WriteOptions;
    ///
    /// assert_eq!(WriteOptions::new().level_clamped(15).level, 9);
    /// ```
    pub fn level_clamped(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    pub(crate) fn encoder_options(&self) -> DeflateEncoderOptions {
        DeflateEncoderOptions::with_level(self.level)
    }
}

/// Result of writing an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of file entries written.
    pub entries_written: usize,
    /// Number of directory entries written.
    pub directories_written: usize,
    /// Number of entries that were recompressed from new data.
    pub entries_recompressed: usize,
    /// Total uncompressed bytes of all entries.
    pub total_size: u64,
    /// Total size of the archive in bytes.
    pub archive_size: u64,
}
