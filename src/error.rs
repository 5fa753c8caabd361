//! Error types for archive rewriting.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes of a rewrite run, along with a convenient [`Result<T>`]
//! type alias.
//!
//! # Error Handling
//!
//! Every error is fatal for the run it occurs in: nothing is retried and no
//! partial output is published. Use [`Error::category`] to map a concrete
//! error onto the coarse failure classes reported to users:
//!
//! ```rust
//! use sourcefile_fixer::{Error, ErrorCategory};
//!
//! fn describe(error: &Error) -> &'static str {
//!     match error.category() {
//!         ErrorCategory::MalformedContainer => "the archive is damaged",
//!         ErrorCategory::MalformedUnit => "a class file could not be parsed",
//!         ErrorCategory::IoFailure => "a file could not be read or written",
//!         ErrorCategory::UnsupportedNesting => "the archive nesting cannot be rebuilt",
//!         ErrorCategory::Cancelled => "the run was cancelled",
//!     }
//! }
//! ```

use std::io;

use crate::classfile::ClassFormatError;

/// Coarse failure class of an [`Error`].
///
/// All categories are fatal for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Unreadable zip structure at some nesting level.
    MalformedContainer,
    /// A class file entry does not parse.
    MalformedUnit,
    /// An underlying read or write failed.
    IoFailure,
    /// The container nesting cannot be rebuilt on the output side.
    UnsupportedNesting,
    /// The run was cancelled before the output was published.
    Cancelled,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedContainer => write!(f, "malformed container"),
            Self::MalformedUnit => write!(f, "malformed class file"),
            Self::IoFailure => write!(f, "I/O failure"),
            Self::UnsupportedNesting => write!(f, "unsupported nesting"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// The main error type for rewrite runs.
///
/// Low-level variants ([`InvalidFormat`][Self::InvalidFormat],
/// [`CorruptHeader`][Self::CorruptHeader], ...) are produced by the zip
/// codec, which does not know where in the nesting tree it is working. The
/// entry stream wraps them into [`MalformedContainer`][Self::MalformedContainer]
/// together with the full nesting path before they reach the caller.
///
/// | Category | Variants |
/// |----------|----------|
/// | I/O | [`Io`][Self::Io] |
/// | Container | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader], [`CrcMismatch`][Self::CrcMismatch], [`UnsupportedMethod`][Self::UnsupportedMethod], [`UnsupportedFeature`][Self::UnsupportedFeature], [`MalformedContainer`][Self::MalformedContainer] |
/// | Class file | [`MalformedUnit`][Self::MalformedUnit] |
/// | Nesting | [`UnsupportedNesting`][Self::UnsupportedNesting], [`UnitNotPooled`][Self::UnitNotPooled] |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading the input or writing the output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The data is not a zip archive.
    #[error("Invalid zip format: {0}")]
    InvalidFormat(String),

    /// A zip header is corrupt or truncated.
    ///
    /// The offset is relative to the start of the archive being read, which
    /// for nested archives is the start of the nested entry's data.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset where corruption was detected.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// An entry that must be decompressed uses an unsupported method.
    ///
    /// Only stored (0) and deflated (8) entries can be decompressed. Opaque
    /// resources with other methods are still copied verbatim.
    #[error("Unsupported compression method {method} for entry '{entry_name}'")]
    UnsupportedMethod {
        /// The zip method id.
        method: u16,
        /// The entry that uses it.
        entry_name: String,
    },

    /// The archive uses a zip feature that is not supported.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// The name of the unsupported feature.
        feature: &'static str,
    },

    /// Decompressed data does not match the stored CRC-32.
    #[error("CRC mismatch for entry '{entry_name}': expected {expected:#x}, got {actual:#x}")]
    CrcMismatch {
        /// The entry name.
        entry_name: String,
        /// The CRC stored in the archive.
        expected: u32,
        /// The CRC of the decompressed data.
        actual: u32,
    },

    /// An entry name is empty or contains a NUL byte.
    #[error("Invalid entry name: {0}")]
    InvalidEntryName(String),

    /// An invalid deflate level was provided.
    #[error("invalid compression level {level}: must be 0-9")]
    InvalidCompressionLevel {
        /// The invalid level that was provided.
        level: u32,
    },

    /// A container at some nesting level could not be read.
    #[error("Malformed container '{path}': {reason}")]
    MalformedContainer {
        /// Nesting path of the container.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// A class file entry could not be parsed.
    #[error("Malformed class file '{path}': {source}")]
    MalformedUnit {
        /// Nesting path of the class file entry.
        path: String,
        /// The parse failure.
        #[source]
        source: ClassFormatError,
    },

    /// The output side cannot rewrap an entry the input side unpacked.
    #[error("Unsupported nesting at '{path}': {reason}")]
    UnsupportedNesting {
        /// Nesting path of the container that cannot be rewrapped.
        path: String,
        /// Why the output plan rejects it.
        reason: String,
    },

    /// A class file met in the writing pass was never pooled.
    ///
    /// Both passes walk the same input in the same order, so this indicates
    /// the input changed between passes.
    #[error("Class file '{path}' was not seen while building the class pool")]
    UnitNotPooled {
        /// Nesting path of the class file entry.
        path: String,
    },

    /// The run was cancelled through an [`AtomicProgress`] handle.
    ///
    /// [`AtomicProgress`]: crate::progress::AtomicProgress
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Maps this error onto its fatal failure category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Io(e) => match e.kind() {
                io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
                    ErrorCategory::MalformedContainer
                }
                _ => ErrorCategory::IoFailure,
            },
            Error::InvalidFormat(_)
            | Error::CorruptHeader { .. }
            | Error::UnsupportedMethod { .. }
            | Error::UnsupportedFeature { .. }
            | Error::CrcMismatch { .. }
            | Error::InvalidEntryName(_)
            | Error::MalformedContainer { .. } => ErrorCategory::MalformedContainer,
            Error::MalformedUnit { .. } => ErrorCategory::MalformedUnit,
            Error::UnsupportedNesting { .. }
            | Error::UnitNotPooled { .. }
            | Error::InvalidCompressionLevel { .. } => ErrorCategory::UnsupportedNesting,
            Error::Cancelled => ErrorCategory::Cancelled,
        }
    }

    /// Returns `true` if this is a data corruption error.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CrcMismatch { .. }
                | Error::CorruptHeader { .. }
                | Error::InvalidFormat(_)
                | Error::MalformedContainer { .. }
                | Error::MalformedUnit { .. }
        )
    }

    /// Returns the nesting path associated with this error, if any.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sourcefile_fixer::Error;
    ///
    /// fn log_error(error: &Error) {
    ///     if let Some(path) = error.entry_path() {
    ///         eprintln!("Error at '{}': {}", path, error);
    ///     }
    /// }
    /// ```
    pub fn entry_path(&self) -> Option<&str> {
        match self {
            Error::MalformedContainer { path, .. }
            | Error::MalformedUnit { path, .. }
            | Error::UnsupportedNesting { path, .. }
            | Error::UnitNotPooled { path } => Some(path.as_str()),
            Error::CrcMismatch { entry_name, .. } | Error::UnsupportedMethod { entry_name, .. } => {
                Some(entry_name.as_str())
            }
            _ => None,
        }
    }

    /// Creates a CorruptHeader error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Attributes a codec-level error to the container at `path`.
    ///
    /// Format errors and decode failures become [`Error::MalformedContainer`];
    /// genuine I/O failures, cancellation and errors that already carry a
    /// path are returned unchanged.
    pub fn in_container(self, path: &str) -> Self {
        match self {
            Error::Io(e)
                if !matches!(
                    e.kind(),
                    io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
                ) =>
            {
                Error::Io(e)
            }
            e @ (Error::MalformedContainer { .. }
            | Error::MalformedUnit { .. }
            | Error::UnsupportedNesting { .. }
            | Error::UnitNotPooled { .. }
            | Error::Cancelled) => e,
            other => Error::MalformedContainer {
                path: path.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// A specialized Result type for rewrite operations.
pub type Result<T> = std::result::Result<T, Error>;
