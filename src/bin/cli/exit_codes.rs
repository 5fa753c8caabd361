//! Exit codes for the CLI tool.

use sourcefile_fixer::{Error, ErrorCategory};

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Unreadable archive at some nesting level
pub const BAD_ARCHIVE: i32 = 3;
/// A class file could not be parsed
pub const BAD_CLASS: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// The output cannot reproduce the input nesting
pub const UNSUPPORTED_NESTING: i32 = 6;
/// Ctrl+C (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    BadArchive,
    BadClass,
    IoError,
    UnsupportedNesting,
    UserInterrupt,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::BadArchive => BAD_ARCHIVE,
            Self::BadClass => BAD_CLASS,
            Self::IoError => IO_ERROR,
            Self::UnsupportedNesting => UNSUPPORTED_NESTING,
            Self::UserInterrupt => USER_INTERRUPT,
        }
    }
}

/// Converts a run error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error.category() {
        ErrorCategory::MalformedContainer => ExitCode::BadArchive,
        ErrorCategory::MalformedUnit => ExitCode::BadClass,
        ErrorCategory::IoFailure => ExitCode::IoError,
        ErrorCategory::UnsupportedNesting => ExitCode::UnsupportedNesting,
        ErrorCategory::Cancelled => ExitCode::UserInterrupt,
    }
}
