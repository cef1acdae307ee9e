//! Exit codes for the CLI tool.

use pagezip::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Archive format error
pub const BAD_ARCHIVE: i32 = 3;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a pagezip error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    if error.is_format_error() {
        return ExitCode::BadArchive;
    }
    match error {
        Error::Io(_) | Error::Fetch(_) => ExitCode::IoError,
        Error::InvalidArchivePath(_)
        | Error::InvalidCompressionLevel { .. }
        | Error::Serialization(_) => ExitCode::BadArgs,
        Error::EntryWrite { source, .. } => error_to_exit_code(source),
        _ => ExitCode::FatalError,
    }
}
