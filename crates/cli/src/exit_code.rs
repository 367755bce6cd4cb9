//! Process exit codes for the sc binary

use sc_core::Error;

/// Exit codes returned by sc commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success,
    /// Unclassified failure
    GeneralError,
    /// Bad command-line usage or malformed input
    UsageError,
    /// Addressed resource or profile does not exist
    NotFound,
    /// Version conflict on a conditional write
    Conflict,
}

impl ExitCode {
    /// Numeric process exit code
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::GeneralError => 1,
            ExitCode::UsageError => 2,
            ExitCode::NotFound => 3,
            ExitCode::Conflict => 4,
        }
    }

    /// Classify an SDK error into an exit code
    pub fn from_error(error: &Error) -> Self {
        if error.is_conflict() {
            ExitCode::Conflict
        } else if error.is_not_found() {
            ExitCode::NotFound
        } else {
            match error {
                Error::InvalidUri(_)
                | Error::UnsupportedEntity(_)
                | Error::NotAnObject(_)
                | Error::InvalidField(_)
                | Error::Validation(_) => ExitCode::UsageError,
                Error::ProfileNotFound(_) => ExitCode::NotFound,
                _ => ExitCode::GeneralError,
            }
        }
    }
}
