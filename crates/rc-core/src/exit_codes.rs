//! Exit codes for the reddcast CLI.
//!
//! Exit codes communicate outcome without output parsing:
//! - 0-6: operational outcomes
//! - 10-19: user/environment errors (recoverable by fixing inputs)
//! - 20-29: internal errors

use rc_common::{Error, ErrorCategory};

/// Exit codes for reddcast operations. Stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Clean run, all scenarios projected.
    Clean = 0,

    /// Batch finished but some scenarios failed; see stderr.
    PartialFail = 3,

    /// Invalid arguments or scenario definitions.
    ArgsError = 10,

    /// Reference-table or posterior-table problems.
    InputError = 11,

    /// Internal error (bug - please report).
    InternalError = 20,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err.category() {
            ErrorCategory::Config => ExitCode::ArgsError,
            ErrorCategory::Domain | ErrorCategory::Data | ErrorCategory::Io => {
                ExitCode::InputError
            }
        }
    }
}
