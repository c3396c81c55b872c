//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors from configuring temporary storage.
///
/// Running out of arena space is not an error: oversized requests fall back
/// to the heap. Bad alignments and illegal rewinds are programmer errors and
/// go through the fatal path instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// An [`ArenaConfig`](crate::ArenaConfig) value was rejected.
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
    /// The thread's arena cannot be replaced while it holds allocations.
    InUse {
        /// Bytes currently allocated from the arena.
        offset: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { reason } => write!(f, "invalid arena config: {reason}"),
            Self::InUse { offset } => {
                write!(f, "arena still holds {offset} bytes; reset it before reconfiguring")
            }
        }
    }
}

impl Error for ArenaError {}
