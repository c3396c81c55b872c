//! The fatal failure path.
//!
//! Heap corruption, illegal alignment, and illegal rewinds are programmer
//! errors, not recoverable conditions. [`fatal`] writes the diagnostic to
//! the log sink first, so the last lines of output name the failing call
//! site, then halts according to the configured [`FailurePolicy`].

use std::fmt;

/// How a fatal condition halts execution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Panic with the diagnostic message. Unwinds the calling thread,
    /// which lets tests observe the failure with `#[should_panic]`.
    #[default]
    Panic,
    /// Abort the whole process immediately after logging.
    Abort,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panic => write!(f, "panic"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

/// Log `message` at error level, then halt per `policy`. Never returns.
#[cold]
#[inline(never)]
#[track_caller]
pub fn fatal(policy: FailurePolicy, message: fmt::Arguments<'_>) -> ! {
    log::error!("{message}");
    match policy {
        FailurePolicy::Panic => panic!("{message}"),
        FailurePolicy::Abort => std::process::abort(),
    }
}
