//! Heap-specific error types.

use std::error::Error;
use std::fmt;

/// Recoverable errors from tracking heap operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// The underlying allocator returned null.
    OutOfMemory {
        /// Total bytes requested from the underlying allocator,
        /// including guards and padding.
        requested: usize,
    },
    /// The block size or alignment cannot form a valid layout
    /// (alignment not a power of two, or size overflow).
    InvalidLayout {
        /// Payload size in bytes.
        size: usize,
        /// Requested payload alignment.
        align: usize,
    },
    /// A [`HeapConfig`](crate::HeapConfig) value was rejected.
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "underlying allocator failed to provide {requested} bytes")
            }
            Self::InvalidLayout { size, align } => {
                write!(f, "invalid block layout: size {size}, align {align}")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid heap config: {reason}"),
        }
    }
}

impl Error for HeapError {}

/// Integrity failures detected on a tracked block. Always fatal when
/// encountered on free or realloc.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapCorruption {
    /// The pointer is not the payload of a live block: never allocated by
    /// this heap, or already freed.
    UnknownPointer,
    /// The guard just before the payload was overwritten (buffer underrun).
    HeaderGuard,
    /// The guard just after the payload was overwritten (buffer overrun).
    FooterGuard,
}

impl fmt::Display for HeapCorruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPointer => write!(f, "pointer is not a live tracked block"),
            Self::HeaderGuard => write!(f, "header guard overwritten (buffer underrun)"),
            Self::FooterGuard => write!(f, "footer guard overwritten (buffer overrun)"),
        }
    }
}

impl Error for HeapCorruption {}
