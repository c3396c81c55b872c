//! Test utilities for stash development.
//!
//! - [`CountingAlloc`] and [`FailingAlloc`]: underlying allocators that let
//!   tests see what the tracking heap does beneath its own bookkeeping.
//! - [`capture_logs`]: run a closure and collect the log records it emits
//!   on the current thread.
//! - [`site`]: a deterministic [`CallSite`](stash_core::CallSite) for
//!   assertions.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod alloc;
pub mod capture;

pub use alloc::{CountingAlloc, FailingAlloc};
pub use capture::{capture_logs, CapturedRecord};

use stash_core::CallSite;

/// A call site in a fixed fake file, distinguished by line.
pub fn site(line: u32) -> CallSite {
    CallSite::new("tests/fixture.rs", "fixture", line)
}
