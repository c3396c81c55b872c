//! Tracking heap allocator with guard bytes and live-block diagnostics.
//!
//! [`TrackingHeap`] wraps any [`GlobalAlloc`](std::alloc::GlobalAlloc)
//! and instruments every allocation it hands out:
//!
//! ```text
//! underlying allocation
//! ┌──────────┬────────────┬──────────────────┬────────────┐
//! │ padding  │ header     │ payload (size)   │ footer     │
//! │ (align)  │ guard (8B) │ returned to user │ guard (8B) │
//! └──────────┴────────────┴──────────────────┴────────────┘
//! ```
//!
//! Metadata for each live block ([`HeapBlockRecord`]) lives in a side table
//! keyed by payload address. The records are also threaded into a circular
//! doubly-linked list starting at an anchor, which is the order
//! [`TrackingHeap::blocks`] and the dump report them in. Aggregate counters
//! are kept in [`HeapStats`].
//!
//! Freeing or reallocating a block whose guards were overwritten, or a
//! pointer this heap never returned, is fatal (see
//! [`FailurePolicy`](stash_core::FailurePolicy)).
//!
//! The process-wide instance is reached through [`global`] and the
//! [`tracked_alloc!`], [`tracked_realloc!`], and [`tracked_free!`] macros,
//! which record the call site automatically.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

mod block;
pub mod config;
mod dump;
pub mod error;
pub mod global;
pub mod guard;
mod list;
pub mod record;
pub mod stats;
pub mod tracking;

pub use config::{GuardKind, HeapConfig};
pub use error::{HeapCorruption, HeapError};
pub use global::global;
pub use guard::Guard;
pub use record::HeapBlockRecord;
pub use stats::HeapStats;
pub use tracking::TrackingHeap;

pub use stash_core::{CallSite, FailurePolicy};

#[doc(hidden)]
pub mod __private {
    pub use stash_core::call_site;
}
