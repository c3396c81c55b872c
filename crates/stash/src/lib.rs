//! Stash: debug memory tooling for long-running applications.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! stash sub-crates. Two allocators are provided:
//!
//! - a **tracking heap** that wraps a [`GlobalAlloc`](std::alloc::GlobalAlloc),
//!   surrounds every block with guard bytes, and keeps a record of where and
//!   when each live block was allocated;
//! - **temporary storage**: a per-thread bump arena with mark/reset that
//!   falls back to the tracking heap when full.
//!
//! # Quick start
//!
//! ```rust
//! use stash::prelude::*;
//!
//! // Tracked heap blocks remember their call site.
//! let block = tracked_alloc!(128).unwrap().unwrap();
//! assert_eq!(heap::global().block(block.as_ptr()).unwrap().size(), 128);
//! tracked_free!(block.as_ptr());
//!
//! // Temporary storage is released in bulk.
//! let frame = temp_scope();
//! let label = tformat!("frame {}", 7);
//! assert_eq!(unsafe { label.as_ref() }, "frame 7");
//! let _scratch = talloc(4096, 16);
//! drop(frame);
//! assert_eq!(temp_mark(), TempMark::EMPTY);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`common`] | `stash-core` | `CallSite`, `FailurePolicy`, the fatal path |
//! | [`heap`] | `stash-heap` | `TrackingHeap`, guards, records, `HeapStats`, the global heap |
//! | [`arena`] | `stash-arena` | `TempArena`, thread-local temporary storage, `ArenaStats` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Call sites, failure policy, and shared helpers (`stash-core`).
pub use stash_core as common;

/// The tracking heap allocator (`stash-heap`).
///
/// Use [`heap::global`] for the process-wide instance, or build a
/// [`heap::TrackingHeap`] over any allocator.
pub use stash_heap as heap;

/// Temporary storage (`stash-arena`).
///
/// The free functions act on the current thread's arena;
/// [`arena::TempArena`] is the explicitly owned form.
pub use stash_arena as arena;

pub use stash_arena::tformat;
pub use stash_core::call_site;
pub use stash_heap::{tracked_alloc, tracked_free, tracked_realloc};

/// Common imports for typical stash usage.
///
/// ```rust
/// use stash::prelude::*;
/// ```
pub mod prelude {
    // Call sites and failure handling
    pub use stash_core::{CallSite, FailurePolicy};

    // Tracking heap
    pub use stash_heap::{
        GuardKind, HeapBlockRecord, HeapConfig, HeapCorruption, HeapError, HeapStats,
        TrackingHeap,
    };

    // Temporary storage
    pub use stash_arena::{
        configure_thread_arena, talloc, temp_mark, temp_reset, temp_scope, temp_stats,
        ArenaConfig, ArenaError, ArenaStats, TempArena, TempMark, TempScope,
    };

    // Macros
    pub use crate::{call_site, tformat, tracked_alloc, tracked_free, tracked_realloc};

    // Sub-crate modules
    pub use crate::{arena, heap};
}
