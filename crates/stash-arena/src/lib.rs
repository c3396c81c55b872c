//! Thread-local temporary storage for short-lived allocations.
//!
//! Each thread owns a fixed-capacity byte buffer handed out by bumping an
//! offset. Nothing is freed individually: callers take a [`TempMark`] and
//! later rewind to it, releasing everything allocated since in O(1).
//!
//! ```text
//! buffer (capacity bytes)
//! ┌────────┬──┬──────────┬────────────────────────────┐
//! │ block  │  │ block    │ free                       │
//! └────────┴──┴──────────┴────────────────────────────┘
//!             ^ padding  ^ offset (mark)              ^ capacity
//! ```
//!
//! A request that does not fit is logged as a leak, counted in
//! [`ArenaStats`], and served from the tracking heap instead, so a
//! temporary allocation never fails. Heap-served blocks are not reclaimed
//! by a reset.
//!
//! # Entry points
//!
//! - [`talloc`], [`tformat!`], [`temp_mark`], [`temp_reset`],
//!   [`temp_scope`], [`temp_stats`]: the current thread's arena.
//! - [`TempArena`]: an explicitly owned arena with the same operations.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod mark;
mod raw;
pub mod stats;
pub mod tls;

pub use arena::TempArena;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use mark::TempMark;
pub use stats::ArenaStats;
pub use tls::{
    configure_thread_arena, talloc, temp_mark, temp_reset, temp_scope, temp_stats, TempScope,
};
