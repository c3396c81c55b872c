//! Core types shared by the Stash debug allocators.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the pieces both allocators lean on: call-site capture, the fatal
//! failure path, and the running-average arithmetic used by the
//! statistics blocks.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod fatal;
pub mod site;
pub mod stats;

pub use fatal::{fatal, FailurePolicy};
pub use site::CallSite;
pub use stats::running_average;
