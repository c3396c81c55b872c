//! The process-wide tracking heap.
//!
//! [`global`] returns a lazily built [`TrackingHeap`] over [`System`]. The
//! [`tracked_alloc!`](crate::tracked_alloc),
//! [`tracked_realloc!`](crate::tracked_realloc), and
//! [`tracked_free!`](crate::tracked_free) macros target it and record the
//! invoking file, function, and line.

use std::alloc::System;
use std::sync::LazyLock;

use crate::tracking::TrackingHeap;

static GLOBAL_HEAP: LazyLock<TrackingHeap> = LazyLock::new(|| TrackingHeap::new(System));

/// The process-wide tracking heap, built with the default configuration on
/// first use.
pub fn global() -> &'static TrackingHeap {
    &GLOBAL_HEAP
}

/// Allocate from the global heap, recording the call site.
///
/// Expands to `global().alloc(size, call_site!())` and yields
/// `Result<Option<NonNull<u8>>, HeapError>`.
#[macro_export]
macro_rules! tracked_alloc {
    ($size:expr) => {
        $crate::global().alloc($size, $crate::__private::call_site!())
    };
    ($size:expr, align = $align:expr) => {
        $crate::global().alloc_aligned($size, $align, $crate::__private::call_site!())
    };
}

/// Resize a block of the global heap, recording the call site.
#[macro_export]
macro_rules! tracked_realloc {
    ($ptr:expr, $size:expr) => {
        $crate::global().realloc($ptr, $size, $crate::__private::call_site!())
    };
}

/// Free a block of the global heap, recording the call site.
#[macro_export]
macro_rules! tracked_free {
    ($ptr:expr) => {
        $crate::global().free($ptr, $crate::__private::call_site!())
    };
}
