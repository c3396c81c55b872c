//! Instrumented underlying allocators.

#![allow(unsafe_code)]

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Forwards to [`System`] and counts what passes through.
///
/// Each instance keeps its own counters, so parallel tests do not interfere.
#[derive(Debug, Default)]
pub struct CountingAlloc {
    allocs: AtomicUsize,
    deallocs: AtomicUsize,
    reallocs: AtomicUsize,
    live_bytes: AtomicUsize,
}

impl CountingAlloc {
    /// All counters at zero.
    pub const fn new() -> Self {
        Self {
            allocs: AtomicUsize::new(0),
            deallocs: AtomicUsize::new(0),
            reallocs: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
        }
    }

    /// Successful allocations.
    pub fn allocs(&self) -> usize {
        self.allocs.load(Ordering::Relaxed)
    }

    /// Deallocations.
    pub fn deallocs(&self) -> usize {
        self.deallocs.load(Ordering::Relaxed)
    }

    /// Successful reallocations.
    pub fn reallocs(&self) -> usize {
        self.reallocs.load(Ordering::Relaxed)
    }

    /// Bytes currently held from [`System`], guards and padding included.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.load(Ordering::Relaxed)
    }
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded contract.
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.allocs.fetch_add(1, Ordering::Relaxed);
            self.live_bytes.fetch_add(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.deallocs.fetch_add(1, Ordering::Relaxed);
        self.live_bytes.fetch_sub(layout.size(), Ordering::Relaxed);
        // SAFETY: forwarded contract.
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // SAFETY: forwarded contract.
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            self.reallocs.fetch_add(1, Ordering::Relaxed);
            self.live_bytes.fetch_sub(layout.size(), Ordering::Relaxed);
            self.live_bytes.fetch_add(new_size, Ordering::Relaxed);
        }
        new_ptr
    }
}

/// Forwards to [`System`] until a byte budget is exhausted, then returns
/// null for every request that would exceed it.
#[derive(Debug)]
pub struct FailingAlloc {
    budget: usize,
    used: AtomicUsize,
}

impl FailingAlloc {
    /// Allow at most `budget` bytes to be outstanding at once.
    pub const fn with_budget(budget: usize) -> Self {
        Self {
            budget,
            used: AtomicUsize::new(0),
        }
    }

    fn reserve(&self, size: usize) -> bool {
        self.used
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                used.checked_add(size).filter(|&total| total <= self.budget)
            })
            .is_ok()
    }
}

unsafe impl GlobalAlloc for FailingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if !self.reserve(layout.size()) {
            return std::ptr::null_mut();
        }
        // SAFETY: forwarded contract.
        let ptr = unsafe { System.alloc(layout) };
        if ptr.is_null() {
            self.used.fetch_sub(layout.size(), Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.used.fetch_sub(layout.size(), Ordering::Relaxed);
        // SAFETY: forwarded contract.
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if new_size > layout.size() && !self.reserve(new_size - layout.size()) {
            return std::ptr::null_mut();
        }
        // SAFETY: forwarded contract.
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if new_ptr.is_null() {
            if new_size > layout.size() {
                self.used
                    .fetch_sub(new_size - layout.size(), Ordering::Relaxed);
            }
        } else if new_size < layout.size() {
            self.used
                .fetch_sub(layout.size() - new_size, Ordering::Relaxed);
        }
        new_ptr
    }
}
