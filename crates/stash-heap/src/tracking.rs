//! The tracking heap allocator.
//!
//! [`TrackingHeap`] wraps an underlying [`GlobalAlloc`] and adds a guard
//! frame and a [`HeapBlockRecord`] to every block it hands out. All
//! bookkeeping sits behind one mutex, so the heap can be shared freely
//! between threads.

#![allow(unsafe_code)]

use std::alloc::{GlobalAlloc, System};
use std::fmt;
use std::ptr::NonNull;
use std::time::Instant;

use parking_lot::Mutex;
use stash_core::{fatal, CallSite, FailurePolicy};

use crate::block::BlockGeometry;
use crate::config::HeapConfig;
use crate::error::{HeapCorruption, HeapError};
use crate::guard::Guard;
use crate::list::BlockList;
use crate::record::HeapBlockRecord;
use crate::stats::HeapStats;

/// Everything the mutex protects.
struct HeapState {
    blocks: BlockList,
    stats: HeapStats,
}

/// A heap allocator that records metadata and guard bytes for every block.
///
/// # Type Parameters
///
/// * `A`: the allocator that provides the actual memory. Defaults to
///   [`System`].
///
/// # Example
///
/// ```
/// use stash_heap::{CallSite, TrackingHeap};
///
/// let heap = TrackingHeap::new(std::alloc::System);
/// let block = heap.alloc(64, CallSite::caller()).unwrap().unwrap();
/// assert_eq!(heap.stats().live_bytes, 64);
/// heap.free(block.as_ptr(), CallSite::caller());
/// assert_eq!(heap.stats().live_allocs, 0);
/// ```
pub struct TrackingHeap<A = System> {
    inner: A,
    config: HeapConfig,
    guard: Guard,
    state: Mutex<HeapState>,
}

impl<A: GlobalAlloc> TrackingHeap<A> {
    /// Create a tracking heap with the default configuration.
    pub fn new(inner: A) -> Self {
        let config = HeapConfig::default();
        Self {
            inner,
            guard: Guard::from_kind(config.guard),
            config,
            state: Mutex::new(HeapState {
                blocks: BlockList::new(),
                stats: HeapStats::default(),
            }),
        }
    }

    /// Create a tracking heap with a custom configuration.
    pub fn with_config(inner: A, config: HeapConfig) -> Result<Self, HeapError> {
        config.validate()?;
        Ok(Self {
            inner,
            guard: Guard::from_kind(config.guard),
            config,
            state: Mutex::new(HeapState {
                blocks: BlockList::new(),
                stats: HeapStats::default(),
            }),
        })
    }

    /// The configuration this heap was built with.
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// The guard patterns this heap stamps.
    pub fn guard(&self) -> Guard {
        self.guard
    }

    /// Allocate `size` bytes at the configured default alignment.
    ///
    /// Returns `Ok(None)` when `size == 0`.
    pub fn alloc(&self, size: usize, site: CallSite) -> Result<Option<NonNull<u8>>, HeapError> {
        self.alloc_aligned(size, self.config.default_align, site)
    }

    /// Allocate `size` bytes whose address is a multiple of `align`.
    ///
    /// Returns `Ok(None)` when `size == 0`.
    pub fn alloc_aligned(
        &self,
        size: usize,
        align: usize,
        site: CallSite,
    ) -> Result<Option<NonNull<u8>>, HeapError> {
        if size == 0 {
            return Ok(None);
        }
        let geometry = BlockGeometry::new(size, align)?;
        let layout = geometry.layout()?;
        // SAFETY: the layout always has a non-zero size (it includes both guards).
        let base = unsafe { self.inner.alloc(layout) };
        let base = NonNull::new(base).ok_or(HeapError::OutOfMemory {
            requested: layout.size(),
        })?;
        // SAFETY: `prefix < layout.size()`, so the payload stays in bounds.
        let payload = unsafe { base.add(geometry.prefix) };
        // SAFETY: the allocation spans the header guard, the payload, and
        // the footer guard.
        unsafe { self.guard.stamp(payload.as_ptr(), size) };

        let record =
            HeapBlockRecord::new(payload.as_ptr() as usize, size, align, Instant::now(), site);
        let mut state = self.state.lock();
        state.blocks.push(record);
        state.stats.record_alloc(size);
        Ok(Some(payload))
    }

    /// Resize a tracked block, possibly moving it.
    ///
    /// A null `ptr` allocates; `new_size == 0` frees and returns `Ok(None)`.
    /// The block's original size, site, and time are preserved for
    /// diagnostics. On `Err` the original block is untouched and still
    /// tracked.
    ///
    /// Fatal if `ptr` is not a live block of this heap or its guards were
    /// overwritten.
    pub fn realloc(
        &self,
        ptr: *mut u8,
        new_size: usize,
        site: CallSite,
    ) -> Result<Option<NonNull<u8>>, HeapError> {
        if new_size == 0 {
            self.free(ptr, site);
            return Ok(None);
        }
        if ptr.is_null() {
            return self.alloc(new_size, site);
        }

        let address = ptr as usize;
        let mut state = self.state.lock();
        let record = match state.blocks.get(address) {
            Some(record) => *record,
            None => {
                drop(state);
                self.corrupted(address, None, HeapCorruption::UnknownPointer, "realloc", site)
            }
        };
        // SAFETY: `record` is live, so its guard frame is ours to read.
        if let Err(corruption) = unsafe { self.guard.verify(ptr, record.size) } {
            drop(state);
            self.corrupted(address, Some(&record), corruption, "realloc", site);
        }

        let old = BlockGeometry::new(record.size, record.align)?;
        let new = BlockGeometry::new(new_size, record.align)?;
        let old_layout = old.layout()?;
        let new_layout = new.layout()?;
        let base = old.base_of(address) as *mut u8;
        // SAFETY: `base` came from `self.inner` with `old_layout`, and the
        // new size is non-zero and was validated as a layout.
        let new_base = unsafe { self.inner.realloc(base, old_layout, new_layout.size()) };
        let new_base = NonNull::new(new_base).ok_or(HeapError::OutOfMemory {
            requested: new_layout.size(),
        })?;
        // SAFETY: the prefix is unchanged, so the payload offset still lies
        // inside the resized allocation.
        let payload = unsafe { new_base.add(new.prefix) };
        // The header guard moved with the contents; only the footer needs
        // to follow the new end of the payload.
        // SAFETY: the resized allocation ends with room for the footer.
        unsafe { self.guard.stamp_footer(payload.as_ptr(), new_size) };

        let new_address = payload.as_ptr() as usize;
        if let Some(moved) = state.blocks.relocate(address, new_address) {
            moved.resized(new_address, new_size, site, Instant::now());
        }
        state.stats.record_realloc(record.size, new_size);
        Ok(Some(payload))
    }

    /// Release a tracked block. No-op on null.
    ///
    /// Fatal if `ptr` is not a live block of this heap (including a block
    /// that was already freed) or its guards were overwritten.
    pub fn free(&self, ptr: *mut u8, site: CallSite) {
        if ptr.is_null() {
            return;
        }
        let address = ptr as usize;
        let mut state = self.state.lock();
        let record = match state.blocks.get(address) {
            Some(record) => *record,
            None => {
                drop(state);
                self.corrupted(address, None, HeapCorruption::UnknownPointer, "free", site)
            }
        };
        // SAFETY: `record` is live, so its guard frame is ours to read.
        if let Err(corruption) = unsafe { self.guard.verify(ptr, record.size) } {
            drop(state);
            self.corrupted(address, Some(&record), corruption, "free", site);
        }
        state.blocks.remove(address);
        let lifespan = record.original_time.elapsed().as_secs_f64();
        state.stats.record_free(record.size, lifespan);
        drop(state);

        // The record was live, so its geometry was valid when it was made.
        let Ok(geometry) = BlockGeometry::new(record.size, record.align) else {
            return;
        };
        let Ok(layout) = geometry.layout() else {
            return;
        };
        // SAFETY: the block was allocated by `self.inner` with exactly this
        // layout and is no longer reachable through the registry.
        unsafe {
            self.inner
                .dealloc(geometry.base_of(address) as *mut u8, layout)
        };
    }

    /// Snapshot of the aggregate counters.
    pub fn stats(&self) -> HeapStats {
        self.state.lock().stats
    }

    /// Number of live blocks.
    pub fn live_count(&self) -> usize {
        self.state.lock().blocks.len()
    }

    /// Whether `ptr` is the payload of a live block.
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.state.lock().blocks.get(ptr as usize).is_some()
    }

    /// The record for the live block at `ptr`, if any.
    pub fn block(&self, ptr: *const u8) -> Option<HeapBlockRecord> {
        self.state.lock().blocks.get(ptr as usize).copied()
    }

    /// Payload address of the anchor record, `None` when nothing is live.
    pub fn first_block(&self) -> Option<usize> {
        self.state.lock().blocks.anchor()
    }

    /// All live records in list order, starting at the anchor.
    pub fn blocks(&self) -> Vec<HeapBlockRecord> {
        self.state.lock().blocks.iter().copied().collect()
    }

    /// Verify the guards of every live block without failing.
    ///
    /// Returns the payload address and failure of each corrupted block.
    pub fn check_integrity(&self) -> Vec<(usize, HeapCorruption)> {
        let state = self.state.lock();
        state
            .blocks
            .iter()
            .filter_map(|record| {
                // SAFETY: every record in the list is a live block of ours.
                unsafe { self.guard.verify(record.address as *const u8, record.size) }
                    .err()
                    .map(|corruption| (record.address, corruption))
            })
            .collect()
    }

    fn corrupted(
        &self,
        address: usize,
        record: Option<&HeapBlockRecord>,
        corruption: HeapCorruption,
        operation: &str,
        site: CallSite,
    ) -> ! {
        match record {
            Some(record) => fatal(
                self.config.failure_policy,
                format_args!(
                    "heap corruption on {operation} at {site}: {corruption}; block {address:#x}, \
                     {} bytes, allocated at {}",
                    record.size, record.original_site
                ),
            ),
            None => fatal(
                self.config.failure_policy,
                format_args!("heap corruption on {operation} at {site}: {corruption}; address {address:#x}"),
            ),
        }
    }
}

impl<A> fmt::Debug for TrackingHeap<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TrackingHeap")
            .field("config", &self.config)
            .field("live_allocs", &state.stats.live_allocs)
            .field("live_bytes", &state.stats.live_bytes)
            .finish_non_exhaustive()
    }
}

impl<A> TrackingHeap<A> {
    /// The failure policy applied to corruption.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.config.failure_policy
    }

    /// The underlying allocator.
    pub fn inner(&self) -> &A {
        &self.inner
    }
}
