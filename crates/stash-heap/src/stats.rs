//! Aggregate heap counters.

use std::fmt;

use stash_core::running_average;

/// Process-wide counters for a [`TrackingHeap`](crate::TrackingHeap).
///
/// Updated on every tracked alloc, realloc, and free; never reset.
/// Byte counts are payload bytes, excluding guards and padding.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeapStats {
    /// Number of tracked allocations since the heap was created.
    pub total_allocs: usize,
    /// Number of tracked reallocations.
    pub total_reallocs: usize,
    /// Number of tracked frees.
    pub total_frees: usize,
    /// Payload bytes ever allocated, including growth through realloc.
    pub total_bytes_allocated: usize,
    /// Payload bytes ever freed, including shrinkage through realloc.
    pub total_bytes_freed: usize,
    /// Blocks currently live.
    pub live_allocs: usize,
    /// Payload bytes currently live.
    pub live_bytes: usize,
    /// Highest `live_allocs` ever reached.
    pub max_live_allocs: usize,
    /// Highest `live_bytes` ever reached.
    pub max_live_bytes: usize,
    /// Average time in seconds between a block's first allocation and its free.
    pub avg_lifespan_secs: f64,
}

impl HeapStats {
    pub(crate) fn record_alloc(&mut self, size: usize) {
        self.total_allocs += 1;
        self.total_bytes_allocated += size;
        self.live_allocs += 1;
        self.live_bytes += size;
        self.max_live_allocs = self.max_live_allocs.max(self.live_allocs);
        self.max_live_bytes = self.max_live_bytes.max(self.live_bytes);
    }

    pub(crate) fn record_realloc(&mut self, old_size: usize, new_size: usize) {
        self.total_reallocs += 1;
        if new_size > old_size {
            let grown = new_size - old_size;
            self.total_bytes_allocated += grown;
            self.live_bytes += grown;
            self.max_live_bytes = self.max_live_bytes.max(self.live_bytes);
        } else {
            let shrunk = old_size - new_size;
            self.total_bytes_freed += shrunk;
            self.live_bytes -= shrunk;
        }
    }

    pub(crate) fn record_free(&mut self, size: usize, lifespan_secs: f64) {
        self.total_frees += 1;
        self.total_bytes_freed += size;
        self.live_allocs -= 1;
        self.live_bytes -= size;
        self.avg_lifespan_secs =
            running_average(self.avg_lifespan_secs, lifespan_secs, self.total_frees);
    }

    /// Mean payload size over all allocations, 0 if there were none.
    pub fn avg_alloc_size(&self) -> f64 {
        if self.total_allocs == 0 {
            return 0.0;
        }
        self.total_bytes_allocated as f64 / self.total_allocs as f64
    }
}

impl fmt::Display for HeapStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "allocs {} / reallocs {} / frees {}",
            self.total_allocs, self.total_reallocs, self.total_frees
        )?;
        writeln!(
            f,
            "bytes allocated {} / freed {}",
            self.total_bytes_allocated, self.total_bytes_freed
        )?;
        writeln!(
            f,
            "live {} blocks, {} bytes (max {} blocks, {} bytes)",
            self.live_allocs, self.live_bytes, self.max_live_allocs, self.max_live_bytes
        )?;
        write!(
            f,
            "avg alloc {:.1} bytes, avg lifespan {:.3}s",
            self.avg_alloc_size(),
            self.avg_lifespan_secs
        )
    }
}
