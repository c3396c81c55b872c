//! Temporary storage counters.

use std::fmt;

use stash_core::running_average;

/// Snapshot of one arena's counters.
///
/// A cycle runs from one full reset (to [`TempMark::EMPTY`](crate::TempMark::EMPTY))
/// to the next. Partial resets rewind `current_bytes` but do not end the
/// cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArenaStats {
    /// Requests served from the arena since it was created.
    pub total_allocs: usize,
    /// Resets to the empty mark.
    pub total_full_resets: usize,
    /// Bytes served from the arena, alignment padding excluded.
    pub total_bytes_allocated: usize,
    /// Current offset: bytes in use, padding included.
    pub current_bytes: usize,
    /// Highest offset ever reached.
    pub max_bytes: usize,
    /// Requests that did not fit and went to the heap.
    pub total_leaks: usize,
    /// Bytes requested by those leaked requests.
    pub total_bytes_leaked: usize,
    /// Requests served in the current cycle.
    pub allocs_this_cycle: usize,
    /// Bytes served in the current cycle.
    pub bytes_this_cycle: usize,
    /// Running average of requests per completed cycle.
    pub avg_allocs_per_cycle: f64,
    /// Running average of bytes per completed cycle.
    pub avg_bytes_per_cycle: f64,
}

impl ArenaStats {
    pub(crate) fn record_alloc(&mut self, start: usize, end: usize) {
        let bytes = end - start;
        self.total_allocs += 1;
        self.total_bytes_allocated += bytes;
        self.allocs_this_cycle += 1;
        self.bytes_this_cycle += bytes;
        self.current_bytes = end;
        self.max_bytes = self.max_bytes.max(end);
    }

    pub(crate) fn record_leak(&mut self, size: usize) {
        self.total_leaks += 1;
        self.total_bytes_leaked += size;
    }

    pub(crate) fn record_reset(&mut self, mark: usize) {
        if mark == 0 {
            self.total_full_resets += 1;
            self.avg_allocs_per_cycle = running_average(
                self.avg_allocs_per_cycle,
                self.allocs_this_cycle as f64,
                self.total_full_resets,
            );
            self.avg_bytes_per_cycle = running_average(
                self.avg_bytes_per_cycle,
                self.bytes_this_cycle as f64,
                self.total_full_resets,
            );
            self.allocs_this_cycle = 0;
            self.bytes_this_cycle = 0;
        }
        self.current_bytes = mark;
    }
}

impl fmt::Display for ArenaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "temp allocs {} ({} bytes), full resets {}",
            self.total_allocs, self.total_bytes_allocated, self.total_full_resets
        )?;
        writeln!(
            f,
            "current {} bytes, max {} bytes",
            self.current_bytes, self.max_bytes
        )?;
        writeln!(
            f,
            "leaks {} ({} bytes)",
            self.total_leaks, self.total_bytes_leaked
        )?;
        write!(
            f,
            "per cycle avg {:.1} allocs, {:.1} bytes",
            self.avg_allocs_per_cycle, self.avg_bytes_per_cycle
        )
    }
}
