//! Live-block report.

use std::alloc::GlobalAlloc;
use std::io::{self, Write};
use std::time::Duration;

use crate::record::HeapBlockRecord;
use crate::tracking::TrackingHeap;

impl<A: GlobalAlloc> TrackingHeap<A> {
    /// Write one line per live block, in list order from the anchor.
    ///
    /// ```text
    /// 1: 32 bytes @ src/main.rs:12 (app::load) 0.004s ago
    ///    .. realloced from 16 bytes @ src/main.rs:9 (app::load) 0.010s ago
    /// ```
    ///
    /// An empty heap prints `no allocated memory`. The snapshot is taken
    /// before any output is written, so `out` may itself allocate through
    /// this heap.
    pub fn dump_live_blocks<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let blocks = self.blocks();
        if blocks.is_empty() {
            return writeln!(out, "no allocated memory");
        }
        for (index, record) in blocks.iter().enumerate() {
            write_record(out, index + 1, record)?;
        }
        Ok(())
    }

    /// Emit the same report through the `log` facade at info level.
    pub fn log_live_blocks(&self) {
        let mut report = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.dump_live_blocks(&mut report);
        for line in String::from_utf8_lossy(&report).lines() {
            log::info!("{line}");
        }
    }
}

fn write_record<W: Write>(out: &mut W, index: usize, record: &HeapBlockRecord) -> io::Result<()> {
    writeln!(
        out,
        "{index}: {} bytes @ {} {} ago",
        record.size(),
        record.site(),
        Seconds(record.time().elapsed()),
    )?;
    if record.was_reallocated() {
        writeln!(
            out,
            "   .. realloced from {} bytes @ {} {} ago",
            record.original_size(),
            record.original_site(),
            Seconds(record.original_time().elapsed()),
        )?;
    }
    Ok(())
}

struct Seconds(Duration);

impl std::fmt::Display for Seconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}s", self.0.as_secs_f64())
    }
}
