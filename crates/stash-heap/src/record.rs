//! Per-block metadata.

use std::time::{Duration, Instant};

use stash_core::CallSite;

/// Metadata for one live tracked allocation.
///
/// The "current" fields follow the block through reallocations; the
/// "original" fields keep what the first allocation looked like. `prev` and
/// `next` are the payload addresses of the neighbouring records in the
/// heap's circular list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapBlockRecord {
    pub(crate) address: usize,
    pub(crate) align: usize,
    pub(crate) size: usize,
    pub(crate) original_size: usize,
    pub(crate) time: Instant,
    pub(crate) original_time: Instant,
    pub(crate) site: CallSite,
    pub(crate) original_site: CallSite,
    pub(crate) prev: usize,
    pub(crate) next: usize,
}

impl HeapBlockRecord {
    /// A fresh record: original and current halves are identical and the
    /// links point at itself.
    pub(crate) fn new(
        address: usize,
        size: usize,
        align: usize,
        time: Instant,
        site: CallSite,
    ) -> Self {
        Self {
            address,
            align,
            size,
            original_size: size,
            time,
            original_time: time,
            site,
            original_site: site,
            prev: address,
            next: address,
        }
    }

    /// Payload address handed to the caller.
    pub fn address(&self) -> usize {
        self.address
    }

    /// Payload alignment.
    pub fn align(&self) -> usize {
        self.align
    }

    /// Current payload size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Payload size at the original allocation.
    pub fn original_size(&self) -> usize {
        self.original_size
    }

    /// When the block was last allocated or reallocated.
    pub fn time(&self) -> Instant {
        self.time
    }

    /// When the block was first allocated.
    pub fn original_time(&self) -> Instant {
        self.original_time
    }

    /// Call site of the last allocation or reallocation.
    pub fn site(&self) -> CallSite {
        self.site
    }

    /// Call site of the original allocation.
    pub fn original_site(&self) -> CallSite {
        self.original_site
    }

    /// Payload address of the previous record in the list.
    pub fn prev(&self) -> usize {
        self.prev
    }

    /// Payload address of the next record in the list.
    pub fn next(&self) -> usize {
        self.next
    }

    /// Time since the original allocation.
    pub fn age(&self) -> Duration {
        self.original_time.elapsed()
    }

    /// Whether any current field differs from its original counterpart,
    /// i.e. the block went through a reallocation.
    pub fn was_reallocated(&self) -> bool {
        self.size != self.original_size
            || self.site != self.original_site
            || self.time != self.original_time
    }

    /// Apply a reallocation: new address, size, site, and time. The
    /// original half is left alone.
    pub(crate) fn resized(&mut self, address: usize, size: usize, site: CallSite, now: Instant) {
        self.address = address;
        self.size = size;
        self.site = site;
        self.time = now;
    }
}
