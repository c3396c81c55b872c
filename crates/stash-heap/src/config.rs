//! Tracking heap configuration.

use stash_core::FailurePolicy;

use crate::error::HeapError;

/// Which guard pattern a heap stamps around its payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GuardKind {
    /// Fixed, human-readable watermarks. Easy to spot in a hex dump.
    #[default]
    Watermark,
    /// Patterns drawn at random when the heap is created. Harder for a
    /// stray write of a known constant to slip past.
    RandomCanary,
}

/// Configuration for a [`TrackingHeap`](crate::TrackingHeap).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug)]
pub struct HeapConfig {
    /// Guard pattern stamped before and after every payload.
    pub guard: GuardKind,
    /// What happens on corruption or an unknown pointer.
    pub failure_policy: FailurePolicy,
    /// Payload alignment used by [`TrackingHeap::alloc`](crate::TrackingHeap::alloc).
    ///
    /// Default: 16. Must be a power of two.
    pub default_align: usize,
}

impl HeapConfig {
    /// Default payload alignment, enough for any primitive type.
    pub const DEFAULT_ALIGN: usize = 16;

    /// Create a config with default values.
    pub fn new() -> Self {
        Self {
            guard: GuardKind::Watermark,
            failure_policy: FailurePolicy::Panic,
            default_align: Self::DEFAULT_ALIGN,
        }
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<(), HeapError> {
        if !self.default_align.is_power_of_two() {
            return Err(HeapError::InvalidConfig {
                reason: format!(
                    "default_align must be a power of two, got {}",
                    self.default_align
                ),
            });
        }
        Ok(())
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new()
    }
}
