//! Geometry of a tracked block inside its underlying allocation.

use std::alloc::Layout;

use crate::error::HeapError;
use crate::guard::GUARD_SIZE;

/// Where the payload and guards sit inside one underlying allocation.
///
/// The prefix holds the header guard in its last `GUARD_SIZE` bytes and is
/// rounded up to the payload alignment, so `base + prefix` is aligned
/// whenever `base` is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BlockGeometry {
    pub(crate) prefix: usize,
    pub(crate) size: usize,
    pub(crate) align: usize,
}

impl BlockGeometry {
    pub(crate) fn new(size: usize, align: usize) -> Result<Self, HeapError> {
        if !align.is_power_of_two() {
            return Err(HeapError::InvalidLayout { size, align });
        }
        Ok(Self {
            prefix: GUARD_SIZE.max(align),
            size,
            align,
        })
    }

    /// Layout of the whole underlying allocation.
    pub(crate) fn layout(&self) -> Result<Layout, HeapError> {
        let invalid = HeapError::InvalidLayout {
            size: self.size,
            align: self.align,
        };
        let total = self
            .prefix
            .checked_add(self.size)
            .and_then(|n| n.checked_add(GUARD_SIZE))
            .ok_or_else(|| invalid.clone())?;
        Layout::from_size_align(total, self.align).map_err(|_| invalid)
    }

    /// Address of the underlying allocation for a payload address.
    pub(crate) fn base_of(&self, payload: usize) -> usize {
        payload - self.prefix
    }
}
