//! Owned, fixed-size byte buffer backing an arena.
//!
//! The only module in this crate that touches raw memory. Each `unsafe`
//! block carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Alignment of the buffer start. Larger request alignments are satisfied
/// by padding inside the buffer.
const BUFFER_ALIGN: usize = 16;

pub(crate) struct RawBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl RawBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes.
    ///
    /// `capacity` must be non-zero and at most `isize::MAX`; callers
    /// validate their config first. Exhaustion goes through
    /// [`alloc::handle_alloc_error`].
    pub(crate) fn new(capacity: usize) -> Self {
        let layout = Layout::from_size_align(capacity.max(1), BUFFER_ALIGN)
            .unwrap_or_else(|_| Layout::new::<[u8; BUFFER_ALIGN]>());
        // SAFETY: the layout has a non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            alloc::handle_alloc_error(layout)
        };
        Self { ptr, layout }
    }

    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    pub(crate) fn base(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Pointer to byte `offset`. `offset == len()` yields the end pointer.
    pub(crate) fn at(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset <= self.len());
        // SAFETY: `offset` is within the allocation or one past its end.
        unsafe { self.ptr.add(offset) }
    }

    /// Zero `start..end`.
    pub(crate) fn clear(&mut self, start: usize, end: usize) {
        assert!(start <= end && end <= self.len(), "clear range out of bounds");
        // SAFETY: the range was bounds-checked above and the buffer is
        // exclusively borrowed.
        unsafe { self.ptr.add(start).write_bytes(0, end - start) };
    }

    /// Whether `ptr` points into this buffer.
    pub(crate) fn contains(&self, ptr: *const u8) -> bool {
        let addr = ptr as usize;
        addr >= self.base() && addr < self.base() + self.len()
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        // SAFETY: `ptr` was returned by `alloc_zeroed` with `layout`.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_zeroed_and_aligned() {
        let buf = RawBuffer::new(64);
        assert_eq!(buf.len(), 64);
        assert_eq!(buf.base() % BUFFER_ALIGN, 0);
        let bytes = unsafe { std::slice::from_raw_parts(buf.at(0).as_ptr(), 64) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn clear_zeroes_only_the_range() {
        let mut buf = RawBuffer::new(16);
        unsafe { buf.at(0).as_ptr().write_bytes(0xFF, 16) };
        buf.clear(4, 8);
        let bytes = unsafe { std::slice::from_raw_parts(buf.at(0).as_ptr(), 16) };
        assert_eq!(&bytes[..4], &[0xFF; 4]);
        assert_eq!(&bytes[4..8], &[0; 4]);
        assert_eq!(&bytes[8..], &[0xFF; 8]);
    }

    #[test]
    fn contains_covers_exactly_the_buffer() {
        let buf = RawBuffer::new(32);
        assert!(buf.contains(buf.at(0).as_ptr()));
        assert!(buf.contains(buf.at(31).as_ptr()));
        assert!(!buf.contains(buf.at(32).as_ptr()));
    }
}
