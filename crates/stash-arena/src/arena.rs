//! The bump allocator behind temporary storage.

#![allow(unsafe_code)]

use std::alloc::{handle_alloc_error, Layout};
use std::fmt;
use std::ptr::NonNull;

use stash_core::{fatal, CallSite, FailurePolicy};
use stash_heap::{HeapError, TrackingHeap};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::mark::TempMark;
use crate::raw::RawBuffer;
use crate::stats::ArenaStats;

/// A fixed-capacity bump allocator with mark/reset.
///
/// Every pointer it returns stays valid until the arena is reset to a mark
/// taken before the allocation, or dropped. Requests that do not fit are
/// served from a [`TrackingHeap`] and stay valid until freed there.
///
/// `TempArena` is neither `Send` nor `Sync`. The per-thread instance behind
/// [`talloc`](crate::talloc) is one of these; tests and callers that want
/// explicit ownership can build their own.
///
/// ```
/// use stash_arena::{ArenaConfig, TempArena};
///
/// let mut arena = TempArena::new(ArenaConfig::new(1024)).unwrap();
/// let mark = arena.mark();
/// let p = arena.alloc(100, 16);
/// assert_eq!(p.as_ptr() as usize % 16, 0);
/// arena.reset(mark);
/// assert_eq!(arena.mark(), mark);
/// ```
pub struct TempArena {
    buffer: RawBuffer,
    offset: usize,
    stats: ArenaStats,
    config: ArenaConfig,
    heap: &'static TrackingHeap,
}

impl TempArena {
    /// Create an arena that falls back to the process-wide tracking heap.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::with_heap(config, stash_heap::global())
    }

    /// Create an arena that falls back to `heap`.
    pub fn with_heap(config: ArenaConfig, heap: &'static TrackingHeap) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::build(config, heap))
    }

    /// Construct from a config that is already known to be valid.
    pub(crate) fn build(config: ArenaConfig, heap: &'static TrackingHeap) -> Self {
        Self {
            buffer: RawBuffer::new(config.capacity),
            offset: 0,
            stats: ArenaStats::default(),
            config,
            heap,
        }
    }

    /// Allocate `size` bytes aligned to `align` (0 selects the configured
    /// default).
    ///
    /// Never fails: a request that does not fit is logged, counted as a
    /// leak, and served from the tracking heap. Fatal if `align` is not a
    /// power of two.
    #[track_caller]
    pub fn alloc(&mut self, size: usize, align: usize) -> NonNull<u8> {
        self.alloc_at(size, align, CallSite::caller())
    }

    fn alloc_at(&mut self, size: usize, align: usize, site: CallSite) -> NonNull<u8> {
        self.bump(size, align).finish(site)
    }

    /// Serve a request from the buffer if it fits.
    ///
    /// Does no logging and never touches the heap, so it is safe to call
    /// while the arena is borrowed. Whatever is left to do is returned as
    /// a [`Bump`] for the caller to finish after releasing the arena.
    pub(crate) fn bump(&mut self, size: usize, align: usize) -> Bump {
        let align = if align == 0 {
            self.config.default_align
        } else {
            align
        };
        if !align.is_power_of_two() {
            return Bump::BadAlign {
                align,
                policy: self.config.failure_policy,
            };
        }

        // Align the absolute address so alignments above the buffer's own
        // are honoured too.
        let base = self.buffer.base();
        let span = (base + self.offset)
            .checked_next_multiple_of(align)
            .map(|addr| addr - base)
            .and_then(|start| Some((start, start.checked_add(size)?)));
        match span {
            Some((start, end)) if end <= self.buffer.len() => {
                self.offset = end;
                self.stats.record_alloc(start, end);
                Bump::Served(self.buffer.at(start))
            }
            _ => {
                self.stats.record_leak(size);
                Bump::Spill(Spill {
                    size,
                    align,
                    heap: self.heap,
                    policy: self.config.failure_policy,
                })
            }
        }
    }

    /// Format `args` into the arena as a NUL-terminated string.
    ///
    /// The returned `str` excludes the terminator; the byte after it is
    /// `0`. Dereferencing it is valid until the arena is reset past it.
    #[track_caller]
    pub fn format(&mut self, args: fmt::Arguments<'_>) -> NonNull<str> {
        let site = CallSite::caller();
        format_with(args, |bytes| self.alloc_at(bytes, 1, site))
    }

    /// The current offset, to reset to later.
    pub fn mark(&self) -> TempMark {
        TempMark(self.offset)
    }

    /// Release everything allocated since `mark` was taken.
    ///
    /// Resetting to [`TempMark::EMPTY`] is a full reset and closes the
    /// current statistics cycle. Fatal if `mark` lies past the current
    /// offset.
    pub fn reset(&mut self, mark: TempMark) {
        if let Err(rewind) = self.rewind(mark) {
            rewind.raise();
        }
    }

    /// [`reset`](Self::reset) without the fatal path, for callers that
    /// must release the arena before reporting.
    pub(crate) fn rewind(&mut self, mark: TempMark) -> Result<(), PastOffset> {
        if mark.0 > self.offset {
            return Err(PastOffset {
                mark,
                offset: self.offset,
                policy: self.config.failure_policy,
            });
        }
        if self.config.clear_on_reset {
            self.buffer.clear(mark.0, self.offset);
        }
        self.stats.record_reset(mark.0);
        self.offset = mark.0;
        Ok(())
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> ArenaStats {
        self.stats
    }

    /// Buffer size in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes left before the next request overflows, ignoring padding.
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// Whether `ptr` was served from this arena's buffer rather than the
    /// heap.
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.buffer.contains(ptr)
    }

    /// The config this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }
}

impl fmt::Debug for TempArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempArena")
            .field("capacity", &self.buffer.len())
            .field("offset", &self.offset)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`TempArena::bump`].
pub(crate) enum Bump {
    /// Carved from the buffer.
    Served(NonNull<u8>),
    /// Did not fit. Already counted as a leak; still to be logged and
    /// served from the heap.
    Spill(Spill),
    /// The alignment is not a power of two.
    BadAlign { align: usize, policy: FailurePolicy },
}

impl Bump {
    /// Log and serve whatever the buffer could not.
    pub(crate) fn finish(self, site: CallSite) -> NonNull<u8> {
        match self {
            Self::Served(ptr) => ptr,
            Self::Spill(spill) => spill.serve(site),
            Self::BadAlign { align, policy } => fatal(
                policy,
                format_args!("temp alloc at {site}: alignment {align} is not a power of two"),
            ),
        }
    }
}

/// A request the buffer could not hold.
pub(crate) struct Spill {
    size: usize,
    align: usize,
    heap: &'static TrackingHeap,
    policy: FailurePolicy,
}

impl Spill {
    #[cold]
    fn serve(self, site: CallSite) -> NonNull<u8> {
        let Self {
            size,
            align,
            heap,
            policy,
        } = self;
        log::warn!("leaked {size} bytes of temp memory at {site}");
        match heap.alloc_aligned(size.max(1), align, site) {
            Ok(Some(ptr)) => ptr,
            Ok(None) => unreachable!("non-empty heap request returned no block"),
            Err(err @ HeapError::OutOfMemory { .. }) => {
                log::error!("temp alloc at {site}: heap fallback for {size} bytes failed: {err}");
                match Layout::from_size_align(size.max(1), align) {
                    Ok(layout) => handle_alloc_error(layout),
                    Err(_) => std::process::abort(),
                }
            }
            Err(err) => fatal(
                policy,
                format_args!("temp alloc at {site}: cannot serve {size} bytes from the heap: {err}"),
            ),
        }
    }
}

/// A reset to a mark past the current offset.
pub(crate) struct PastOffset {
    mark: TempMark,
    offset: usize,
    policy: FailurePolicy,
}

impl PastOffset {
    pub(crate) fn raise(self) -> ! {
        fatal(
            self.policy,
            format_args!(
                "temp reset to {} is past the current offset {}",
                self.mark, self.offset
            ),
        )
    }
}

/// Format `args` into memory obtained from `alloc`, which must return a
/// block of at least the requested size that nothing else references.
pub(crate) fn format_with(
    args: fmt::Arguments<'_>,
    alloc: impl FnOnce(usize) -> NonNull<u8>,
) -> NonNull<str> {
    let mut counter = LenCounter(0);
    let _ = fmt::write(&mut counter, args);
    let len = counter.0;
    let dst = alloc(len.saturating_add(1));

    // SAFETY: `alloc` returned `len + 1` bytes owned by the caller.
    let buf = unsafe { std::slice::from_raw_parts_mut(dst.as_ptr(), len + 1) };
    let (text, terminator) = buf.split_at_mut(len);
    let mut writer = SliceWriter { buf: text, len: 0 };
    // A `Display` impl that writes more the second time is truncated.
    let _ = fmt::write(&mut writer, args);
    let written = writer.len;
    if written < len {
        text[written] = 0;
    } else {
        terminator[0] = 0;
    }

    let raw = std::ptr::slice_from_raw_parts_mut(dst.as_ptr(), written) as *mut str;
    // SAFETY: `raw` is derived from a non-null pointer, and `SliceWriter`
    // only ever copies whole UTF-8 sequences.
    unsafe { NonNull::new_unchecked(raw) }
}

struct LenCounter(usize);

impl fmt::Write for LenCounter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

struct SliceWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl fmt::Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let room = self.buf.len() - self.len;
        let mut n = room.min(s.len());
        while !s.is_char_boundary(n) {
            n -= 1;
        }
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        if n < s.len() {
            return Err(fmt::Error);
        }
        Ok(())
    }
}
