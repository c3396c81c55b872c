//! The current thread's temporary storage.
//!
//! Each thread lazily builds its own [`TempArena`] with
//! [`ArenaConfig::default`] on first use, falling back to the process-wide
//! tracking heap. [`configure_thread_arena`] replaces it with a different
//! configuration before (or between) uses.
//!
//! The arena is borrowed only while the buffer itself is touched. Overflow
//! warnings, heap fallback, and fatal diagnostics run after the borrow is
//! released, so a log sink may use temporary storage too. Pointers handed
//! out here stay usable across calls. They are invalidated by a reset to
//! an earlier mark and by thread exit.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use stash_core::CallSite;

use crate::arena::{format_with, TempArena};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::mark::TempMark;
use crate::stats::ArenaStats;

thread_local! {
    static TEMP: RefCell<Option<TempArena>> = const { RefCell::new(None) };
}

fn with_arena<R>(f: impl FnOnce(&mut TempArena) -> R) -> R {
    TEMP.with(|cell| {
        let mut slot = cell.borrow_mut();
        let arena = slot
            .get_or_insert_with(|| TempArena::build(ArenaConfig::default(), stash_heap::global()));
        f(arena)
    })
}

/// Allocate `size` bytes aligned to `align` (0 selects the default of 8)
/// from this thread's arena. See [`TempArena::alloc`].
#[track_caller]
pub fn talloc(size: usize, align: usize) -> NonNull<u8> {
    let site = CallSite::caller();
    with_arena(|arena| arena.bump(size, align)).finish(site)
}

#[doc(hidden)]
#[track_caller]
pub fn tformat_args(args: fmt::Arguments<'_>) -> NonNull<str> {
    let site = CallSite::caller();
    // The arena is not borrowed while `args` runs, so `Display` impls may
    // use temporary storage themselves.
    format_with(args, |bytes| with_arena(|arena| arena.bump(bytes, 1)).finish(site))
}

/// Format into this thread's arena, like `format!`, returning a
/// `NonNull<str>` followed in memory by a NUL byte.
///
/// ```
/// use stash_arena::{temp_mark, temp_reset, tformat};
///
/// let mark = temp_mark();
/// let name = tformat!("level_{:02}.map", 7);
/// assert_eq!(unsafe { name.as_ref() }, "level_07.map");
/// temp_reset(mark);
/// ```
#[macro_export]
macro_rules! tformat {
    ($($arg:tt)*) => {
        $crate::tls::tformat_args(::core::format_args!($($arg)*))
    };
}

/// The current offset of this thread's arena.
pub fn temp_mark() -> TempMark {
    with_arena(|arena| arena.mark())
}

/// Rewind this thread's arena to `mark`. See [`TempArena::reset`].
pub fn temp_reset(mark: TempMark) {
    if let Err(rewind) = with_arena(|arena| arena.rewind(mark)) {
        rewind.raise();
    }
}

/// Counters of this thread's arena.
pub fn temp_stats() -> ArenaStats {
    with_arena(|arena| arena.stats())
}

/// Replace this thread's arena with one built from `config`.
///
/// Refused with [`ArenaError::InUse`] while the current arena holds
/// allocations. The replaced arena's statistics are discarded.
pub fn configure_thread_arena(config: ArenaConfig) -> Result<(), ArenaError> {
    config.validate()?;
    TEMP.with(|cell| {
        let mut slot = cell.borrow_mut();
        if let Some(current) = slot.as_ref() {
            let offset = current.mark().offset();
            if offset > 0 {
                return Err(ArenaError::InUse { offset });
            }
        }
        *slot = Some(TempArena::build(config, stash_heap::global()));
        Ok(())
    })
}

/// Take a mark that is reset automatically when the returned guard drops.
///
/// ```
/// use stash_arena::{talloc, temp_mark, temp_scope};
///
/// let before = temp_mark();
/// {
///     let _scope = temp_scope();
///     let _scratch = talloc(256, 0);
/// }
/// assert_eq!(temp_mark(), before);
/// ```
pub fn temp_scope() -> TempScope {
    TempScope {
        mark: temp_mark(),
        _not_send: PhantomData,
    }
}

/// Guard returned by [`temp_scope`].
///
/// On drop it rewinds this thread's arena to the mark taken at creation.
/// If the arena was already reset below that mark inside the scope, the
/// drop does nothing.
#[must_use = "the scope resets as soon as the guard is dropped"]
pub struct TempScope {
    mark: TempMark,
    _not_send: PhantomData<*const ()>,
}

impl TempScope {
    /// The mark this scope will reset to.
    pub fn mark(&self) -> TempMark {
        self.mark
    }
}

impl Drop for TempScope {
    fn drop(&mut self) {
        let mark = self.mark;
        let _ = TEMP.try_with(|cell| {
            if let Ok(mut slot) = cell.try_borrow_mut() {
                if let Some(arena) = slot.as_mut() {
                    if arena.mark() >= mark {
                        arena.reset(mark);
                    }
                }
            }
        });
    }
}

impl fmt::Debug for TempScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempScope").field("mark", &self.mark).finish()
    }
}
