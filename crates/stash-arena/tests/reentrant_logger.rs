//! Integration tests: a log sink that formats into temporary storage.
//!
//! The sink runs on the same thread as the allocation that logged, so every
//! warning and fatal diagnostic must be emitted with the arena released.

use std::cell::RefCell;
use std::sync::Once;

use log::{Level, Log, Metadata, Record};
use stash_arena::{configure_thread_arena, talloc, temp_mark, temp_reset, temp_scope, temp_stats};
use stash_arena::{tformat, ArenaConfig, TempMark};
use stash_heap::CallSite;

thread_local! {
    static SEEN: RefCell<Vec<(String, String)>> = const { RefCell::new(Vec::new()) };
}

struct TempStorageSink;

impl Log for TempStorageSink {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Warn
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _scope = temp_scope();
        let tag = tformat!("{}", record.level());
        let tag = unsafe { tag.as_ref() }.to_owned();
        SEEN.with(|seen| seen.borrow_mut().push((tag, record.args().to_string())));
    }

    fn flush(&self) {}
}

static SINK: TempStorageSink = TempStorageSink;
static INSTALL: Once = Once::new();

/// Run `f` on a fresh thread with the sink installed, returning what it logged.
fn with_sink(f: impl FnOnce() + Send + 'static) -> Vec<(String, String)> {
    INSTALL.call_once(|| {
        if log::set_logger(&SINK).is_ok() {
            log::set_max_level(log::LevelFilter::Warn);
        }
    });
    let handle = std::thread::spawn(move || {
        f();
        SEEN.with(|seen| seen.take())
    });
    match handle.join() {
        Ok(seen) => seen,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

#[test]
fn overflow_succeeds_when_the_sink_uses_temp_storage() {
    let seen = with_sink(|| {
        configure_thread_arena(ArenaConfig::new(64)).unwrap();
        let p = talloc(100, 8);
        unsafe { p.as_ptr().write_bytes(0x5A, 100) };
        assert!(stash_heap::global().contains(p.as_ptr()));
        assert_eq!(temp_stats().total_leaks, 1);
        assert_eq!(temp_mark(), TempMark::EMPTY);
        stash_heap::global().free(p.as_ptr(), CallSite::UNKNOWN);
    });
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "WARN");
    assert!(seen[0].1.contains("leaked 100 bytes of temp memory"));
}

#[test]
fn overflowing_tformat_succeeds_when_the_sink_uses_temp_storage() {
    let seen = with_sink(|| {
        configure_thread_arena(ArenaConfig::new(16)).unwrap();
        let s = tformat!("{}", "x".repeat(40));
        assert_eq!(unsafe { s.as_ref() }.len(), 40);
        stash_heap::global().free(s.as_ptr() as *mut u8, CallSite::UNKNOWN);
    });
    assert!(seen[0].1.contains("leaked 41 bytes of temp memory"));
}

#[test]
#[should_panic(expected = "alignment 12 is not a power of two")]
fn bad_alignment_reports_through_the_sink() {
    with_sink(|| {
        let _ = talloc(8, 12);
    });
}

#[test]
#[should_panic(expected = "is past the current offset")]
fn forward_rewind_reports_through_the_sink() {
    with_sink(|| {
        let _ = talloc(8, 1);
        let later = temp_mark();
        temp_reset(TempMark::EMPTY);
        temp_reset(later);
    });
}
