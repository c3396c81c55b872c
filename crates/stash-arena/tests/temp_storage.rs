//! Integration tests: arena bump allocation, reset, and heap fallback.
//!
//! Standalone `TempArena`s are used throughout so tests do not share the
//! thread-local instance.

use proptest::prelude::*;
use stash_arena::{ArenaConfig, TempArena, TempMark};
use stash_heap::CallSite;
use stash_test_utils::capture_logs;

fn arena(capacity: usize) -> TempArena {
    TempArena::new(ArenaConfig::new(capacity)).unwrap()
}

fn release_overflow(p: std::ptr::NonNull<u8>) {
    stash_heap::global().free(p.as_ptr(), CallSite::UNKNOWN);
}

#[test]
fn small_arena_overflow_scenario() {
    let mut arena = arena(64);

    let first = arena.alloc(40, 8);
    assert!(arena.owns(first.as_ptr()));
    assert_eq!(arena.mark().offset(), 40);

    let (second, records) = capture_logs(|| arena.alloc(40, 8));
    assert!(!arena.owns(second.as_ptr()));
    unsafe { second.as_ptr().write_bytes(0x11, 40) };
    assert_eq!(records.len(), 1);
    assert!(records[0].matches(log::Level::Warn, "leaked 40 bytes of temp memory"));

    let stats = arena.stats();
    assert_eq!(stats.total_leaks, 1);
    assert_eq!(stats.total_bytes_leaked, 40);
    assert_eq!(stats.total_allocs, 1);
    assert_eq!(arena.mark().offset(), 40);

    arena.reset(TempMark::EMPTY);
    let stats = arena.stats();
    assert_eq!(arena.mark(), TempMark::EMPTY);
    assert_eq!(stats.current_bytes, 0);
    assert_eq!(stats.total_full_resets, 1);
    assert_eq!(stats.avg_allocs_per_cycle, 1.0);
    assert_eq!(stats.avg_bytes_per_cycle, 40.0);
    assert_eq!(stats.allocs_this_cycle, 0);
    assert_eq!(stats.bytes_this_cycle, 0);

    // The fallback block outlives the reset.
    assert!(stash_heap::global().contains(second.as_ptr()));
    release_overflow(second);
}

#[test]
fn request_of_capacity_plus_one_is_served_from_heap() {
    for capacity in [1, 16, 4096] {
        let mut arena = arena(capacity);
        let p = arena.alloc(capacity + 1, 1);
        unsafe { p.as_ptr().write_bytes(0xEE, capacity + 1) };
        assert_eq!(arena.stats().total_leaks, 1);
        assert_eq!(arena.remaining(), capacity);
        let record = stash_heap::global().block(p.as_ptr()).unwrap();
        assert_eq!(record.size(), capacity + 1);
        assert!(record.site().file.ends_with("temp_storage.rs"));
        release_overflow(p);
    }
}

#[test]
fn overflow_honours_large_alignment() {
    let mut arena = arena(32);
    let p = arena.alloc(64, 512);
    assert_eq!(p.as_ptr() as usize % 512, 0);
    release_overflow(p);
}

#[test]
fn exact_fit_is_not_an_overflow() {
    let mut arena = arena(48);
    let _ = arena.alloc(16, 16);
    let p = arena.alloc(32, 16);
    assert!(arena.owns(p.as_ptr()));
    assert_eq!(arena.remaining(), 0);
    assert_eq!(arena.stats().total_leaks, 0);
}

#[test]
fn partial_reset_allows_region_reuse() {
    let mut arena = arena(256);
    let _ = arena.alloc(32, 8);
    let mark = arena.mark();
    let a = arena.alloc(64, 8);
    arena.reset(mark);
    assert_eq!(arena.mark(), mark);
    let b = arena.alloc(64, 8);
    assert_eq!(a, b);
    let stats = arena.stats();
    assert_eq!(stats.total_full_resets, 0);
    assert_eq!(stats.allocs_this_cycle, 3);
    assert_eq!(stats.max_bytes, 96);
}

#[derive(Clone, Debug)]
enum Op {
    Alloc { size: usize, align_log2: u32 },
    Mark,
    Reset,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..200, 0u32..7).prop_map(|(size, align_log2)| Op::Alloc { size, align_log2 }),
        1 => Just(Op::Mark),
        1 => Just(Op::Reset),
    ]
}

proptest! {
    #[test]
    fn allocations_are_monotonic_and_disjoint(
        requests in prop::collection::vec((1usize..300, 0u32..7), 1..60)
    ) {
        let mut arena = arena(2048);
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        let mut last_mark = arena.mark();
        let mut overflowed = Vec::new();

        for (size, align_log2) in requests {
            let align = 1usize << align_log2;
            let leaks = arena.stats().total_leaks;
            let p = arena.alloc(size, align);
            prop_assert_eq!(p.as_ptr() as usize % align, 0);
            let mark = arena.mark();
            prop_assert!(mark >= last_mark);
            prop_assert!(mark.offset() <= arena.capacity());
            last_mark = mark;

            if arena.stats().total_leaks == leaks {
                prop_assert!(arena.owns(p.as_ptr()));
                let start = p.as_ptr() as usize;
                let range = (start, start + size);
                for &(s, e) in &ranges {
                    prop_assert!(range.1 <= s || e <= range.0, "overlap {:?} vs {:?}", range, (s, e));
                }
                ranges.push(range);
            } else {
                overflowed.push(p);
            }
        }

        prop_assert_eq!(arena.stats().total_leaks, overflowed.len());
        for p in overflowed {
            release_overflow(p);
        }
    }

    #[test]
    fn reset_restores_the_mark(ops in prop::collection::vec(arb_op(), 1..80)) {
        let mut arena = arena(1024);
        let mut marks: Vec<TempMark> = Vec::new();
        let mut overflowed = Vec::new();

        for op in ops {
            match op {
                Op::Alloc { size, align_log2 } => {
                    let leaks = arena.stats().total_leaks;
                    let p = arena.alloc(size, 1 << align_log2);
                    if arena.stats().total_leaks > leaks {
                        overflowed.push(p);
                    }
                }
                Op::Mark => marks.push(arena.mark()),
                Op::Reset => {
                    if let Some(mark) = marks.pop() {
                        arena.reset(mark);
                        prop_assert_eq!(arena.mark(), mark);
                        prop_assert_eq!(arena.stats().current_bytes, mark.offset());
                    }
                }
            }
            // Marks above the offset can no longer be reset to.
            let offset = arena.mark();
            marks.retain(|&m| m <= offset);
        }

        arena.reset(TempMark::EMPTY);
        prop_assert_eq!(arena.remaining(), arena.capacity());
        for p in overflowed {
            release_overflow(p);
        }
    }
}
