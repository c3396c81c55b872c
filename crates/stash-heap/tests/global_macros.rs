//! Integration test: the process-wide heap and its call-site macros.
//!
//! Kept to a single test so no other test in this binary touches the
//! global heap concurrently.

use stash_heap::{global, tracked_alloc, tracked_free, tracked_realloc};

#[test]
fn macros_track_blocks_on_the_global_heap() {
    let before = global().stats();

    let p = tracked_alloc!(24).unwrap().unwrap();
    let record = global().block(p.as_ptr()).unwrap();
    assert!(record.site().file.ends_with("global_macros.rs"));
    assert!(
        record
            .site()
            .function
            .ends_with("macros_track_blocks_on_the_global_heap"),
        "got {}",
        record.site().function
    );

    let q = tracked_realloc!(p.as_ptr(), 48).unwrap().unwrap();
    let record = global().block(q.as_ptr()).unwrap();
    assert_eq!(record.size(), 48);
    assert_eq!(record.original_size(), 24);
    assert!(record.site().line > record.original_site().line);

    let aligned = tracked_alloc!(10, align = 128).unwrap().unwrap();
    assert_eq!(aligned.as_ptr() as usize % 128, 0);

    assert!(tracked_alloc!(0).unwrap().is_none());

    tracked_free!(q.as_ptr());
    tracked_free!(aligned.as_ptr());

    let after = global().stats();
    assert_eq!(after.total_allocs - before.total_allocs, 2);
    assert_eq!(after.total_reallocs - before.total_reallocs, 1);
    assert_eq!(after.total_frees - before.total_frees, 2);
    assert_eq!(after.live_allocs, before.live_allocs);
    assert_eq!(after.live_bytes, before.live_bytes);

    let mut report = Vec::new();
    global().dump_live_blocks(&mut report).unwrap();
    if before.live_allocs == 0 {
        assert_eq!(report, b"no allocated memory\n");
    }
}
