//! Workload profiles for benchmarking the stash allocators.
//!
//! - [`workload_sizes`]: a deterministic mix of small request sizes
//! - [`bench_arena_config`]: an arena sized so a frame of the workload fits

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use stash_arena::ArenaConfig;

/// Smallest request size produced by [`workload_sizes`].
pub const MIN_REQUEST: usize = 8;

/// Largest request size produced by [`workload_sizes`].
pub const MAX_REQUEST: usize = 512;

/// `n` request sizes in `MIN_REQUEST..=MAX_REQUEST`, reproducible per seed.
///
/// Skewed towards small sizes the way per-frame scratch requests are: three
/// quarters of the requests are at most 64 bytes.
pub fn workload_sizes(n: usize, seed: u64) -> Vec<usize> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let r = (state >> 33) as usize;
            if r % 4 == 0 {
                MIN_REQUEST + r % (MAX_REQUEST - MIN_REQUEST + 1)
            } else {
                MIN_REQUEST + r % (64 - MIN_REQUEST + 1)
            }
        })
        .collect()
}

/// An arena large enough for one pass over `sizes` at 16-byte alignment.
pub fn bench_arena_config(sizes: &[usize]) -> ArenaConfig {
    let capacity = sizes.iter().map(|s| s.next_multiple_of(16)).sum::<usize>();
    ArenaConfig {
        clear_on_reset: false,
        ..ArenaConfig::new(capacity.max(16))
    }
}
