//! Frame loop demo: temporary storage per frame, tracked blocks across
//! frames, and a live-block report at the end.
//!
//! Run with `RUST_LOG=info` to see the overflow warnings and the report.

use stash_arena::{configure_thread_arena, talloc, temp_scope, temp_stats, tformat, ArenaConfig};
use stash_bench::workload_sizes;
use stash_heap::{global, tracked_alloc, tracked_free};

fn main() {
    env_logger::init();
    println!("=== stash frame demo ===\n");

    configure_thread_arena(ArenaConfig::new(4 * 1024)).unwrap();
    let sizes = workload_sizes(40, 7);
    let mut textures = Vec::new();

    for frame in 0..10 {
        let _scope = temp_scope();
        let title = tformat!("frame {frame}");
        let mut used = 0;
        for &size in &sizes {
            let _ = talloc(size * (frame + 1) / 4, 16);
            used += size * (frame + 1) / 4;
        }
        println!("{:<10} requested {used:>6} temp bytes", unsafe { title.as_ref() });

        if frame % 2 == 0 {
            textures.push(tracked_alloc!(1024 * (frame + 1)).unwrap().unwrap());
        }
        if frame == 6 {
            let p = textures.remove(0);
            tracked_free!(p.as_ptr());
        }
    }

    println!("\n--- temp storage ---\n{}", temp_stats());
    println!("\n--- tracked heap ---\n{}", global().stats());
    println!("\n--- live blocks ---");
    global().dump_live_blocks(&mut std::io::stdout()).unwrap();
    global().log_live_blocks();
    log::info!("releasing {} blocks", textures.len());

    for p in textures {
        tracked_free!(p.as_ptr());
    }
}
