//! Benchmark: sequential generation vs parallel preload.
//!
//! Generates a square of chunks one at a time, then again through
//! `World::preload`, and checks both produce the same surfaces.
//! Run with: `cargo run --release -p strata-server --example bench_generation`

use std::time::Instant;

use strata_engine::generation::{GenContext, Pipeline};
use strata_engine::world::position::ChunkCoord;
use strata_engine::world::World;

fn main() {
    let radius: i32 = std::env::args()
        .skip_while(|a| a != "--radius")
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(8);
    let seed: u32 = std::env::args()
        .skip_while(|a| a != "--seed")
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1337);
    let ctx = GenContext::new(seed);
    let side = 2 * radius + 1;
    let chunks = (side * side) as usize;

    println!("=== strata: chunk generation benchmark ===\n");
    println!("  {} chunks ({}x{} square), seed {}\n", chunks, side, side, seed);

    // --- Sequential ---
    let pipeline = Pipeline::standard(ctx);
    let t0 = Instant::now();
    let mut sequential = Vec::with_capacity(chunks);
    for cx in -radius..=radius {
        for cz in -radius..=radius {
            sequential.push(pipeline.generate(ChunkCoord::new(cx, 0, cz)));
        }
    }
    let dt_seq = t0.elapsed();
    println!(
        "  Sequential: {:>6} chunks in {:>8.2?} ({:>8.0} chunks/s)",
        chunks,
        dt_seq,
        chunks as f64 / dt_seq.as_secs_f64()
    );

    // --- Parallel ---
    let world = World::new(ctx);
    let t0 = Instant::now();
    let n_par = world.preload(ChunkCoord::default(), radius);
    let dt_par = t0.elapsed();
    println!(
        "  Parallel:   {:>6} chunks in {:>8.2?} ({:>8.0} chunks/s)",
        n_par,
        dt_par,
        n_par as f64 / dt_par.as_secs_f64()
    );

    let speedup = dt_seq.as_secs_f64() / dt_par.as_secs_f64();
    println!("\n  Speedup: {:.2}x", speedup);

    // --- Verify identical ---
    let mismatches = sequential
        .iter()
        .filter(|chunk| {
            let stored = world.surface_snapshot(chunk.coord());
            chunk.surface() != Some(stored)
        })
        .count();

    if mismatches == 0 && world.generated_count() == chunks as u64 {
        println!("  Verification: PASS (surfaces identical, each chunk generated once)");
    } else {
        println!(
            "  Verification: FAIL ({} mismatches, {} generations)",
            mismatches,
            world.generated_count()
        );
    }
}
