//! World persistence as one deflated chunk snapshot per file.
//!
//! Saves dirty chunks to `<dir>/chunks/c.X.Y.Z.bin` and publishes saved
//! chunks back into a store on startup. Unsaved chunks are regenerated from
//! the seed on demand, so only edited chunks ever reach disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use strata_engine::codec::{decode_chunk, encode_chunk};
use strata_engine::world::position::ChunkCoord;
use strata_engine::world::World;

const CHUNK_DIR: &str = "chunks";

/// File holding the chunk at `coord`, relative to the world directory.
pub fn chunk_path(dir: &Path, coord: ChunkCoord) -> PathBuf {
    dir.join(CHUNK_DIR)
        .join(format!("c.{}.{}.{}.bin", coord.x, coord.y, coord.z))
}

/// Parse `c.X.Y.Z.bin` back into a coordinate.
fn parse_chunk_file(name: &str) -> Option<ChunkCoord> {
    let inner = name.strip_prefix("c.")?.strip_suffix(".bin")?;
    let mut parts = inner.split('.');
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let z = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(ChunkCoord::new(x, y, z))
}

// ── Save ─────────────────────────────────────────────────────────────────────

/// Write every chunk modified since the last save. Returns how many chunks
/// were written. On failure, chunks not yet written stay dirty for the next
/// attempt.
pub fn save_world(world: &World, dir: &Path) -> Result<usize> {
    let dirty = world.take_dirty_chunks();
    if dirty.is_empty() {
        tracing::info!("World save: nothing to save (no dirty chunks)");
        return Ok(0);
    }

    let start = Instant::now();
    let mut done = 0usize;
    let mut written = 0usize;
    if let Err(e) = write_chunks(world, dir, &dirty, &mut done, &mut written) {
        for coord in &dirty[done..] {
            world.mark_dirty(*coord);
        }
        tracing::warn!("World save interrupted: {} chunks left dirty", dirty.len() - done);
        return Err(e);
    }

    tracing::info!(
        "World saved: {} chunks to {} ({:.2?})",
        written,
        dir.join(CHUNK_DIR).display(),
        start.elapsed(),
    );
    Ok(written)
}

/// `done` counts entries of `dirty` fully handled, so the caller knows
/// where a failure stopped.
fn write_chunks(
    world: &World,
    dir: &Path,
    dirty: &[ChunkCoord],
    done: &mut usize,
    written: &mut usize,
) -> Result<()> {
    let chunk_dir = dir.join(CHUNK_DIR);
    fs::create_dir_all(&chunk_dir)
        .with_context(|| format!("creating {}", chunk_dir.display()))?;

    for coord in dirty {
        if let Some(chunk) = world.get(coord) {
            // Encode under the shared lock, write after releasing it.
            let bytes = encode_chunk(&chunk.read(), true)
                .with_context(|| format!("encoding chunk {:?}", coord))?;
            let path = chunk_path(dir, *coord);
            let tmp = path.with_extension("bin.tmp");
            fs::write(&tmp, &bytes).with_context(|| format!("writing {}", tmp.display()))?;
            fs::rename(&tmp, &path).with_context(|| format!("replacing {}", path.display()))?;
            *written += 1;
        }
        *done += 1;
    }
    Ok(())
}

// ── Load ─────────────────────────────────────────────────────────────────────

/// Publish every saved chunk under `dir` into `world`. Loaded chunks are not
/// dirty and do not count as generated. A missing directory loads nothing.
pub fn load_into(world: &World, dir: &Path) -> Result<usize> {
    let chunk_dir = dir.join(CHUNK_DIR);
    if !chunk_dir.exists() {
        return Ok(0);
    }

    let start = Instant::now();
    let mut loaded = 0usize;
    let entries = fs::read_dir(&chunk_dir)
        .with_context(|| format!("listing {}", chunk_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(expected) = parse_chunk_file(name) else {
            continue;
        };
        let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let chunk = decode_chunk(&bytes).with_context(|| format!("decoding {}", path.display()))?;
        if chunk.coord() != expected {
            tracing::warn!(
                "Skipping {}: snapshot holds chunk {:?}",
                path.display(),
                chunk.coord()
            );
            continue;
        }
        world.insert_chunk(chunk);
        loaded += 1;
    }

    if loaded > 0 {
        tracing::info!("World loaded: {} chunks ({:.2?})", loaded, start.elapsed());
    }
    Ok(loaded)
}

// ── Tests ────────────────────────────────────────────────────────────────────
