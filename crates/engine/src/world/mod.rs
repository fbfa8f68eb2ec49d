pub mod access;
pub mod block;
pub mod chunk;
pub mod entity;
pub mod position;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use block::BlockId;
use chunk::Chunk;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use entity::{EntityAnchor, EntityId, EntityRegistry};
use parking_lot::{Mutex, RwLock};
use position::{BlockPos, ChunkCoord};
use rayon::prelude::*;
use thiserror::Error;

use crate::codec::{DeltaBatch, SurfaceSnapshot};
use crate::generation::{ChunkGenerator, GenContext, Pipeline};

/// A published chunk. Every reader holds the same instance; writers take the
/// chunk's exclusive lock.
pub type SharedChunk = Arc<RwLock<Chunk>>;

/// A world position whose chunk coordinate does not fit in `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("block position ({}, {}, {}) lies outside chunk space", .0.x, .0.y, .0.z)]
pub struct OutOfChunkSpace(pub BlockPos);

fn chunk_of(pos: BlockPos) -> Result<ChunkCoord, OutOfChunkSpace> {
    pos.try_chunk().ok_or(OutOfChunkSpace(pos))
}

/// The authoritative chunk store. Thread-safe, lock-sharded by coordinate.
///
/// Chunks are generated on first access and kept for the lifetime of the
/// store. Generation for a coordinate happens at most once: a miss takes the
/// map's exclusive entry lock for that coordinate, re-checks, and generates
/// while still holding it.
pub struct World {
    chunks: DashMap<ChunkCoord, SharedChunk>,
    generator: Box<dyn ChunkGenerator>,
    /// Chunks that have been modified since the last save.
    dirty: DashSet<ChunkCoord>,
    entities: Mutex<EntityRegistry>,
    generated: AtomicU64,
}

impl World {
    /// A store generating with the standard pipeline.
    pub fn new(ctx: GenContext) -> Self {
        Self::with_generator(Box::new(Pipeline::standard(ctx)))
    }

    pub fn with_generator(generator: Box<dyn ChunkGenerator>) -> Self {
        Self {
            chunks: DashMap::new(),
            generator,
            dirty: DashSet::new(),
            entities: Mutex::new(EntityRegistry::new()),
            generated: AtomicU64::new(0),
        }
    }

    /// Return the chunk at `coord`, generating and publishing it on first
    /// access. Concurrent callers for one coordinate all receive the same
    /// instance. The returned chunk's surface cache is valid at return time.
    pub fn get_or_create(&self, coord: ChunkCoord) -> SharedChunk {
        let chunk = match self.chunks.get(&coord) {
            Some(entry) => Arc::clone(entry.value()),
            None => self.create(coord),
        };
        ensure_surface(&chunk);
        chunk
    }

    fn create(&self, coord: ChunkCoord) -> SharedChunk {
        // `entry` holds the shard's write lock until the match ends, so a
        // racing caller either finds our chunk or waits for it.
        match self.chunks.entry(coord) {
            Entry::Occupied(e) => Arc::clone(e.get()),
            Entry::Vacant(e) => {
                let chunk = self.generator.generate(coord);
                self.generated.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(?coord, "generated chunk");
                let shared = Arc::new(RwLock::new(chunk));
                e.insert(Arc::clone(&shared));
                shared
            }
        }
    }

    /// The chunk at `coord` if it is already loaded. Never generates.
    pub fn get(&self, coord: &ChunkCoord) -> Option<SharedChunk> {
        self.chunks.get(coord).map(|entry| Arc::clone(entry.value()))
    }

    pub fn has_chunk(&self, coord: &ChunkCoord) -> bool {
        self.chunks.contains_key(coord)
    }

    /// Publish an externally built chunk (loading from disk). Does not mark
    /// it dirty and does not count as a generation. Replaces any chunk
    /// already at that coordinate.
    pub fn insert_chunk(&self, chunk: Chunk) {
        let coord = chunk.coord();
        self.chunks.insert(coord, Arc::new(RwLock::new(chunk)));
    }

    /// Read a block at an absolute position, generating its chunk if needed.
    pub fn get_block(&self, pos: BlockPos) -> Result<(BlockId, u8), OutOfChunkSpace> {
        let chunk = self.get_or_create(chunk_of(pos)?);
        let (block, meta) = chunk.read().get(pos.local());
        Ok((block, meta))
    }

    /// Write a block at an absolute position. Marks the chunk dirty; its
    /// surface cache is rebuilt lazily on the next read.
    pub fn set_block(
        &self,
        pos: BlockPos,
        block: BlockId,
        meta: u8,
    ) -> Result<(), OutOfChunkSpace> {
        let coord = chunk_of(pos)?;
        let chunk = self.get_or_create(coord);
        chunk.write().set(pos.local(), block, meta);
        self.dirty.insert(coord);
        Ok(())
    }

    /// Apply a batch of edits to one chunk under a single exclusive lock.
    pub fn apply_delta(&self, batch: &DeltaBatch) {
        if batch.edits.is_empty() {
            return;
        }
        let chunk = self.get_or_create(batch.coord);
        {
            let mut guard = chunk.write();
            for edit in &batch.edits {
                guard.set_at_index(edit.pos, edit.block, edit.meta);
            }
        }
        self.dirty.insert(batch.coord);
        tracing::debug!(coord = ?batch.coord, edits = batch.edits.len(), "applied delta batch");
    }

    /// Current surface of a chunk, generating it if needed.
    pub fn surface_snapshot(&self, coord: ChunkCoord) -> SurfaceSnapshot {
        let chunk = self.get_or_create(coord);
        loop {
            if let Some(surface) = chunk.read().surface() {
                return surface;
            }
            // An edit slipped in between the rebuild and our read.
            ensure_surface(&chunk);
        }
    }

    /// Make sure every chunk in the horizontal square of `radius` around
    /// `center` (same Y) exists, generating misses in parallel.
    /// Returns the number of chunks in the region.
    pub fn preload(&self, center: ChunkCoord, radius: i32) -> usize {
        let coords: Vec<ChunkCoord> = (-radius..=radius)
            .flat_map(|dx| {
                (-radius..=radius).map(move |dz| {
                    ChunkCoord::new(
                        center.x.wrapping_add(dx),
                        center.y,
                        center.z.wrapping_add(dz),
                    )
                })
            })
            .collect();
        coords.par_iter().for_each(|coord| {
            self.get_or_create(*coord);
        });
        coords.len()
    }

    // ── Block entities ──────────────────────────────────────────────────

    /// Anchor a new block entity at `pos`. Any entity already anchored there
    /// is removed from the registry.
    pub fn spawn_block_entity(
        &self,
        pos: BlockPos,
        kind: u16,
    ) -> Result<EntityId, OutOfChunkSpace> {
        let coord = chunk_of(pos)?;
        let chunk = self.get_or_create(coord);
        let mut registry = self.entities.lock();
        let id = registry.insert(EntityAnchor { pos, kind });
        if let Some(old) = chunk.write().attach_entity(pos.local(), id) {
            registry.remove(old);
        }
        self.dirty.insert(coord);
        Ok(id)
    }

    pub fn block_entity_at(&self, pos: BlockPos) -> Option<EntityId> {
        let chunk = self.get(&pos.try_chunk()?)?;
        let id = chunk.read().entity_at(pos.local());
        id
    }

    pub fn block_entity(&self, id: EntityId) -> Option<EntityAnchor> {
        self.entities.lock().get(id).copied()
    }

    pub fn remove_block_entity(&self, pos: BlockPos) -> Option<EntityAnchor> {
        let coord = pos.try_chunk()?;
        let chunk = self.get(&coord)?;
        let id = chunk.write().detach_entity(pos.local())?;
        self.dirty.insert(coord);
        self.entities.lock().remove(id)
    }

    pub fn block_entity_count(&self) -> usize {
        self.entities.lock().len()
    }

    // ── Bookkeeping ─────────────────────────────────────────────────────

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of chunks produced by the generator over the store's lifetime.
    pub fn generated_count(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    /// Drain and return all chunk coordinates modified since the last call.
    pub fn take_dirty_chunks(&self) -> Vec<ChunkCoord> {
        let mut dirty: Vec<ChunkCoord> = self.dirty.iter().map(|c| *c).collect();
        // An edit landing between collect and remove loses its mark here, but
        // the caller reads every returned chunk afterwards and so still sees it.
        for coord in &dirty {
            self.dirty.remove(coord);
        }
        dirty.sort();
        dirty
    }

    /// Flag a chunk for the next save, e.g. after a save attempt failed.
    pub fn mark_dirty(&self, coord: ChunkCoord) {
        self.dirty.insert(coord);
    }

    /// Number of chunks currently marked dirty.
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Coordinates of every loaded chunk, sorted.
    pub fn loaded_coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.chunks.iter().map(|e| *e.key()).collect();
        coords.sort();
        coords
    }
}

/// Rebuild a stale surface cache. The check runs under a shared lock; the
/// rebuild only ever runs under the chunk's exclusive lock, re-checked so
/// racing readers rebuild once.
fn ensure_surface(chunk: &RwLock<Chunk>) {
    if chunk.read().is_surface_valid() {
        return;
    }
    let mut guard = chunk.write();
    if !guard.is_surface_valid() {
        guard.rebuild_top_cache();
        tracing::trace!(coord = ?guard.coord(), "rebuilt surface cache");
    }
}
