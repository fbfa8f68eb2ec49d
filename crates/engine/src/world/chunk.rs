use std::collections::BTreeMap;

use super::block::BlockId;
use super::entity::EntityId;
use super::position::{column, ChunkCoord, LocalPos};
use crate::codec::SurfaceSnapshot;

/// log2 of the chunk edge. The edge must stay a power of two so that
/// packing is plain shifts and masks.
pub const CHUNK_SHIFT: u32 = 5;
/// Number of blocks along each axis of a chunk.
pub const CHUNK_SIZE: usize = 1 << CHUNK_SHIFT;
/// Number of columns in a chunk (one surface-cache entry each).
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;
/// Total block count in one chunk.
pub const CHUNK_VOLUME: usize = CHUNK_AREA * CHUNK_SIZE;

/// A decorative instance placed on top of the dense grid. Purely additive:
/// props never change block types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prop {
    pub kind: u16,
    /// Packed local position (see [`super::position::pack`]).
    pub pos: u16,
    pub seed: u32,
}

/// A 32x32x32 cube of blocks, the unit of generation, caching and transfer.
///
/// Types and meta are flat arrays indexed by the packed local position
/// (`x | z << 5 | y << 10`), so a networked position is already an array
/// index. Each column also carries a derived surface cache (height and type
/// of its topmost non-air voxel) that is only trusted while `surface_valid`
/// is set; every type write clears it.
#[derive(Clone)]
pub struct Chunk {
    coord: ChunkCoord,
    types: Box<[u8; CHUNK_VOLUME]>,
    meta: Box<[u8; CHUNK_VOLUME]>,
    top_y: [u8; CHUNK_AREA],
    top_type: [u8; CHUNK_AREA],
    surface_valid: bool,
    props: Vec<Prop>,
    block_entities: BTreeMap<u16, EntityId>,
}

impl Chunk {
    /// An all-air chunk. The surface cache is valid from the start: every
    /// column is empty.
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            types: Box::new([0; CHUNK_VOLUME]),
            meta: Box::new([0; CHUNK_VOLUME]),
            top_y: [0; CHUNK_AREA],
            top_type: [0; CHUNK_AREA],
            surface_valid: true,
            props: Vec::new(),
            block_entities: BTreeMap::new(),
        }
    }

    /// Rebuild a chunk from raw dense planes (codec / persistence path).
    /// The surface cache starts stale.
    pub fn from_planes(
        coord: ChunkCoord,
        types: Box<[u8; CHUNK_VOLUME]>,
        meta: Box<[u8; CHUNK_VOLUME]>,
    ) -> Self {
        Self {
            coord,
            types,
            meta,
            top_y: [0; CHUNK_AREA],
            top_type: [0; CHUNK_AREA],
            surface_valid: false,
            props: Vec::new(),
            block_entities: BTreeMap::new(),
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn types(&self) -> &[u8; CHUNK_VOLUME] {
        &self.types
    }

    pub fn meta_plane(&self) -> &[u8; CHUNK_VOLUME] {
        &self.meta
    }

    // ── Derived surface cache ───────────────────────────────────────────

    pub fn is_surface_valid(&self) -> bool {
        self.surface_valid
    }

    /// Recompute the topmost non-air voxel of every column, scanning each
    /// column from the top down. Reads only the type plane; safe to repeat.
    pub fn rebuild_top_cache(&mut self) {
        for z in 0..CHUNK_SIZE as u8 {
            for x in 0..CHUNK_SIZE as u8 {
                let col = column(x, z);
                self.top_y[col] = 0;
                self.top_type[col] = BlockId::AIR.0;
                for y in (0..CHUNK_SIZE as u8).rev() {
                    let t = self.types[LocalPos { x, y, z }.index()];
                    if t != BlockId::AIR.0 {
                        self.top_y[col] = y;
                        self.top_type[col] = t;
                        break;
                    }
                }
            }
        }
        self.surface_valid = true;
    }

    /// Topmost non-air voxel of a column as `(y, type)`. `None` when the
    /// column is empty or the cache is stale.
    pub fn column_top(&self, x: u8, z: u8) -> Option<(u8, BlockId)> {
        if !self.surface_valid {
            return None;
        }
        let col = column(x, z);
        let t = BlockId(self.top_type[col]);
        if t.is_air() {
            None
        } else {
            Some((self.top_y[col], t))
        }
    }

    /// Copy of the surface cache, or `None` while it is stale.
    pub fn surface(&self) -> Option<SurfaceSnapshot> {
        self.surface_valid.then(|| SurfaceSnapshot {
            top_y: self.top_y,
            top_type: self.top_type,
        })
    }

    // ── Dense access ────────────────────────────────────────────────────

    #[inline]
    pub fn block(&self, pos: LocalPos) -> BlockId {
        BlockId(self.types[pos.index()])
    }

    #[inline]
    pub fn meta(&self, pos: LocalPos) -> u8 {
        self.meta[pos.index()]
    }

    #[inline]
    pub fn get(&self, pos: LocalPos) -> (BlockId, u8) {
        let i = pos.index();
        (BlockId(self.types[i]), self.meta[i])
    }

    /// Write type and meta. Always invalidates the surface cache.
    #[inline]
    pub fn set(&mut self, pos: LocalPos, block: BlockId, meta: u8) {
        let i = pos.index();
        self.types[i] = block.0;
        self.meta[i] = meta;
        self.surface_valid = false;
    }

    /// Write only the meta byte. The surface cache does not depend on meta.
    #[inline]
    pub fn set_meta(&mut self, pos: LocalPos, meta: u8) {
        self.meta[pos.index()] = meta;
    }

    /// True when every voxel is air.
    pub fn is_empty(&self) -> bool {
        self.types.iter().all(|t| *t == BlockId::AIR.0)
    }

    // ── Sidecars ────────────────────────────────────────────────────────

    pub fn add_prop(&mut self, prop: Prop) {
        self.props.push(prop);
    }

    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    /// Reference a block entity from a voxel. Returns the id it replaced.
    pub fn attach_entity(&mut self, pos: LocalPos, id: EntityId) -> Option<EntityId> {
        self.block_entities.insert(pos.pack(), id)
    }

    pub fn detach_entity(&mut self, pos: LocalPos) -> Option<EntityId> {
        self.block_entities.remove(&pos.pack())
    }

    pub fn entity_at(&self, pos: LocalPos) -> Option<EntityId> {
        self.block_entities.get(&pos.pack()).copied()
    }

    /// `(packed position, id)` pairs in packed-position order.
    pub fn entities(&self) -> impl Iterator<Item = (u16, EntityId)> + '_ {
        self.block_entities.iter().map(|(p, id)| (*p, *id))
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("coord", &self.coord)
            .field("surface_valid", &self.surface_valid)
            .field("props", &self.props.len())
            .field("block_entities", &self.block_entities.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk() -> Chunk {
        Chunk::new(ChunkCoord::new(0, 0, 0))
    }

    #[test]
    fn new_chunk_is_air_with_empty_columns() {
        let c = chunk();
        assert!(c.types().iter().all(|t| *t == 0));
        assert!(c.meta_plane().iter().all(|m| *m == 0));
        assert!(c.is_empty());
        assert!(c.is_surface_valid());
        let surface = c.surface().unwrap();
        assert!(surface.top_y.iter().all(|y| *y == 0));
        assert!(surface.top_type.iter().all(|t| *t == 0));
        assert_eq!(c.column_top(5, 9), None);
    }

    #[test]
    fn set_invalidates_and_rebuild_finds_top() {
        let mut c = chunk();
        c.set(LocalPos::new(3, 10, 4), BlockId::STONE, 7);
        assert!(!c.is_surface_valid());
        assert!(c.surface().is_none());
        assert_eq!(c.column_top(3, 4), None);

        c.rebuild_top_cache();
        assert_eq!(c.column_top(3, 4), Some((10, BlockId::STONE)));
        assert_eq!(c.get(LocalPos::new(3, 10, 4)), (BlockId::STONE, 7));
    }

    #[test]
    fn rebuild_skips_air_and_reports_highest() {
        let mut c = chunk();
        c.set(LocalPos::new(0, 2, 0), BlockId::STONE, 0);
        c.set(LocalPos::new(0, 20, 0), BlockId::WATER, 0);
        c.set(LocalPos::new(0, 31, 1), BlockId::GRASS, 0);
        c.rebuild_top_cache();
        assert_eq!(c.column_top(0, 0), Some((20, BlockId::WATER)));
        assert_eq!(c.column_top(0, 1), Some((31, BlockId::GRASS)));

        // Clearing the top voxel exposes the one below.
        c.set(LocalPos::new(0, 20, 0), BlockId::AIR, 0);
        c.rebuild_top_cache();
        assert_eq!(c.column_top(0, 0), Some((2, BlockId::STONE)));
    }

    #[test]
    fn set_meta_keeps_cache_valid() {
        let mut c = chunk();
        c.set_meta(LocalPos::new(1, 1, 1), 9);
        assert!(c.is_surface_valid());
        assert_eq!(c.meta(LocalPos::new(1, 1, 1)), 9);
    }

    #[test]
    fn from_planes_starts_stale() {
        let mut types = Box::new([0u8; CHUNK_VOLUME]);
        types[LocalPos::new(2, 5, 2).index()] = BlockId::DIRT.0;
        let mut c = Chunk::from_planes(ChunkCoord::default(), types, Box::new([0; CHUNK_VOLUME]));
        assert!(!c.is_surface_valid());
        c.rebuild_top_cache();
        assert_eq!(c.column_top(2, 2), Some((5, BlockId::DIRT)));
    }

    #[test]
    fn sidecars_are_owned_by_the_chunk() {
        let mut c = chunk();
        c.add_prop(Prop { kind: 1, pos: LocalPos::new(1, 2, 3).pack(), seed: 42 });
        assert_eq!(c.props().len(), 1);

        let mut ids: slotmap::SlotMap<EntityId, ()> = slotmap::SlotMap::with_key();
        let a = ids.insert(());
        let b = ids.insert(());
        let pos = LocalPos::new(4, 4, 4);
        assert_eq!(c.attach_entity(pos, a), None);
        assert_eq!(c.attach_entity(pos, b), Some(a));
        assert_eq!(c.entity_at(pos), Some(b));
        assert_eq!(c.entities().count(), 1);
        assert_eq!(c.detach_entity(pos), Some(b));
        assert_eq!(c.entity_at(pos), None);
    }
}
