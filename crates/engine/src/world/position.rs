use super::chunk::{CHUNK_SHIFT, CHUNK_SIZE, CHUNK_VOLUME};

const LOCAL_MASK: u16 = (CHUNK_SIZE as u16) - 1;

/// Absolute block position in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// The chunk this block belongs to (floor division by the chunk edge),
    /// or `None` when that chunk lies outside the i32 chunk space.
    pub fn try_chunk(&self) -> Option<ChunkCoord> {
        let axis = |v: i64| i32::try_from(v >> CHUNK_SHIFT).ok();
        Some(ChunkCoord {
            x: axis(self.x)?,
            y: axis(self.y)?,
            z: axis(self.z)?,
        })
    }

    /// The chunk this block belongs to.
    ///
    /// Panics when the position lies outside chunk space; use
    /// [`BlockPos::try_chunk`] for untrusted input.
    pub fn chunk(&self) -> ChunkCoord {
        match self.try_chunk() {
            Some(coord) => coord,
            None => panic!("block position {self:?} lies outside chunk space"),
        }
    }

    /// Position within the chunk.
    pub const fn local(&self) -> LocalPos {
        let mask = LOCAL_MASK as i64;
        LocalPos {
            x: (self.x & mask) as u8,
            y: (self.y & mask) as u8,
            z: (self.z & mask) as u8,
        }
    }
}

/// Chunk position in chunk space (one unit = one chunk edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// World position of local (0, 0, 0). Computed in i64 so it is total over
    /// the whole i32 chunk space.
    pub const fn origin(&self) -> BlockPos {
        BlockPos::new(
            (self.x as i64) << CHUNK_SHIFT,
            (self.y as i64) << CHUNK_SHIFT,
            (self.z as i64) << CHUNK_SHIFT,
        )
    }

    /// World position of a voxel inside this chunk.
    pub const fn block(&self, local: LocalPos) -> BlockPos {
        let o = self.origin();
        BlockPos::new(
            o.x + local.x as i64,
            o.y + local.y as i64,
            o.z + local.z as i64,
        )
    }
}

/// Block position local to a chunk, every axis in `0..CHUNK_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl LocalPos {
    /// Panics if any axis is outside the chunk. Out-of-range local
    /// coordinates are a caller bug, never clamped.
    pub fn new(x: u8, y: u8, z: u8) -> Self {
        match Self::try_new(x, y, z) {
            Some(pos) => pos,
            None => panic!("local position ({x}, {y}, {z}) outside chunk of edge {CHUNK_SIZE}"),
        }
    }

    pub const fn try_new(x: u8, y: u8, z: u8) -> Option<Self> {
        let s = CHUNK_SIZE as u8;
        if x < s && y < s && z < s {
            Some(Self { x, y, z })
        } else {
            None
        }
    }

    /// Packed 16-bit form. Identical to the dense-array index.
    #[inline]
    pub const fn pack(self) -> u16 {
        pack(self.x, self.y, self.z)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.pack() as usize
    }
}

/// Layout: `x | z << 5 | y << 10`. Frozen under `codec::LAYOUT_VERSION`;
/// changing it invalidates every stored and networked chunk.
#[inline]
pub const fn pack(x: u8, y: u8, z: u8) -> u16 {
    debug_assert!((x as usize) < CHUNK_SIZE && (y as usize) < CHUNK_SIZE && (z as usize) < CHUNK_SIZE);
    (x as u16) | ((z as u16) << CHUNK_SHIFT) | ((y as u16) << (2 * CHUNK_SHIFT))
}

/// Inverse of [`pack`]. Panics on values at or beyond the chunk volume.
#[inline]
pub fn unpack(packed: u16) -> LocalPos {
    assert!(
        (packed as usize) < CHUNK_VOLUME,
        "packed position {packed} outside chunk volume"
    );
    LocalPos {
        x: (packed & LOCAL_MASK) as u8,
        z: ((packed >> CHUNK_SHIFT) & LOCAL_MASK) as u8,
        y: ((packed >> (2 * CHUNK_SHIFT)) & LOCAL_MASK) as u8,
    }
}

/// Dense-array index of a local voxel. Always equal to `pack(x, y, z)`.
#[inline]
pub const fn index(x: u8, y: u8, z: u8) -> usize {
    pack(x, y, z) as usize
}

/// Column index into the per-column surface cache (`x + z * S`).
#[inline]
pub const fn column(x: u8, z: u8) -> usize {
    (x as usize) + (z as usize) * CHUNK_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_pos_splits_into_chunk_and_local() {
        let pos = BlockPos::new(-1, 33, 64);
        assert_eq!(pos.chunk(), ChunkCoord::new(-1, 1, 2));
        assert_eq!(pos.local(), LocalPos::new(31, 1, 0));
        assert_eq!(pos.chunk().block(pos.local()), pos);
    }

    #[test]
    fn origin_does_not_overflow_at_extremes() {
        let c = ChunkCoord::new(i32::MIN, i32::MAX, 0);
        let o = c.origin();
        assert_eq!(o.x, (i32::MIN as i64) * 32);
        assert_eq!(o.y, (i32::MAX as i64) * 32);
        assert_eq!(o.chunk(), c);
    }

    #[test]
    fn far_positions_have_no_chunk() {
        let far = BlockPos::new((1 << 40) + 5, 20, 0);
        assert_eq!(far.try_chunk(), None);
        assert_eq!(BlockPos::new(0, 0, i64::MIN).try_chunk(), None);

        // The last block of the last chunk still resolves.
        let edge = BlockPos::new(((i32::MAX as i64) << 5) + 31, 0, (i32::MIN as i64) << 5);
        assert_eq!(edge.try_chunk(), Some(ChunkCoord::new(i32::MAX, 0, i32::MIN)));
        assert_eq!(BlockPos::new((i32::MAX as i64 + 1) << 5, 0, 0).try_chunk(), None);
    }

    #[test]
    #[should_panic(expected = "outside chunk space")]
    fn chunk_panics_past_chunk_space() {
        let _ = BlockPos::new((1 << 40) + 5, 20, 0).chunk();
    }

    #[test]
    fn pack_layout_is_x_then_z_then_y() {
        assert_eq!(pack(1, 0, 0), 1);
        assert_eq!(pack(0, 0, 1), 32);
        assert_eq!(pack(0, 1, 0), 1024);
        assert_eq!(pack(31, 31, 31), (CHUNK_VOLUME - 1) as u16);
    }

    #[test]
    fn pack_unpack_inverse_over_whole_chunk() {
        for y in 0..CHUNK_SIZE as u8 {
            for z in 0..CHUNK_SIZE as u8 {
                for x in 0..CHUNK_SIZE as u8 {
                    let p = pack(x, y, z);
                    assert_eq!(unpack(p), LocalPos { x, y, z });
                    assert_eq!(p as usize, index(x, y, z));
                }
            }
        }
    }

    #[test]
    fn try_new_rejects_out_of_range() {
        assert!(LocalPos::try_new(32, 0, 0).is_none());
        assert!(LocalPos::try_new(0, 0, 31).is_some());
    }

    #[test]
    #[should_panic]
    fn new_panics_out_of_range() {
        let _ = LocalPos::new(0, 32, 0);
    }

    #[test]
    #[should_panic]
    fn unpack_panics_past_volume() {
        let _ = unpack(CHUNK_VOLUME as u16);
    }
}
