//! Neighbour iteration and packed-index access for in-chunk voxels.
//!
//! Neighbours that would fall outside the chunk are skipped; crossing into
//! adjacent chunks goes through [`super::World`] with world coordinates.

use super::block::BlockId;
use super::chunk::{Chunk, CHUNK_VOLUME};
use super::position::{unpack, LocalPos};

const FACE_OFFSETS: [(i8, i8, i8); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

fn offset(pos: LocalPos, (dx, dy, dz): (i8, i8, i8)) -> Option<LocalPos> {
    let x = pos.x.checked_add_signed(dx)?;
    let y = pos.y.checked_add_signed(dy)?;
    let z = pos.z.checked_add_signed(dz)?;
    LocalPos::try_new(x, y, z)
}

/// The up-to-six face-adjacent neighbours of `pos` inside the chunk.
pub fn face_neighbors(pos: LocalPos) -> impl Iterator<Item = LocalPos> {
    FACE_OFFSETS.into_iter().filter_map(move |d| offset(pos, d))
}

/// The up-to-26 neighbours (faces, edges, corners) of `pos` inside the chunk.
pub fn all_neighbors(pos: LocalPos) -> impl Iterator<Item = LocalPos> {
    (-1i8..=1)
        .flat_map(|dy| (-1i8..=1).flat_map(move |dz| (-1i8..=1).map(move |dx| (dx, dy, dz))))
        .filter(|d| *d != (0, 0, 0))
        .filter_map(move |d| offset(pos, d))
}

impl Chunk {
    /// Block type at a packed position. Panics past the chunk volume.
    #[inline]
    pub fn block_at_index(&self, packed: u16) -> BlockId {
        self.block(unpack(packed))
    }

    /// Write through a packed position, with the same invalidation as `set`.
    #[inline]
    pub fn set_at_index(&mut self, packed: u16, block: BlockId, meta: u8) {
        self.set(unpack(packed), block, meta);
    }

    /// Non-air voxels as `(packed position, type)`, in index order.
    pub fn solid_voxels(&self) -> impl Iterator<Item = (u16, BlockId)> + '_ {
        self.types()
            .iter()
            .enumerate()
            .filter(|(_, t)| **t != BlockId::AIR.0)
            .map(|(i, t)| {
                debug_assert!(i < CHUNK_VOLUME);
                (i as u16, BlockId(*t))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::position::ChunkCoord;

    #[test]
    fn face_neighbor_counts() {
        assert_eq!(face_neighbors(LocalPos::new(5, 5, 5)).count(), 6);
        assert_eq!(face_neighbors(LocalPos::new(0, 0, 0)).count(), 3);
        assert_eq!(face_neighbors(LocalPos::new(31, 0, 15)).count(), 4);
    }

    #[test]
    fn all_neighbor_counts() {
        assert_eq!(all_neighbors(LocalPos::new(5, 5, 5)).count(), 26);
        assert_eq!(all_neighbors(LocalPos::new(0, 0, 0)).count(), 7);
        assert_eq!(all_neighbors(LocalPos::new(31, 31, 31)).count(), 7);
        assert_eq!(all_neighbors(LocalPos::new(0, 10, 10)).count(), 17);
    }

    #[test]
    fn face_neighbors_are_adjacent() {
        let center = LocalPos::new(10, 11, 12);
        for n in face_neighbors(center) {
            let d = (n.x as i32 - 10).abs() + (n.y as i32 - 11).abs() + (n.z as i32 - 12).abs();
            assert_eq!(d, 1);
        }
    }

    #[test]
    fn packed_access_matches_local_access() {
        let mut c = Chunk::new(ChunkCoord::default());
        let pos = LocalPos::new(7, 3, 9);
        c.set_at_index(pos.pack(), BlockId::DIRT, 2);
        assert_eq!(c.block(pos), BlockId::DIRT);
        assert_eq!(c.block_at_index(pos.pack()), BlockId::DIRT);
        assert!(!c.is_surface_valid());

        let solid: Vec<_> = c.solid_voxels().collect();
        assert_eq!(solid, vec![(pos.pack(), BlockId::DIRT)]);
    }
}
