//! The standard generation passes, in the order `Pipeline::standard` runs them.
//!
//! Heights and sea level are global block Y. Each pass only writes voxels
//! whose global Y falls inside the chunk being generated.

use super::hash::hash3;
use super::{world_xz, GenContext, Heightmap};
use crate::world::block::BlockId;
use crate::world::chunk::{Chunk, Prop, CHUNK_SIZE};
use crate::world::position::LocalPos;

/// Global Y up to which low columns are flooded.
pub const SEA_LEVEL: i32 = 12;

/// Thickness of the dirt band under the surface voxel.
pub const DIRT_DEPTH: i64 = 3;

/// Prop kind for a grass tuft.
pub const PROP_TUFT: u16 = 1;
/// One grass column in this many gets a tuft.
pub const PROP_RARITY: u32 = 16;
const PROP_SALT: u32 = 0x5EED_7F7F;

/// Surface voxel becomes grass, the next `DIRT_DEPTH` below become dirt,
/// everything deeper is stone. Voxels above the surface stay air.
pub fn stratify(chunk: &mut Chunk, heights: &Heightmap, _ctx: &GenContext) {
    let base_y = chunk.coord().origin().y;
    for z in 0..CHUNK_SIZE as u8 {
        for x in 0..CHUNK_SIZE as u8 {
            let h = heights.at(x, z) as i64;
            for y in 0..CHUNK_SIZE as u8 {
                let gy = base_y + y as i64;
                if gy > h {
                    break;
                }
                let block = match h - gy {
                    0 => BlockId::GRASS,
                    d if d <= DIRT_DEPTH => BlockId::DIRT,
                    _ => BlockId::STONE,
                };
                chunk.set(LocalPos { x, y, z }, block, 0);
            }
        }
    }
}

/// Flood every voxel strictly above the surface and up to `SEA_LEVEL`
/// (inclusive) with water, for columns below sea level.
pub fn water_fill(chunk: &mut Chunk, heights: &Heightmap, _ctx: &GenContext) {
    let base_y = chunk.coord().origin().y;
    let top_y = base_y + CHUNK_SIZE as i64;
    let sea = SEA_LEVEL as i64;
    for z in 0..CHUNK_SIZE as u8 {
        for x in 0..CHUNK_SIZE as u8 {
            let h = heights.at(x, z) as i64;
            if h >= sea {
                continue;
            }
            let lo = (h + 1).max(base_y);
            let hi = sea.min(top_y - 1);
            for gy in lo..=hi {
                let y = (gy - base_y) as u8;
                chunk.set(LocalPos { x, y, z }, BlockId::WATER, 0);
            }
        }
    }
}

/// Scatter grass tufts on exposed grass. Writes only the prop sidecar.
pub fn decorate(chunk: &mut Chunk, heights: &Heightmap, ctx: &GenContext) {
    let coord = chunk.coord();
    let base_y = coord.origin().y;
    for z in 0..CHUNK_SIZE as u8 {
        for x in 0..CHUNK_SIZE as u8 {
            let h = heights.at(x, z);
            let ly = h as i64 - base_y;
            // Needs the surface voxel and the one above it in this chunk.
            if !(0..CHUNK_SIZE as i64 - 1).contains(&ly) {
                continue;
            }
            let ly = ly as u8;
            if chunk.block(LocalPos { x, y: ly, z }) != BlockId::GRASS
                || !chunk.block(LocalPos { x, y: ly + 1, z }).is_air()
            {
                continue;
            }
            let (wx, wz) = world_xz(coord, x, z);
            let roll = hash3(ctx.seed ^ PROP_SALT, wx, h, wz);
            if roll % PROP_RARITY == 0 {
                chunk.add_prop(Prop {
                    kind: PROP_TUFT,
                    pos: LocalPos { x, y: ly + 1, z }.pack(),
                    seed: roll,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{generate, terrain_height};
    use crate::world::position::ChunkCoord;

    const SEED: u32 = 1337;

    fn column_blocks(chunk: &Chunk, x: u8, z: u8) -> Vec<BlockId> {
        (0..CHUNK_SIZE as u8).map(|y| chunk.block(LocalPos { x, y, z })).collect()
    }

    #[test]
    fn stratification_ordering() {
        let coord = ChunkCoord::new(0, 0, 0);
        let chunk = generate(coord, GenContext::new(SEED));
        for z in 0..CHUNK_SIZE as u8 {
            for x in 0..CHUNK_SIZE as u8 {
                let (wx, wz) = world_xz(coord, x, z);
                let h = terrain_height(wx, wz, SEED) as usize;
                let col = column_blocks(&chunk, x, z);
                assert_eq!(col[h], BlockId::GRASS, "surface at ({x},{z})");
                for y in h.saturating_sub(3)..h {
                    assert_eq!(col[y], BlockId::DIRT, "dirt at ({x},{y},{z})");
                }
                for y in 0..h.saturating_sub(3) {
                    assert_eq!(col[y], BlockId::STONE, "stone at ({x},{y},{z})");
                }
                for y in h + 1..CHUNK_SIZE {
                    let b = col[y];
                    assert!(b == BlockId::AIR || b == BlockId::WATER, "above surface at ({x},{y},{z})");
                }
            }
        }
    }

    #[test]
    fn water_fill_bound() {
        let coord = ChunkCoord::new(0, 0, 0);
        let chunk = generate(coord, GenContext::new(SEED));
        let sea = SEA_LEVEL as usize;
        let mut flooded_columns = 0;
        for z in 0..CHUNK_SIZE as u8 {
            for x in 0..CHUNK_SIZE as u8 {
                let (wx, wz) = world_xz(coord, x, z);
                let h = terrain_height(wx, wz, SEED) as usize;
                let col = column_blocks(&chunk, x, z);
                if h < sea {
                    flooded_columns += 1;
                    for y in h + 1..=sea {
                        assert_eq!(col[y], BlockId::WATER, "water at ({x},{y},{z})");
                    }
                }
                for y in (sea + 1).max(h + 1)..CHUNK_SIZE {
                    assert_eq!(col[y], BlockId::AIR, "air at ({x},{y},{z})");
                }
            }
        }
        assert!(flooded_columns > 0, "seed 1337 origin chunk has low ground");
    }

    #[test]
    fn chunk_above_terrain_is_air() {
        let chunk = generate(ChunkCoord::new(3, 1, -2), GenContext::new(SEED));
        assert!(chunk.is_empty());
        assert!(chunk.props().is_empty());
        assert_eq!(chunk.column_top(0, 0), None);
    }

    #[test]
    fn chunk_below_terrain_is_stone() {
        let chunk = generate(ChunkCoord::new(-5, -1, 8), GenContext::new(SEED));
        assert!(chunk.types().iter().all(|t| *t == BlockId::STONE.0));
        assert_eq!(chunk.column_top(4, 4), Some((31, BlockId::STONE)));
    }

    #[test]
    fn props_sit_on_grass_and_leave_grid_alone() {
        let ctx = GenContext::new(SEED);
        let mut with_props = 0;
        for cx in -2..2 {
            for cz in -2..2 {
                let chunk = generate(ChunkCoord::new(cx, 0, cz), ctx);
                for prop in chunk.props() {
                    let pos = crate::world::position::unpack(prop.pos);
                    assert_eq!(prop.kind, PROP_TUFT);
                    assert!(chunk.block(pos).is_air());
                    let below = LocalPos { x: pos.x, y: pos.y - 1, z: pos.z };
                    assert_eq!(chunk.block(below), BlockId::GRASS);
                    with_props += 1;
                }
            }
        }
        assert!(with_props > 0, "16 chunks should carry at least one tuft");
    }
}
