//! Wire and storage formats.
//!
//! Three formats, all tied to the chunk layout:
//!
//! - **Surface snapshot**: exactly `2 * S^2` bytes, `top_y` then `top_type`,
//!   each row-major by `x + z * S`. No header; the length is the contract.
//! - **Chunk snapshot**: versioned header + type plane + meta plane,
//!   optionally deflated.
//! - **Delta batch**: versioned header + `(packed pos, type, meta)` edits for
//!   one chunk.
//!
//! Packed positions in every format equal dense-array indices. That
//! equivalence is frozen under [`LAYOUT_VERSION`]; any change to the chunk
//! edge or packing order must bump it.

use std::io::{self, Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

use crate::world::block::BlockId;
use crate::world::chunk::{Chunk, CHUNK_AREA, CHUNK_VOLUME};
use crate::world::position::{column, ChunkCoord};

/// Version of the packed-position / dense-layout contract.
pub const LAYOUT_VERSION: u8 = 1;

/// Exact byte length of a surface snapshot.
pub const SURFACE_BYTES: usize = 2 * CHUNK_AREA;

const CHUNK_MAGIC: [u8; 4] = *b"STRC";
const DELTA_MAGIC: [u8; 4] = *b"STRD";
/// magic(4) + version(1) + flags(1) + coord(12)
const CHUNK_HEADER: usize = 18;
/// magic(4) + version(1) + coord(12) + count(2)
const DELTA_HEADER: usize = 19;
const DELTA_EDIT: usize = 4;
const FLAG_DEFLATE: u8 = 0b0000_0001;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("surface payload is {0} bytes, expected {expected}", expected = SURFACE_BYTES)]
    SurfaceLength(usize),

    #[error("invalid magic bytes")]
    InvalidMagic,

    #[error("unsupported layout version {0} (this build reads {current})", current = LAYOUT_VERSION)]
    UnsupportedVersion(u8),

    #[error("truncated payload: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("trailing bytes: expected {expected} bytes, got {actual}")]
    TrailingBytes { expected: usize, actual: usize },

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("packed position {0} outside chunk volume")]
    PositionOutOfRange(u16),
}

// ── Surface snapshot ─────────────────────────────────────────────────────

/// Per-column top height and type for one chunk, as served to renderers.
#[derive(Clone, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    pub top_y: [u8; CHUNK_AREA],
    pub top_type: [u8; CHUNK_AREA],
}

impl SurfaceSnapshot {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SURFACE_BYTES);
        out.extend_from_slice(&self.top_y);
        out.extend_from_slice(&self.top_type);
        out
    }

    /// Parse a payload, rejecting anything that is not exactly
    /// [`SURFACE_BYTES`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != SURFACE_BYTES {
            return Err(CodecError::SurfaceLength(bytes.len()));
        }
        let mut top_y = [0; CHUNK_AREA];
        let mut top_type = [0; CHUNK_AREA];
        top_y.copy_from_slice(&bytes[..CHUNK_AREA]);
        top_type.copy_from_slice(&bytes[CHUNK_AREA..]);
        Ok(Self { top_y, top_type })
    }

    /// Height and type of a column. Unknown type codes are returned as-is;
    /// callers decide how to render them.
    pub fn block_at(&self, x: u8, z: u8) -> (u8, BlockId) {
        let col = column(x, z);
        (self.top_y[col], BlockId(self.top_type[col]))
    }
}

impl std::fmt::Debug for SurfaceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let solid = self.top_type.iter().filter(|t| **t != 0).count();
        f.debug_struct("SurfaceSnapshot")
            .field("solid_columns", &solid)
            .finish()
    }
}

// ── Chunk snapshot ───────────────────────────────────────────────────────

/// Serialize a chunk's dense planes. Sidecars are not part of the format.
/// Only the compressor can fail.
pub fn encode_chunk(chunk: &Chunk, deflate: bool) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(CHUNK_HEADER + 2 * CHUNK_VOLUME);
    out.extend_from_slice(&CHUNK_MAGIC);
    out.push(LAYOUT_VERSION);
    out.push(if deflate { FLAG_DEFLATE } else { 0 });
    write_coord(&mut out, chunk.coord());

    if deflate {
        let mut enc = ZlibEncoder::new(out, Compression::default());
        enc.write_all(chunk.types().as_slice())?;
        enc.write_all(chunk.meta_plane().as_slice())?;
        enc.finish()
    } else {
        out.extend_from_slice(chunk.types().as_slice());
        out.extend_from_slice(chunk.meta_plane().as_slice());
        Ok(out)
    }
}

/// Parse a chunk snapshot. The returned chunk's surface cache is stale.
pub fn decode_chunk(bytes: &[u8]) -> Result<Chunk, CodecError> {
    check_len(bytes, CHUNK_HEADER)?;
    if bytes[..4] != CHUNK_MAGIC {
        return Err(CodecError::InvalidMagic);
    }
    if bytes[4] != LAYOUT_VERSION {
        return Err(CodecError::UnsupportedVersion(bytes[4]));
    }
    let flags = bytes[5];
    let coord = read_coord(&bytes[6..18]);
    let body = &bytes[CHUNK_HEADER..];

    let planes = if flags & FLAG_DEFLATE != 0 {
        let mut raw = Vec::with_capacity(2 * CHUNK_VOLUME);
        ZlibDecoder::new(body)
            .take(2 * CHUNK_VOLUME as u64 + 1)
            .read_to_end(&mut raw)
            .map_err(|e| CodecError::Decompress(e.to_string()))?;
        raw
    } else {
        body.to_vec()
    };
    check_exact(planes.len(), 2 * CHUNK_VOLUME)?;

    let mut types = Box::new([0u8; CHUNK_VOLUME]);
    let mut meta = Box::new([0u8; CHUNK_VOLUME]);
    types.copy_from_slice(&planes[..CHUNK_VOLUME]);
    meta.copy_from_slice(&planes[CHUNK_VOLUME..]);
    Ok(Chunk::from_planes(coord, types, meta))
}

// ── Delta batch ──────────────────────────────────────────────────────────

/// One voxel write inside a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEdit {
    pub pos: u16,
    pub block: BlockId,
    pub meta: u8,
}

/// A batch of edits to a single chunk, applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaBatch {
    pub coord: ChunkCoord,
    pub edits: Vec<BlockEdit>,
}

impl DeltaBatch {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            edits: Vec::new(),
        }
    }

    pub fn push(&mut self, pos: u16, block: BlockId, meta: u8) {
        self.edits.push(BlockEdit { pos, block, meta });
    }

    /// Encode the batch. Batches longer than `u16::MAX` edits must be split
    /// by the caller.
    pub fn encode(&self) -> Vec<u8> {
        assert!(self.edits.len() <= u16::MAX as usize, "delta batch too long");
        let mut out = Vec::with_capacity(DELTA_HEADER + DELTA_EDIT * self.edits.len());
        out.extend_from_slice(&DELTA_MAGIC);
        out.push(LAYOUT_VERSION);
        write_coord(&mut out, self.coord);
        out.extend_from_slice(&(self.edits.len() as u16).to_le_bytes());
        for edit in &self.edits {
            out.extend_from_slice(&edit.pos.to_le_bytes());
            out.push(edit.block.0);
            out.push(edit.meta);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        check_len(bytes, DELTA_HEADER)?;
        if bytes[..4] != DELTA_MAGIC {
            return Err(CodecError::InvalidMagic);
        }
        if bytes[4] != LAYOUT_VERSION {
            return Err(CodecError::UnsupportedVersion(bytes[4]));
        }
        let coord = read_coord(&bytes[5..17]);
        let count = u16::from_le_bytes([bytes[17], bytes[18]]) as usize;
        check_exact(bytes.len(), DELTA_HEADER + DELTA_EDIT * count)?;

        let edits = bytes[DELTA_HEADER..DELTA_HEADER + DELTA_EDIT * count]
            .chunks_exact(DELTA_EDIT)
            .map(|e| {
                let pos = u16::from_le_bytes([e[0], e[1]]);
                if pos as usize >= CHUNK_VOLUME {
                    return Err(CodecError::PositionOutOfRange(pos));
                }
                Ok(BlockEdit {
                    pos,
                    block: BlockId(e[2]),
                    meta: e[3],
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { coord, edits })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn check_len(bytes: &[u8], expected: usize) -> Result<(), CodecError> {
    if bytes.len() < expected {
        return Err(CodecError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

fn check_exact(actual: usize, expected: usize) -> Result<(), CodecError> {
    match actual.cmp(&expected) {
        std::cmp::Ordering::Less => Err(CodecError::Truncated { expected, actual }),
        std::cmp::Ordering::Greater => Err(CodecError::TrailingBytes { expected, actual }),
        std::cmp::Ordering::Equal => Ok(()),
    }
}

fn write_coord(out: &mut Vec<u8>, coord: ChunkCoord) {
    out.extend_from_slice(&coord.x.to_le_bytes());
    out.extend_from_slice(&coord.y.to_le_bytes());
    out.extend_from_slice(&coord.z.to_le_bytes());
}

fn read_coord(b: &[u8]) -> ChunkCoord {
    let at = |i: usize| i32::from_le_bytes([b[i], b[i + 1], b[i + 2], b[i + 3]]);
    ChunkCoord::new(at(0), at(4), at(8))
}
