//! Authoritative voxel chunk store.
//!
//! - [`world`]: chunk layout, indexing, and the concurrent [`world::World`]
//!   store that generates each chunk at most once.
//! - [`generation`]: integer hashing, value noise, and the ordered pass
//!   pipeline turning `(coord, seed)` into a chunk.
//! - [`codec`]: surface snapshot wire format, versioned chunk snapshots and
//!   delta batches.

pub mod codec;
pub mod generation;
pub mod world;
