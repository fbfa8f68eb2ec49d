//! Deterministic integer hashing for seeds and noise lattices.
//!
//! Stable across versions and platforms: no process-local randomness, all
//! arithmetic is wrapping `u32`. Changing any constant here changes every
//! generated world.

const AXIS_X: u32 = 0x9e37_79b1;
const AXIS_Y: u32 = 0x85eb_ca6b;
const AXIS_Z: u32 = 0xc2b2_ae35;

/// Avalanche a 32-bit value (xor-shift / multiply / xor-shift finalizer).
#[inline]
pub const fn hash32(mut x: u32) -> u32 {
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Hash of a 2D lattice point (x, z) under `seed`.
#[inline]
pub const fn hash2(seed: u32, x: i32, z: i32) -> u32 {
    let mut h = seed;
    h ^= (x as u32).wrapping_mul(AXIS_X);
    h ^= (z as u32).wrapping_mul(AXIS_Y);
    hash32(h)
}

/// Hash of a 3D lattice point under `seed`.
#[inline]
pub const fn hash3(seed: u32, x: i32, y: i32, z: i32) -> u32 {
    let mut h = seed;
    h ^= (x as u32).wrapping_mul(AXIS_X);
    h ^= (y as u32).wrapping_mul(AXIS_Y);
    h ^= (z as u32).wrapping_mul(AXIS_Z);
    hash32(h)
}

/// Map a hash to `[0, 1)` using its upper 24 bits (exactly representable
/// in an `f64` mantissa).
#[inline]
pub fn unit(h: u32) -> f64 {
    (h >> 8) as f64 / (1u32 << 24) as f64
}
