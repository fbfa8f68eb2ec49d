//! Hash-based value noise, sampled directly from world coordinates.
//!
//! There is no RNG state to walk, so two chunks that share an edge sample
//! the same lattice and agree along the seam.

use super::hash::{hash2, unit};

/// Quintic fade `6t^5 - 15t^4 + 10t^3`.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Smooth 2D value noise in `[0, 1]` with lattice cells of side `cell`
/// world blocks.
///
/// Panics if `cell` is not positive.
pub fn value_noise_2d(wx: i32, wz: i32, seed: u32, cell: i32) -> f64 {
    assert!(cell > 0, "noise cell size must be positive, got {cell}");

    let cx = wx.div_euclid(cell);
    let cz = wz.div_euclid(cell);
    let fx = wx.rem_euclid(cell) as f64 / cell as f64;
    let fz = wz.rem_euclid(cell) as f64 / cell as f64;

    let c00 = unit(hash2(seed, cx, cz));
    let c10 = unit(hash2(seed, cx.wrapping_add(1), cz));
    let c01 = unit(hash2(seed, cx, cz.wrapping_add(1)));
    let c11 = unit(hash2(seed, cx.wrapping_add(1), cz.wrapping_add(1)));

    let u = fade(fx);
    let v = fade(fz);
    lerp(lerp(c00, c10, u), lerp(c01, c11, u), v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_endpoints() {
        assert_eq!(fade(0.0), 0.0);
        assert_eq!(fade(1.0), 1.0);
        assert!((fade(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn output_stays_in_unit_range() {
        for wx in -200..200 {
            for wz in [-1000, -17, 0, 5, 999] {
                let n = value_noise_2d(wx, wz, 99, 16);
                assert!((0.0..=1.0).contains(&n), "noise {n} at ({wx}, {wz})");
            }
        }
    }

    #[test]
    fn lattice_points_equal_corner_hash() {
        let n = value_noise_2d(64, -32, 5, 32);
        assert_eq!(n, unit(hash2(5, 2, -1)));
    }

    #[test]
    fn continuous_across_cell_and_chunk_boundaries() {
        // Neighbouring samples never jump by more than a small step. With
        // corner values in [0,1] and quintic easing, the largest slope over
        // one block in a 8-block cell stays well below 0.5.
        for cell in [8, 16, 32] {
            for wx in -100..100 {
                let a = value_noise_2d(wx, 3, 1337, cell);
                let b = value_noise_2d(wx + 1, 3, 1337, cell);
                assert!((a - b).abs() < 0.5, "jump at wx={wx}, cell={cell}");
            }
        }
    }

    #[test]
    fn extreme_coordinates_are_total() {
        let n = value_noise_2d(i32::MAX, i32::MIN, 0, 32);
        assert!((0.0..=1.0).contains(&n));
    }

    #[test]
    #[should_panic]
    fn zero_cell_panics() {
        value_noise_2d(0, 0, 0, 0);
    }
}
