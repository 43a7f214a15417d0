//! Deterministic math utilities
//!
//! Re-exports glam with the engine's integer conventions:
//! - 8.8 fixed point for life, mana, attributes and damage
//! - 16-bit wrapping facing values (0 = north, 16384 = east)
//! - a seeded RNG so every simulation run reproduces

pub use glam::*;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Facing angle in 1/65536ths of a full turn.
pub type Facing = u16;

pub const FACE_NORTH: Facing = 0;
pub const FACE_EAST: Facing = 16384;
pub const FACE_SOUTH: Facing = 32768;
pub const FACE_WEST: Facing = 49152;

/// Half of a quadrant; the width of each side of a facing cone.
pub const QUADRANT_HALF: u16 = 8192;

/// 8.8 fixed point helpers.
pub const FP8_SHIFT: u32 = 8;
pub const FP8_ONE: i32 = 1 << FP8_SHIFT;

#[inline]
pub const fn int_to_fp8(value: i32) -> i32 {
    value.saturating_mul(FP8_ONE)
}

#[inline]
pub const fn fp8_to_int(value: i32) -> i32 {
    value >> FP8_SHIFT
}

#[inline]
pub fn fp8_mul(a: i32, b: i32) -> i32 {
    let wide = (a as i64 * b as i64) >> FP8_SHIFT;
    wide.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Facing that points from the origin along `(dx, dy)`.
///
/// A zero vector yields [`FACE_NORTH`].
pub fn facing_from_vec(dx: f32, dy: f32) -> Facing {
    if !(dx.is_finite() && dy.is_finite()) || (dx == 0.0 && dy == 0.0) {
        return FACE_NORTH;
    }
    let turns = dx.atan2(dy) / TAU;
    ((turns * 65536.0).round() as i32 & 0xFFFF) as Facing
}

/// Unit vector for a facing value.
pub fn facing_to_vec(facing: Facing) -> Vec2 {
    let angle = facing as f32 / 65536.0 * TAU;
    Vec2::new(angle.sin(), angle.cos())
}

/// Signed shortest rotation from `from` to `to`.
#[inline]
pub fn facing_delta(from: Facing, to: Facing) -> i16 {
    to.wrapping_sub(from) as i16
}

/// Wraparound-aware cone test: is `facing` within `half_width` of `center`?
#[inline]
pub fn facing_within(facing: Facing, center: Facing, half_width: u16) -> bool {
    facing_delta(center, facing).unsigned_abs() <= half_width
}

/// Rotate `current` toward `desired` by at most `max_step`.
pub fn turn_toward(current: Facing, desired: Facing, max_step: u16) -> Facing {
    let delta = facing_delta(current, desired);
    let step = (delta.unsigned_abs()).min(max_step) as i32;
    let signed = if delta < 0 { -step } else { step };
    (current as i32 + signed).rem_euclid(65536) as Facing
}

/// Seeded pseudo-random source for the simulation.
#[derive(Debug, Clone)]
pub struct SimRng {
    seed: u64,
    inner: SmallRng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform value in `[0, span]`; a non-positive span yields 0.
    pub fn up_to(&mut self, span: i32) -> i32 {
        if span <= 0 {
            0
        } else {
            self.inner.gen_range(0..=span)
        }
    }

    /// Uniform value in `[low, high]` regardless of argument order.
    pub fn range(&mut self, low: i32, high: i32) -> i32 {
        let (lo, hi) = if low <= high { (low, high) } else { (high, low) };
        self.inner.gen_range(lo..=hi)
    }

    pub fn facing(&mut self) -> Facing {
        self.inner.gen()
    }

    pub fn next_u16(&mut self) -> u16 {
        self.inner.gen()
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinal_facings() {
        assert_eq!(facing_from_vec(0.0, 1.0), FACE_NORTH);
        assert_eq!(facing_from_vec(1.0, 0.0), FACE_EAST);
        assert_eq!(facing_from_vec(0.0, -1.0), FACE_SOUTH);
        assert_eq!(facing_from_vec(-1.0, 0.0), FACE_WEST);
    }

    #[test]
    fn cone_test_wraps() {
        assert!(facing_within(65000, 0, QUADRANT_HALF));
        assert!(facing_within(500, 0, QUADRANT_HALF));
        assert!(!facing_within(FACE_SOUTH, FACE_NORTH, QUADRANT_HALF));
        assert!(facing_within(FACE_SOUTH + 8000, FACE_SOUTH, QUADRANT_HALF));
    }

    #[test]
    fn fixed_point_round_trip() {
        assert_eq!(int_to_fp8(10), 2560);
        assert_eq!(fp8_to_int(2560), 10);
        assert_eq!(fp8_mul(int_to_fp8(3), int_to_fp8(2)), int_to_fp8(6));
    }

    #[test]
    fn turn_toward_takes_short_way() {
        assert_eq!(turn_toward(65000, 1000, 100), 65100);
        assert_eq!(turn_toward(1000, 65000, 100), 900);
        assert_eq!(turn_toward(0, 50, 100), 50);
    }

    #[test]
    fn seeded_rng_reproduces() {
        let mut a = SimRng::new(7);
        let mut b = SimRng::new(7);
        for _ in 0..16 {
            assert_eq!(a.range(-5, 5), b.range(-5, 5));
        }
        assert_eq!(a.up_to(0), 0);
    }
}
