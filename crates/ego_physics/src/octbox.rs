//! Octagonal bounding volumes
//!
//! An [`OctBox`] is an interval on each of five axes: x, y, the two
//! horizontal diagonals (`x + y` and `y - x`) and z. Cutting the corners of
//! an axis-aligned box this way gives an octagonal prism, which hugs round
//! characters far better than a square while staying a handful of
//! comparisons to test.

use glam::{Vec2, Vec3};
use ego_core::Bumper;

pub const AXES: usize = 5;
pub const AXIS_X: usize = 0;
pub const AXIS_Y: usize = 1;
pub const AXIS_XY: usize = 2;
pub const AXIS_YX: usize = 3;
pub const AXIS_Z: usize = 4;

/// Diagonal axes measure `x + y`, which stretches distances by √2.
const DIAGONAL_SCALE: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Project a vector onto the five axes.
#[inline]
pub fn project(v: Vec3) -> [f32; AXES] {
    [v.x, v.y, v.x + v.y, v.y - v.x, v.z]
}

/// World-space unit normal of an axis.
pub fn axis_normal(axis: usize) -> Vec3 {
    match axis {
        AXIS_X => Vec3::X,
        AXIS_Y => Vec3::Y,
        AXIS_XY => Vec3::new(DIAGONAL_SCALE, DIAGONAL_SCALE, 0.0),
        AXIS_YX => Vec3::new(-DIAGONAL_SCALE, DIAGONAL_SCALE, 0.0),
        _ => Vec3::Z,
    }
}

/// Convert a depth measured on `axis` to world units.
#[inline]
pub fn axis_to_world(axis: usize, depth: f32) -> f32 {
    if axis == AXIS_XY || axis == AXIS_YX {
        depth * DIAGONAL_SCALE
    } else {
        depth
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctBox {
    pub mins: [f32; AXES],
    pub maxs: [f32; AXES],
}

impl OctBox {
    /// Volume of a bumper standing at `pos`. Extents below `min_extent`
    /// (including NaN) are raised to it.
    pub fn from_bumper(pos: Vec3, bumper: &Bumper, min_extent: f32) -> Self {
        let size = sanitize_extent(bumper.size, min_extent);
        let size_big = sanitize_extent(bumper.size_big, min_extent);
        let height = sanitize_extent(bumper.height, min_extent);
        let center = project(pos);
        Self {
            mins: [
                center[AXIS_X] - size,
                center[AXIS_Y] - size,
                center[AXIS_XY] - size_big,
                center[AXIS_YX] - size_big,
                pos.z,
            ],
            maxs: [
                center[AXIS_X] + size,
                center[AXIS_Y] + size,
                center[AXIS_XY] + size_big,
                center[AXIS_YX] + size_big,
                pos.z + height,
            ],
        }
    }

    /// Volume around a point with a radius, used for particles.
    pub fn from_sphere(pos: Vec3, radius: f32, min_extent: f32) -> Self {
        let radius = sanitize_extent(radius, min_extent);
        let diagonal = radius * std::f32::consts::SQRT_2;
        let center = project(pos);
        let extent = [radius, radius, diagonal, diagonal, radius];
        let mut mins = center;
        let mut maxs = center;
        for axis in 0..AXES {
            mins[axis] -= extent[axis];
            maxs[axis] += extent[axis];
        }
        Self { mins, maxs }
    }

    /// Volume of a tile column between `min` and `max` on the ground plane.
    pub fn from_tile(min: Vec2, max: Vec2) -> Self {
        Self {
            mins: [min.x, min.y, min.x + min.y, min.y - max.x, f32::MIN],
            maxs: [max.x, max.y, max.x + max.y, max.y - min.x, f32::MAX],
        }
    }

    pub fn translate(&self, delta: Vec3) -> Self {
        let offset = project(delta);
        let mut moved = *self;
        for axis in 0..AXES {
            moved.mins[axis] += offset[axis];
            moved.maxs[axis] += offset[axis];
        }
        moved
    }

    pub fn union(&self, other: &OctBox) -> Self {
        let mut merged = *self;
        for axis in 0..AXES {
            merged.mins[axis] = merged.mins[axis].min(other.mins[axis]);
            merged.maxs[axis] = merged.maxs[axis].max(other.maxs[axis]);
        }
        merged
    }

    /// Everything the box touches while moving by `vel` over one tick.
    pub fn swept(&self, vel: Vec3) -> Self {
        self.union(&self.translate(vel))
    }

    pub fn overlaps(&self, other: &OctBox) -> bool {
        (0..AXES).all(|axis| self.mins[axis] <= other.maxs[axis] && other.mins[axis] <= self.maxs[axis])
    }

    /// Horizontal-only overlap (ignores z).
    pub fn overlaps_xy(&self, other: &OctBox) -> bool {
        (0..AXIS_Z).all(|axis| self.mins[axis] <= other.maxs[axis] && other.mins[axis] <= self.maxs[axis])
    }

    /// Interpenetration on each axis; negative means separated.
    pub fn overlap_depths(&self, other: &OctBox) -> [f32; AXES] {
        let mut depths = [0.0; AXES];
        for (axis, depth) in depths.iter_mut().enumerate() {
            *depth = self.maxs[axis].min(other.maxs[axis]) - self.mins[axis].max(other.mins[axis]);
        }
        depths
    }

    /// Axis-aligned footprint on the ground plane as `(min, max)`.
    pub fn footprint(&self) -> (Vec2, Vec2) {
        (
            Vec2::new(self.mins[AXIS_X], self.mins[AXIS_Y]),
            Vec2::new(self.maxs[AXIS_X], self.maxs[AXIS_Y]),
        )
    }

    pub fn center(&self) -> [f32; AXES] {
        let mut center = [0.0; AXES];
        for (axis, value) in center.iter_mut().enumerate() {
            *value = 0.5 * (self.mins[axis] + self.maxs[axis]);
        }
        center
    }
}

fn sanitize_extent(value: f32, min_extent: f32) -> f32 {
    if value.is_finite() {
        value.max(min_extent)
    } else {
        min_extent
    }
}

/// Time interval within `[0, 1]` during which `a` moving with `va` and `b`
/// moving with `vb` overlap on every axis.
pub fn sweep_interval(a: &OctBox, va: Vec3, b: &OctBox, vb: Vec3) -> Option<(f32, f32)> {
    let relative = project(va - vb);
    let mut tmin = 0.0_f32;
    let mut tmax = 1.0_f32;
    for axis in 0..AXES {
        let speed = relative[axis];
        if !speed.is_finite() {
            return None;
        }
        if speed.abs() <= f32::EPSILON {
            if a.maxs[axis] < b.mins[axis] || b.maxs[axis] < a.mins[axis] {
                return None;
            }
            continue;
        }
        let mut t0 = (b.mins[axis] - a.maxs[axis]) / speed;
        let mut t1 = (b.maxs[axis] - a.mins[axis]) / speed;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        tmin = tmin.max(t0);
        tmax = tmax.min(t1);
        if tmin > tmax {
            return None;
        }
    }
    Some((tmin, tmax))
}
