//! Interval and bounding-box helpers shared by rays, geometry and groups.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Closed parameter range `[lower, upper]` along a ray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f32,
    pub upper: f32,
}

impl Interval {
    pub const fn new(lower: f32, upper: f32) -> Self {
        Self { lower, upper }
    }

    /// `[0, +inf)`, the default extent of a primary ray.
    pub const fn positive() -> Self {
        Self::new(0.0, f32::INFINITY)
    }

    pub fn is_empty(&self) -> bool {
        !(self.lower <= self.upper)
    }

    pub fn contains(&self, t: f32) -> bool {
        t >= self.lower && t <= self.upper
    }

    pub fn length(&self) -> f32 {
        if self.is_empty() { 0.0 } else { self.upper - self.lower }
    }

    /// Intersection of two intervals (possibly empty).
    pub fn intersect(&self, other: &Interval) -> Interval {
        Interval::new(self.lower.max(other.lower), self.upper.min(other.upper))
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::positive()
    }
}

/// Axis-aligned bounding box. The default box is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extend_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn extend(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn union(mut self, other: &Aabb) -> Aabb {
        self.extend(other);
        self
    }

    /// Bounds of this box after an affine transform (all eight corners).
    pub fn transformed(&self, xfm: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let mut out = Aabb::empty();
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.extend_point(xfm.transform_point3(corner));
        }
        out
    }

    /// Slab test. Returns the sub-interval of `t` spent inside the box.
    pub fn intersect_ray(&self, org: Vec3, dir: Vec3, t: Interval) -> Option<Interval> {
        if self.is_empty() {
            return None;
        }
        let inv = dir.recip();
        let t0 = (self.min - org) * inv;
        let t1 = (self.max - org) * inv;

        let t_min = t0.min(t1).max_element().max(t.lower);
        let t_max = t0.max(t1).min_element().min(t.upper);

        if t_max >= t_min { Some(Interval::new(t_min, t_max)) } else { None }
    }
}
