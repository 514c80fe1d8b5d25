use crate::volume::Volume;
use glam::{Mat4, Vec3, Vec4};
use prism_common::{INVALID_ID, Interval};
use std::sync::Arc;

/// Nearest opaque surface hit recorded on a [`Ray`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub t: f32,
    /// World-space unit normal.
    pub normal: Vec3,
    /// Material color (rgb) and opacity (a).
    pub color: Vec4,
    pub prim_id: u32,
    /// Surface `id` parameter, or its index in the group when unset.
    pub object_id: u32,
    /// Position of the owning instance in `World::instances()`.
    pub instance_index: u32,
    /// Instance `id` parameter, or `instance_index` when unset.
    pub instance_id: u32,
}

impl SurfaceHit {
    pub(crate) fn local(t: f32, normal: Vec3, color: Vec4, prim_id: u32, object_id: u32) -> Self {
        Self {
            t,
            normal,
            color,
            prim_id,
            object_id,
            instance_index: INVALID_ID,
            instance_id: INVALID_ID,
        }
    }
}

/// A ray searching for the nearest surface hit within `t`.
///
/// Every accepted hit shrinks `t.upper`, so later tests only accept nearer hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub org: Vec3,
    pub dir: Vec3,
    pub t: Interval,
    pub hit: Option<SurfaceHit>,
}

impl Ray {
    pub fn new(org: Vec3, dir: Vec3) -> Self {
        Self {
            org,
            dir,
            t: Interval::positive(),
            hit: None,
        }
    }

    pub fn with_interval(mut self, t: Interval) -> Self {
        self.t = t;
        self
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.org + self.dir * t
    }

    /// Same ray in another space. The direction is not renormalized, so `t`
    /// values stay comparable across spaces.
    pub fn transformed(&self, xfm: &Mat4) -> Ray {
        Ray {
            org: xfm.transform_point3(self.org),
            dir: xfm.transform_vector3(self.dir),
            t: self.t,
            hit: None,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }
}

/// The volume a [`VolumeRay`] currently records and the interval spent in it.
#[derive(Debug, Clone)]
pub struct VolumeHit {
    pub volume: Arc<Volume>,
    pub t: Interval,
    /// Volume `id` parameter, or its index in the group when unset.
    pub object_id: u32,
}

/// Ray state accumulating the nearest volume along `t` across instances.
#[derive(Debug, Clone)]
pub struct VolumeRay {
    pub org: Vec3,
    pub dir: Vec3,
    pub t: Interval,
    pub volume: Option<VolumeHit>,
    /// Index into `World::instances()` of the instance owning `volume`.
    pub inst_index: u32,
}

impl VolumeRay {
    pub fn new(org: Vec3, dir: Vec3, t: Interval) -> Self {
        Self {
            org,
            dir,
            t,
            volume: None,
            inst_index: INVALID_ID,
        }
    }

    /// Volume ray spanning the extent a surface ray has left, i.e. clipped to
    /// its nearest hit.
    pub fn from_ray(ray: &Ray) -> Self {
        Self::new(ray.org, ray.dir, ray.t)
    }

    pub(crate) fn transformed(&self, xfm: &Mat4) -> VolumeRay {
        VolumeRay {
            org: xfm.transform_point3(self.org),
            dir: xfm.transform_vector3(self.dir),
            t: self.t,
            volume: self.volume.clone(),
            inst_index: self.inst_index,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.volume.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        assert_eq!(ray.at(5.0), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn transform_preserves_parameter() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let xfm = Mat4::from_scale(Vec3::splat(2.0));
        let local = ray.transformed(&xfm);
        // point at t=3 maps to the transformed point at the same t
        assert_eq!(local.at(3.0), xfm.transform_point3(ray.at(3.0)));
    }

    #[test]
    fn volume_ray_inherits_clipped_interval() {
        let mut ray = Ray::new(Vec3::ZERO, Vec3::Z);
        ray.t.upper = 4.0;
        let vray = VolumeRay::from_ray(&ray);
        assert_eq!(vray.t, Interval::new(0.0, 4.0));
        assert!(!vray.is_hit());
        assert_eq!(vray.inst_index, INVALID_ID);
    }
}
