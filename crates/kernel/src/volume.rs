use crate::device::{DeviceState, ObjectKind, TypeFor};
use crate::object::{ObjectCore, Parameterized, SceneObject, Severity};
use glam::Vec3;
use parking_lot::RwLock;
use prism_common::{Aabb, INVALID_ID, Interval};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct VolumeState {
    bounds: Aabb,
    color: Vec3,
    density: f32,
    id: u32,
}

impl Default for VolumeState {
    fn default() -> Self {
        Self {
            bounds: Aabb::empty(),
            color: Vec3::ONE,
            density: 1.0,
            id: INVALID_ID,
        }
    }
}

/// `homogeneous` volume: constant color and density inside an axis-aligned box.
#[derive(Debug)]
pub struct Volume {
    core: ObjectCore,
    state: RwLock<VolumeState>,
}

impl TypeFor for Volume {
    const KIND: ObjectKind = ObjectKind::Volume;
}

impl Volume {
    pub fn new(device: &Arc<DeviceState>) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Volume, "homogeneous", device),
            state: RwLock::new(VolumeState::default()),
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.state.read().bounds
    }

    pub fn color(&self) -> Vec3 {
        self.state.read().color
    }

    pub fn density(&self) -> f32 {
        self.state.read().density
    }

    pub fn id(&self) -> u32 {
        self.state.read().id
    }

    /// Interval of `t` the ray spends inside the volume.
    pub fn intersect(&self, org: Vec3, dir: Vec3, t: Interval) -> Option<Interval> {
        self.bounds().intersect_ray(org, dir, t)
    }

    /// Accumulated opacity over a segment of the given length (Beer-Lambert).
    pub fn opacity(&self, length: f32) -> f32 {
        1.0 - (-self.density() * length.max(0.0)).exp()
    }
}

impl Parameterized for Volume {
    fn core(&self) -> &ObjectCore {
        &self.core
    }
}

impl SceneObject for Volume {
    fn commit(&self) {
        let min = self.core.get_param::<Vec3>("bounds.min");
        let max = self.core.get_param::<Vec3>("bounds.max");
        let bounds = match (min, max) {
            (Some(min), Some(max)) => Aabb::new(min, max),
            _ => {
                self.core.report_message(
                    Severity::Warning,
                    "missing required parameters 'bounds.min'/'bounds.max'",
                );
                Aabb::empty()
            }
        };
        let density = self.core.get_param_or("density", 1.0f32);
        if density < 0.0 {
            self.core.report_message(
                Severity::Warning,
                format_args!("negative density {density} treated as 0"),
            );
        }
        *self.state.write() = VolumeState {
            bounds,
            color: self.core.get_param_or("color", Vec3::ONE),
            density: density.max(0.0),
            id: self.core.get_param_or("id", INVALID_ID),
        };
    }

    fn is_valid(&self) -> bool {
        !self.state.read().bounds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(device: &Arc<DeviceState>) -> Volume {
        let v = Volume::new(device);
        v.set_param("bounds.min", Vec3::ZERO);
        v.set_param("bounds.max", Vec3::ONE);
        v.set_param("density", 2.0f32);
        v.commit();
        v
    }

    #[test]
    fn missing_bounds_is_invalid() {
        let device = DeviceState::new();
        let v = Volume::new(&device);
        v.commit();
        assert!(!v.is_valid());
    }

    #[test]
    fn intersect_reports_segment() {
        let device = DeviceState::new();
        let v = unit_box(&device);
        let seg = v
            .intersect(Vec3::new(0.5, 0.5, -1.0), Vec3::Z, Interval::positive())
            .unwrap();
        assert!((seg.lower - 1.0).abs() < 1e-5);
        assert!((seg.upper - 2.0).abs() < 1e-5);
    }

    #[test]
    fn opacity_grows_with_length() {
        let device = DeviceState::new();
        let v = unit_box(&device);
        assert_eq!(v.opacity(0.0), 0.0);
        assert!(v.opacity(0.5) < v.opacity(1.0));
        assert!(v.opacity(100.0) > 0.999);
    }
}
