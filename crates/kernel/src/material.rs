use crate::device::{DeviceState, ObjectKind, TypeFor};
use crate::object::{ObjectCore, Parameterized, SceneObject, Severity};
use glam::{Vec3, Vec4};
use parking_lot::RwLock;
use std::sync::Arc;

pub const DEFAULT_MATERIAL_COLOR: Vec3 = Vec3::splat(0.8);

/// `matte` material: flat color and opacity.
#[derive(Debug)]
pub struct Material {
    core: ObjectCore,
    color: RwLock<Vec4>,
}

impl TypeFor for Material {
    const KIND: ObjectKind = ObjectKind::Material;
}

impl Material {
    pub fn new(device: &Arc<DeviceState>) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Material, "matte", device),
            color: RwLock::new(DEFAULT_MATERIAL_COLOR.extend(1.0)),
        }
    }

    /// Committed color in rgb, opacity in a.
    pub fn color(&self) -> Vec4 {
        *self.color.read()
    }
}

impl Parameterized for Material {
    fn core(&self) -> &ObjectCore {
        &self.core
    }
}

impl SceneObject for Material {
    fn commit(&self) {
        let color = self.core.get_param_or("color", DEFAULT_MATERIAL_COLOR);
        let opacity = self.core.get_param_or("opacity", 1.0f32);
        if !(0.0..=1.0).contains(&opacity) {
            self.core.report_message(
                Severity::Warning,
                format_args!("opacity {opacity} clamped to [0, 1]"),
            );
        }
        *self.color.write() = color.extend(opacity.clamp(0.0, 1.0));
    }
}
