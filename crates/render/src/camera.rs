use glam::{Vec2, Vec3};
use prism_kernel::{DeviceState, ObjectCore, ObjectKind, Parameterized, Ray, Severity, TypeFor};
use std::f32::consts::FRAC_PI_3;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Generates primary rays for screen positions in `[0, 1]^2`, origin at the
/// bottom-left of the image.
#[derive(Debug)]
pub struct Camera {
    core: ObjectCore,
    projection: Projection,
    position: Vec3,
    dir: Vec3,
    du: Vec3,
    dv: Vec3,
    // perspective: direction to the (0, 0) corner; orthographic: its origin
    corner: Vec3,
}

impl TypeFor for Camera {
    const KIND: ObjectKind = ObjectKind::Camera;
}

impl Camera {
    pub fn new(subtype: &str, device: &Arc<DeviceState>) -> Self {
        let projection = match subtype {
            "perspective" => Projection::Perspective,
            "orthographic" => Projection::Orthographic,
            other => {
                tracing::warn!(subtype = other, "unknown camera subtype, using perspective");
                Projection::Perspective
            }
        };
        let name = match projection {
            Projection::Perspective => "perspective",
            Projection::Orthographic => "orthographic",
        };
        let mut camera = Self {
            core: ObjectCore::new(ObjectKind::Camera, name, device),
            projection,
            position: Vec3::ZERO,
            dir: Vec3::NEG_Z,
            du: Vec3::ZERO,
            dv: Vec3::ZERO,
            corner: Vec3::ZERO,
        };
        camera.commit();
        camera
    }

    pub fn perspective(device: &Arc<DeviceState>) -> Self {
        Self::new("perspective", device)
    }

    pub fn orthographic(device: &Arc<DeviceState>) -> Self {
        Self::new("orthographic", device)
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn commit(&mut self) {
        self.position = self.core.get_param_or("position", Vec3::ZERO);
        self.dir = self
            .core
            .get_param_or("direction", Vec3::NEG_Z)
            .try_normalize()
            .unwrap_or_else(|| {
                self.core
                    .report_message(Severity::Warning, "zero camera direction, using -z");
                Vec3::NEG_Z
            });
        let up = self.core.get_param_or("up", Vec3::Y);
        let aspect = self.core.get_param_or("aspect", 1.0f32);

        let right = self.dir.cross(up).try_normalize().unwrap_or_else(|| {
            self.core.report_message(
                Severity::Warning,
                "camera up is parallel to direction, picking another",
            );
            self.dir.any_orthonormal_vector()
        });
        let true_up = right.cross(self.dir);

        let (width, height) = match self.projection {
            Projection::Perspective => {
                let fovy = self.core.get_param_or("fovy", FRAC_PI_3);
                let h = 2.0 * (fovy * 0.5).tan();
                (h * aspect, h)
            }
            Projection::Orthographic => {
                let h = self.core.get_param_or("height", 1.0f32);
                (h * aspect, h)
            }
        };
        self.du = right * width;
        self.dv = true_up * height;
        self.corner = match self.projection {
            Projection::Perspective => self.dir - 0.5 * self.du - 0.5 * self.dv,
            Projection::Orthographic => self.position - 0.5 * self.du - 0.5 * self.dv,
        };
    }

    pub fn create_ray(&self, screen: Vec2) -> Ray {
        let offset = screen.x * self.du + screen.y * self.dv;
        match self.projection {
            Projection::Perspective => {
                Ray::new(self.position, (self.corner + offset).normalize())
            }
            Projection::Orthographic => Ray::new(self.corner + offset, self.dir),
        }
    }
}

impl Parameterized for Camera {
    fn core(&self) -> &ObjectCore {
        &self.core
    }
}
