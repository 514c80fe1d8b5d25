use glam::{Vec2, Vec4};
use prism_common::{INVALID_ID, is_valid_id};
use prism_kernel::{
    DeviceState, ObjectCore, ObjectKind, Parameterized, Ray, Severity, SurfaceHit, TypeFor,
    VolumeRay, World,
};
use std::sync::Arc;

use crate::sample::PixelSample;

pub const DEFAULT_BACKGROUND: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

/// What the renderer writes into the color channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Headlight diffuse shading with volume compositing.
    #[default]
    Default,
    PrimitiveId,
    ObjectId,
    InstanceId,
    /// World-space normal mapped to `[0, 1]`.
    Normal,
}

impl RenderMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::Default),
            "primitiveId" => Some(Self::PrimitiveId),
            "objectId" => Some(Self::ObjectId),
            "instanceId" => Some(Self::InstanceId),
            "normal" => Some(Self::Normal),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PrimitiveId => "primitiveId",
            Self::ObjectId => "objectId",
            Self::InstanceId => "instanceId",
            Self::Normal => "normal",
        }
    }
}

/// Turns primary rays into pixel samples against a committed [`World`].
///
/// Holds only its own settings; any number of worlds may be rendered with it.
#[derive(Debug)]
pub struct Renderer {
    core: ObjectCore,
    background: Vec4,
    ambient_radiance: f32,
    mode: RenderMode,
}

impl TypeFor for Renderer {
    const KIND: ObjectKind = ObjectKind::Renderer;
}

impl Renderer {
    pub fn new(device: &Arc<DeviceState>) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Renderer, "default", device),
            background: DEFAULT_BACKGROUND,
            ambient_radiance: 1.0,
            mode: RenderMode::Default,
        }
    }

    /// Renderer for a named subtype. Only `default` exists; anything else
    /// falls back to it.
    pub fn create(subtype: &str, device: &Arc<DeviceState>) -> Self {
        let renderer = Self::new(device);
        if subtype != "default" {
            renderer.core.report_message(
                Severity::Warning,
                format_args!("unknown renderer subtype '{subtype}', using 'default'"),
            );
        }
        renderer
    }

    pub fn commit(&mut self) {
        self.background = self.core.get_param_or("background", DEFAULT_BACKGROUND);
        self.ambient_radiance = self.core.get_param_or("ambientRadiance", 1.0f32);
        self.mode = match self.core.get_param::<String>("mode") {
            None => RenderMode::Default,
            Some(name) => RenderMode::parse(&name).unwrap_or_else(|| {
                self.core.report_message(
                    Severity::Warning,
                    format_args!("unknown render mode '{name}', using 'default'"),
                );
                RenderMode::Default
            }),
        };
    }

    pub fn background(&self) -> Vec4 {
        self.background
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn ambient_radiance(&self) -> f32 {
        self.ambient_radiance
    }

    /// Sample one primary ray. `screen` is the pixel position in `[0, 1]^2`.
    pub fn render_sample(&self, screen: Vec2, mut ray: Ray, world: &World) -> PixelSample {
        world.intersect_surfaces(&mut ray);

        // volumes only count up to the nearest opaque hit
        let mut vray = VolumeRay::from_ray(&ray);
        world.intersect_volumes(&mut vray);

        if ray.hit.is_none() && vray.volume.is_none() {
            return PixelSample::background(self.background());
        }

        let mut sample = PixelSample {
            color: self.shade_ray(screen, &ray, &vray, world),
            ..PixelSample::default()
        };
        if let Some(hit) = &ray.hit {
            sample.depth = hit.t;
            sample.prim_id = hit.prim_id;
            sample.obj_id = hit.object_id;
            sample.inst_id = hit.instance_id;
        } else if let Some(segment) = &vray.volume {
            sample.depth = segment.t.lower;
            sample.obj_id = segment.object_id;
            sample.inst_id = instance_id(world, vray.inst_index);
        }
        sample
    }

    /// Color for a ray whose surface hit (`ray.hit`) and volume segment
    /// (`vray.volume`) are already resolved. The volume lies in front of the
    /// surface, so it is composited over it.
    pub fn shade_ray(&self, _screen: Vec2, ray: &Ray, vray: &VolumeRay, world: &World) -> Vec4 {
        let behind = match &ray.hit {
            Some(hit) => self.shade_surface(ray, hit),
            None => self.background(),
        };

        let Some(segment) = &vray.volume else {
            return behind;
        };

        let front = match self.mode {
            RenderMode::ObjectId => id_color(segment.object_id),
            RenderMode::InstanceId => id_color(instance_id(world, vray.inst_index)),
            _ => segment.volume.color().extend(1.0),
        };
        let alpha = segment.volume.opacity(segment.t.length());
        over(front.truncate(), alpha, behind)
    }

    fn shade_surface(&self, ray: &Ray, hit: &SurfaceHit) -> Vec4 {
        match self.mode {
            RenderMode::Default => {
                let view = -ray.dir.normalize_or_zero();
                let facing = hit.normal.dot(view).abs();
                let rgb = hit.color.truncate() * facing * self.ambient_radiance;
                over(rgb, hit.color.w, self.background())
            }
            RenderMode::PrimitiveId => id_color(hit.prim_id),
            RenderMode::ObjectId => id_color(hit.object_id),
            RenderMode::InstanceId => id_color(hit.instance_id),
            RenderMode::Normal => (hit.normal * 0.5 + 0.5).extend(1.0),
        }
    }
}

impl Parameterized for Renderer {
    fn core(&self) -> &ObjectCore {
        &self.core
    }
}

/// Premultiplied "over": `rgb` with coverage `alpha` on top of `behind`.
fn over(rgb: glam::Vec3, alpha: f32, behind: Vec4) -> Vec4 {
    let rgb = rgb * alpha + behind.truncate() * (1.0 - alpha);
    rgb.extend(alpha + behind.w * (1.0 - alpha))
}

fn instance_id(world: &World, index: u32) -> u32 {
    world
        .instances()
        .get(index as usize)
        .map(|inst| if is_valid_id(inst.id()) { inst.id() } else { index })
        .unwrap_or(INVALID_ID)
}

/// Stable false color for an id; unset ids are black.
fn id_color(id: u32) -> Vec4 {
    if !is_valid_id(id) {
        return Vec4::new(0.0, 0.0, 0.0, 1.0);
    }
    let mut h = id.wrapping_mul(0x9e37_79b1);
    h ^= h >> 15;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    Vec4::new(
        (h & 0xff) as f32 / 255.0,
        ((h >> 8) & 0xff) as f32 / 255.0,
        ((h >> 16) & 0xff) as f32 / 255.0,
        1.0,
    )
}
