use crate::device::{DeviceState, ObjectKind, TypeFor};
use crate::geometry::{Geometry, GeometryHit};
use crate::material::{DEFAULT_MATERIAL_COLOR, Material};
use crate::object::{ObjectCore, Parameterized, SceneObject, Severity};
use glam::{Vec3, Vec4};
use parking_lot::RwLock;
use prism_common::{Aabb, INVALID_ID, Interval};
use std::sync::Arc;

#[derive(Debug)]
struct SurfaceState {
    geometry: Option<Arc<Geometry>>,
    color: Vec4,
    id: u32,
}

/// Geometry paired with a material.
#[derive(Debug)]
pub struct Surface {
    core: ObjectCore,
    state: RwLock<SurfaceState>,
}

impl TypeFor for Surface {
    const KIND: ObjectKind = ObjectKind::Surface;
}

impl Surface {
    pub fn new(device: &Arc<DeviceState>) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Surface, "", device),
            state: RwLock::new(SurfaceState {
                geometry: None,
                color: DEFAULT_MATERIAL_COLOR.extend(1.0),
                id: INVALID_ID,
            }),
        }
    }

    pub fn geometry(&self) -> Option<Arc<Geometry>> {
        self.state.read().geometry.clone()
    }

    /// Material color captured at commit.
    pub fn color(&self) -> Vec4 {
        self.state.read().color
    }

    /// User `id`, or the unset sentinel.
    pub fn id(&self) -> u32 {
        self.state.read().id
    }

    pub fn bounds(&self) -> Aabb {
        self.geometry().map(|g| g.bounds()).unwrap_or_default()
    }

    pub fn intersect(&self, org: Vec3, dir: Vec3, t: Interval) -> Option<GeometryHit> {
        let state = self.state.read();
        state.geometry.as_ref()?.intersect(org, dir, t)
    }
}

impl Parameterized for Surface {
    fn core(&self) -> &ObjectCore {
        &self.core
    }
}

impl SceneObject for Surface {
    fn commit(&self) {
        let geometry = self.core.get_param::<Arc<Geometry>>("geometry");
        if geometry.is_none() {
            self.core
                .report_message(Severity::Warning, "missing required parameter 'geometry'");
        }
        let color = self
            .core
            .get_param::<Arc<Material>>("material")
            .map(|m| m.color())
            .unwrap_or(DEFAULT_MATERIAL_COLOR.extend(1.0));
        let id = self.core.get_param_or("id", INVALID_ID);
        *self.state.write() = SurfaceState {
            geometry,
            color,
            id,
        };
    }

    fn is_valid(&self) -> bool {
        self.state
            .read()
            .geometry
            .as_ref()
            .is_some_and(|g| g.is_valid())
    }
}
