use crate::device::{DeviceState, ObjectKind, TypeFor};
use crate::group::Group;
use crate::handle::{ObjectRef, ObjectView};
use crate::object::{ObjectCore, Parameterized, SceneObject, Severity};
use crate::ray::{Ray, VolumeRay};
use glam::Mat4;
use parking_lot::RwLock;
use prism_common::{Aabb, INVALID_ID, ObjectId, is_valid_id};
use std::sync::Arc;

#[derive(Debug)]
struct InstanceState {
    group: Option<Arc<Group>>,
    xfm: Mat4,
    inv_xfm: Mat4,
    normal_xfm: Mat4,
    id: u32,
}

impl Default for InstanceState {
    fn default() -> Self {
        Self {
            group: None,
            xfm: Mat4::IDENTITY,
            inv_xfm: Mat4::IDENTITY,
            normal_xfm: Mat4::IDENTITY,
            id: INVALID_ID,
        }
    }
}

/// A group placed in the world with a transform and a user id.
#[derive(Debug)]
pub struct Instance {
    core: ObjectCore,
    state: RwLock<InstanceState>,
}

impl TypeFor for Instance {
    const KIND: ObjectKind = ObjectKind::Instance;
}

impl Instance {
    pub fn new(device: &Arc<DeviceState>) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Instance, "transform", device),
            state: RwLock::new(InstanceState::default()),
        }
    }

    /// Group bound at the last commit, readable while this instance is
    /// borrowed.
    pub fn group(&self) -> Option<ObjectView<'_, Group>> {
        self.state.read().group.clone().map(ObjectView::new)
    }

    /// User `id`, or the unset sentinel.
    pub fn id(&self) -> u32 {
        self.state.read().id
    }

    pub fn transform(&self) -> Mat4 {
        self.state.read().xfm
    }

    /// World-space bounds of the bound group.
    pub fn bounds(&self) -> Aabb {
        let state = self.state.read();
        state
            .group
            .as_ref()
            .map(|g| g.bounds().transformed(&state.xfm))
            .unwrap_or_default()
    }

    /// Surface intersection in instance space; on a hit the ray records this
    /// instance's `index` and id.
    pub fn intersect_surfaces(&self, ray: &mut Ray, index: u32) -> bool {
        let state = self.state.read();
        let Some(group) = state.group.as_ref() else {
            return false;
        };
        let mut local = ray.transformed(&state.inv_xfm);
        if !group.intersect_surfaces(&mut local) {
            return false;
        }
        let Some(mut hit) = local.hit else {
            return false;
        };
        hit.normal = state
            .normal_xfm
            .transform_vector3(hit.normal)
            .normalize_or_zero();
        hit.instance_index = index;
        hit.instance_id = if is_valid_id(state.id) { state.id } else { index };
        ray.t.upper = local.t.upper;
        ray.hit = Some(hit);
        true
    }

    /// Volume intersection in instance space. Returns true if the group found
    /// or improved `ray.volume`.
    pub fn intersect_volumes(&self, ray: &mut VolumeRay) -> bool {
        let state = self.state.read();
        let Some(group) = state.group.as_ref() else {
            return false;
        };
        let mut local = ray.transformed(&state.inv_xfm);
        if !group.intersect_volumes(&mut local) {
            return false;
        }
        ray.volume = local.volume;
        true
    }
}

/// Queries on an entry of `World::instances()`.
impl ObjectRef<Instance> {
    pub fn object_id(&self) -> ObjectId {
        self.get().core().id()
    }

    pub fn id(&self) -> u32 {
        self.get().id()
    }

    pub fn transform(&self) -> Mat4 {
        self.get().transform()
    }

    pub fn bounds(&self) -> Aabb {
        self.get().bounds()
    }

    pub fn group(&self) -> Option<ObjectView<'_, Group>> {
        self.get().group()
    }
}

impl Parameterized for Instance {
    fn core(&self) -> &ObjectCore {
        &self.core
    }
}

impl SceneObject for Instance {
    fn commit(&self) {
        let group = self.core.get_param::<Arc<Group>>("group");
        if group.is_none() {
            self.core
                .report_message(Severity::Warning, "missing required parameter 'group'");
        }

        let mut xfm = self.core.get_param_or("transform", Mat4::IDENTITY);
        if xfm.determinant().abs() < f32::EPSILON {
            self.core
                .report_message(Severity::Warning, "singular transform, using identity");
            xfm = Mat4::IDENTITY;
        }
        let inv_xfm = xfm.inverse();

        *self.state.write() = InstanceState {
            group,
            xfm,
            inv_xfm,
            normal_xfm: inv_xfm.transpose(),
            id: self.core.get_param_or("id", INVALID_ID),
        };
    }

    fn is_valid(&self) -> bool {
        self.state.read().group.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::ObjectArray;
    use crate::geometry::Geometry;
    use crate::surface::Surface;
    use glam::Vec3;

    fn unit_sphere_group(device: &Arc<DeviceState>) -> Arc<Group> {
        let g = Geometry::sphere(device);
        g.set_param("vertex.position", vec![Vec3::ZERO]);
        g.set_param("radius", 1.0f32);
        g.commit();
        let s = Surface::new(device);
        s.set_param("geometry", Arc::new(g));
        s.commit();
        let group = Group::new(device);
        group.set_param(
            "surface",
            Arc::new(ObjectArray::from_objects(device, [Arc::new(s)])),
        );
        group.commit();
        Arc::new(group)
    }

    #[test]
    fn instance_without_group_is_invalid() {
        let device = DeviceState::new();
        let inst = Instance::new(&device);
        inst.commit();
        assert!(!inst.is_valid());
        assert_eq!(inst.id(), INVALID_ID);
    }

    #[test]
    fn translated_instance_is_hit_in_world_space() {
        let device = DeviceState::new();
        let inst = Instance::new(&device);
        inst.set_param("group", unit_sphere_group(&device));
        inst.set_param("transform", Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)));
        inst.set_param("id", 9u32);
        inst.commit();

        let mut ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(inst.intersect_surfaces(&mut ray, 3));
        let hit = ray.hit.unwrap();
        assert!((hit.t - 4.0).abs() < 1e-4);
        assert_eq!(hit.instance_index, 3);
        assert_eq!(hit.instance_id, 9);
        assert!((hit.normal - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn unset_id_falls_back_to_index() {
        let device = DeviceState::new();
        let inst = Instance::new(&device);
        inst.set_param("group", unit_sphere_group(&device));
        inst.set_param("transform", Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0)));
        inst.commit();

        let mut ray = Ray::new(Vec3::ZERO, Vec3::Z);
        inst.intersect_surfaces(&mut ray, 2);
        assert_eq!(ray.hit.unwrap().instance_id, 2);
    }

    #[test]
    fn scaled_instance_keeps_world_t() {
        let device = DeviceState::new();
        let inst = Instance::new(&device);
        inst.set_param("group", unit_sphere_group(&device));
        inst.set_param(
            "transform",
            Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)) * Mat4::from_scale(Vec3::splat(2.0)),
        );
        inst.commit();

        let mut ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(inst.intersect_surfaces(&mut ray, 0));
        assert!((ray.hit.unwrap().t - 8.0).abs() < 1e-4);
        assert!((inst.bounds().max - Vec3::new(2.0, 2.0, 12.0)).length() < 1e-4);
    }

    #[test]
    fn singular_transform_falls_back_to_identity() {
        let device = DeviceState::new();
        let inst = Instance::new(&device);
        inst.set_param("group", unit_sphere_group(&device));
        inst.set_param("transform", Mat4::ZERO);
        inst.commit();
        assert_eq!(inst.transform(), Mat4::IDENTITY);
    }

    #[test]
    fn group_view_reads_bound_group() {
        let device = DeviceState::new();
        let group = unit_sphere_group(&device);
        let inst = Instance::new(&device);
        inst.set_param("group", group.clone());
        inst.commit();

        let view = inst.group().unwrap();
        assert!(view.is(&group));
        assert_eq!(view.surface_count(), 1);
        assert_eq!(view.object_id(), group.core().id());
    }
}
