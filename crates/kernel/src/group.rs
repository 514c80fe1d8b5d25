use crate::array::ObjectArray;
use crate::device::{DeviceState, ObjectKind, TypeFor};
use crate::handle::ObjectView;
use crate::object::{ObjectCore, Parameterized, SceneObject};
use crate::ray::{Ray, SurfaceHit, VolumeHit, VolumeRay};
use crate::surface::Surface;
use crate::volume::Volume;
use parking_lot::RwLock;
use prism_common::{Aabb, ObjectId, is_valid_id};
use std::sync::Arc;

#[derive(Debug, Default)]
struct GroupState {
    surfaces: Vec<Arc<Surface>>,
    volumes: Vec<Arc<Volume>>,
    bounds: Aabb,
}

/// A set of surfaces and volumes intersected as one unit.
///
/// Surfaces are tested linearly with per-surface bounds culling.
#[derive(Debug)]
pub struct Group {
    core: ObjectCore,
    state: RwLock<GroupState>,
}

impl TypeFor for Group {
    const KIND: ObjectKind = ObjectKind::Group;
}

impl Group {
    pub fn new(device: &Arc<DeviceState>) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Group, "", device),
            state: RwLock::new(GroupState::default()),
        }
    }

    /// Valid surfaces captured at the last commit.
    pub fn surfaces(&self) -> Vec<Arc<Surface>> {
        self.state.read().surfaces.clone()
    }

    pub fn volumes(&self) -> Vec<Arc<Volume>> {
        self.state.read().volumes.clone()
    }

    pub fn surface_count(&self) -> usize {
        self.state.read().surfaces.len()
    }

    pub fn volume_count(&self) -> usize {
        self.state.read().volumes.len()
    }

    pub fn bounds(&self) -> Aabb {
        self.state.read().bounds
    }

    /// Record the nearest surface hit inside `ray.t`. Returns true if the ray
    /// state was updated.
    pub fn intersect_surfaces(&self, ray: &mut Ray) -> bool {
        let state = self.state.read();
        let mut updated = false;
        for (i, surface) in state.surfaces.iter().enumerate() {
            let Some(hit) = surface.intersect(ray.org, ray.dir, ray.t) else {
                continue;
            };
            let object_id = if is_valid_id(surface.id()) {
                surface.id()
            } else {
                i as u32
            };
            ray.t.upper = hit.t;
            ray.hit = Some(SurfaceHit::local(
                hit.t,
                hit.normal,
                surface.color(),
                hit.prim_id,
                object_id,
            ));
            updated = true;
        }
        updated
    }

    /// Record the nearest volume entered inside `ray.t`, replacing the current
    /// one only if entered earlier. Returns true if the ray state was updated.
    pub fn intersect_volumes(&self, ray: &mut VolumeRay) -> bool {
        let state = self.state.read();
        let mut updated = false;
        for (i, volume) in state.volumes.iter().enumerate() {
            let Some(segment) = volume.intersect(ray.org, ray.dir, ray.t) else {
                continue;
            };
            let nearer = ray
                .volume
                .as_ref()
                .is_none_or(|current| segment.lower < current.t.lower);
            if nearer {
                ray.volume = Some(VolumeHit {
                    volume: Arc::clone(volume),
                    t: segment,
                    object_id: if is_valid_id(volume.id()) {
                        volume.id()
                    } else {
                        i as u32
                    },
                });
                updated = true;
            }
        }
        updated
    }

    fn collect<T: TypeFor + SceneObject>(&self, name: &str) -> Vec<Arc<T>>
    where
        Arc<ObjectArray<T>>: crate::object::FromParam,
    {
        self.core
            .get_param::<Arc<ObjectArray<T>>>(name)
            .map(|array| {
                array
                    .handles()
                    .into_iter()
                    .flatten()
                    .filter(|o| o.is_valid())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl ObjectView<'_, Group> {
    pub fn object_id(&self) -> ObjectId {
        self.get().core().id()
    }

    pub fn surfaces(&self) -> Vec<Arc<Surface>> {
        self.get().surfaces()
    }

    pub fn volumes(&self) -> Vec<Arc<Volume>> {
        self.get().volumes()
    }

    pub fn surface_count(&self) -> usize {
        self.get().surface_count()
    }

    pub fn volume_count(&self) -> usize {
        self.get().volume_count()
    }

    pub fn bounds(&self) -> Aabb {
        self.get().bounds()
    }
}

impl Parameterized for Group {
    fn core(&self) -> &ObjectCore {
        &self.core
    }
}

impl SceneObject for Group {
    fn commit(&self) {
        let surfaces: Vec<Arc<Surface>> = self.collect("surface");
        let volumes: Vec<Arc<Volume>> = self.collect("volume");

        let mut bounds = Aabb::empty();
        for s in &surfaces {
            bounds.extend(&s.bounds());
        }
        for v in &volumes {
            bounds.extend(&v.bounds());
        }

        *self.state.write() = GroupState {
            surfaces,
            volumes,
            bounds,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use glam::Vec3;
    use prism_common::Interval;

    fn sphere_surface(device: &Arc<DeviceState>, z: f32, id: Option<u32>) -> Arc<Surface> {
        let g = Geometry::sphere(device);
        g.set_param("vertex.position", vec![Vec3::new(0.0, 0.0, z)]);
        g.set_param("radius", 1.0f32);
        g.commit();
        let s = Surface::new(device);
        s.set_param("geometry", Arc::new(g));
        if let Some(id) = id {
            s.set_param("id", id);
        }
        s.commit();
        Arc::new(s)
    }

    fn box_volume(device: &Arc<DeviceState>, z0: f32, z1: f32) -> Arc<Volume> {
        let v = Volume::new(device);
        v.set_param("bounds.min", Vec3::new(-1.0, -1.0, z0));
        v.set_param("bounds.max", Vec3::new(1.0, 1.0, z1));
        v.commit();
        Arc::new(v)
    }

    #[test]
    fn commit_skips_invalid_and_null_surfaces() {
        let device = DeviceState::new();
        let broken = Arc::new(Surface::new(&device));
        broken.commit();
        let good = sphere_surface(&device, 5.0, None);
        let array = ObjectArray::new(&device, vec![Some(good), None, Some(broken)]);

        let group = Group::new(&device);
        group.set_param("surface", Arc::new(array));
        group.commit();
        assert_eq!(group.surface_count(), 1);
        assert!(!group.bounds().is_empty());
    }

    #[test]
    fn nearest_surface_and_object_ids() {
        let device = DeviceState::new();
        let far = sphere_surface(&device, 10.0, Some(42));
        let near = sphere_surface(&device, 5.0, None);
        let group = Group::new(&device);
        group.set_param(
            "surface",
            Arc::new(ObjectArray::from_objects(&device, [far, near])),
        );
        group.commit();

        let mut ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(group.intersect_surfaces(&mut ray));
        let hit = ray.hit.unwrap();
        assert!((hit.t - 4.0).abs() < 1e-5);
        // unset surface id falls back to the index in the group
        assert_eq!(hit.object_id, 1);
        assert_eq!(ray.t.upper, hit.t);
    }

    #[test]
    fn existing_nearer_hit_is_kept() {
        let device = DeviceState::new();
        let group = Group::new(&device);
        group.set_param(
            "surface",
            Arc::new(ObjectArray::from_objects(
                &device,
                [sphere_surface(&device, 10.0, None)],
            )),
        );
        group.commit();

        let mut ray = Ray::new(Vec3::ZERO, Vec3::Z).with_interval(Interval::new(0.0, 3.0));
        assert!(!group.intersect_surfaces(&mut ray));
        assert!(ray.hit.is_none());
    }

    #[test]
    fn nearest_volume_entry_wins() {
        let device = DeviceState::new();
        let far = box_volume(&device, 8.0, 9.0);
        let near = box_volume(&device, 2.0, 3.0);
        let group = Group::new(&device);
        group.set_param(
            "volume",
            Arc::new(ObjectArray::from_objects(&device, [far, near.clone()])),
        );
        group.commit();
        assert_eq!(group.volume_count(), 2);

        let mut vray = VolumeRay::new(Vec3::ZERO, Vec3::Z, Interval::positive());
        assert!(group.intersect_volumes(&mut vray));
        let hit = vray.volume.unwrap();
        assert!(Arc::ptr_eq(&hit.volume, &near));
        assert!((hit.t.lower - 2.0).abs() < 1e-5);
        // unset volume id falls back to the index in the group
        assert_eq!(hit.object_id, 1);
    }

    #[test]
    fn volume_id_is_reported_when_set() {
        let device = DeviceState::new();
        let fog = box_volume(&device, 2.0, 3.0);
        fog.set_param("id", 31u32);
        fog.commit();
        let group = Group::new(&device);
        group.set_param(
            "volume",
            Arc::new(ObjectArray::from_objects(&device, [fog])),
        );
        group.commit();

        let mut vray = VolumeRay::new(Vec3::ZERO, Vec3::Z, Interval::positive());
        assert!(group.intersect_volumes(&mut vray));
        assert_eq!(vray.volume.unwrap().object_id, 31);
    }

    #[test]
    fn group_without_params_is_empty() {
        let device = DeviceState::new();
        let group = Group::new(&device);
        group.commit();
        assert_eq!(group.surface_count(), 0);
        assert_eq!(group.volume_count(), 0);
        assert!(group.bounds().is_empty());
    }
}
