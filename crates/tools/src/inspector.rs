use prism_common::{Aabb, ObjectId, is_valid_id};
use prism_kernel::{DeviceState, ObjectKind, Parameterized, World};

/// Scene inspector for developer tooling.
///
/// Read-only queries against a committed world for debugging and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the committed world and live device objects.
    pub fn summary(world: &World, device: &DeviceState) -> WorldSummary {
        let instances = world.instances();
        let (surfaces, volumes) = instances
            .iter()
            .filter_map(|inst| inst.group())
            .fold((0, 0), |(s, v), g| (s + g.surface_count(), v + g.volume_count()));
        WorldSummary {
            world_id: world.core().id(),
            instance_count: instances.len(),
            zero_instance: world.zero_instance_index(),
            surface_count: surfaces,
            volume_count: volumes,
            bounds: world.bounds(),
            needs_commit: world.needs_commit(),
            object_counts: device.object_counts(),
        }
    }

    /// Details of the instance at `index` in `world.instances()`.
    pub fn inspect_instance(world: &World, index: usize) -> Option<InstanceInfo> {
        let inst = world.instances().get(index)?;
        let group = inst.group();
        let t = inst.transform().w_axis;
        Some(InstanceInfo {
            index,
            object_id: inst.object_id(),
            id: is_valid_id(inst.id()).then(|| inst.id()),
            is_zero: world.zero_instance_index() == Some(index),
            translation: [t.x, t.y, t.z],
            surface_count: group.as_ref().map_or(0, |g| g.surface_count()),
            volume_count: group.as_ref().map_or(0, |g| g.volume_count()),
            bounds: inst.bounds(),
        })
    }

    /// Object ids of the committed instances, in trace order.
    pub fn list_instances(world: &World) -> Vec<ObjectId> {
        world.instances().iter().map(|inst| inst.object_id()).collect()
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone)]
pub struct WorldSummary {
    pub world_id: ObjectId,
    pub instance_count: usize,
    pub zero_instance: Option<usize>,
    pub surface_count: usize,
    pub volume_count: usize,
    pub bounds: Aabb,
    pub needs_commit: bool,
    pub object_counts: Vec<(ObjectKind, usize)>,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World [{}]: instances={} surfaces={} volumes={}",
            self.world_id.short(),
            self.instance_count,
            self.surface_count,
            self.volume_count
        )?;
        if let Some(zero) = self.zero_instance {
            write!(f, " zero_instance={zero}")?;
        }
        if self.needs_commit {
            write!(f, " (uncommitted changes)")?;
        }
        if !self.bounds.is_empty() {
            write!(f, "\n  bounds: {} .. {}", self.bounds.min, self.bounds.max)?;
        }
        let live: Vec<String> = self
            .object_counts
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(kind, n)| format!("{kind}={n}"))
            .collect();
        if !live.is_empty() {
            write!(f, "\n  objects: {}", live.join(" "))?;
        }
        Ok(())
    }
}

/// Detailed info about a single committed instance.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub index: usize,
    pub object_id: ObjectId,
    /// User `id`, if set.
    pub id: Option<u32>,
    pub is_zero: bool,
    pub translation: [f32; 3],
    pub surface_count: usize,
    pub volume_count: usize,
    pub bounds: Aabb,
}

impl std::fmt::Display for InstanceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Instance #{} [{}]", self.index, self.object_id.short())?;
        match self.id {
            Some(id) => write!(f, " id={id}")?,
            None => write!(f, " id=-")?,
        }
        if self.is_zero {
            write!(f, " (zero)")?;
        }
        write!(
            f,
            " pos=({:.2}, {:.2}, {:.2}) surfaces={} volumes={}",
            self.translation[0],
            self.translation[1],
            self.translation[2],
            self.surface_count,
            self.volume_count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use prism_kernel::{
        Geometry, Group, Instance, ObjectArray, SceneObject, Surface, Volume,
    };
    use std::sync::Arc;

    fn ball(device: &Arc<DeviceState>) -> Arc<Surface> {
        let g = Geometry::sphere(device);
        g.set_param("vertex.position", vec![Vec3::ZERO]);
        g.set_param("radius", 1.0f32);
        g.commit();
        let s = Surface::new(device);
        s.set_param("geometry", Arc::new(g));
        s.commit();
        Arc::new(s)
    }

    fn fog(device: &Arc<DeviceState>) -> Arc<Volume> {
        let v = Volume::new(device);
        v.set_param("bounds.min", Vec3::splat(-1.0));
        v.set_param("bounds.max", Vec3::splat(1.0));
        v.commit();
        Arc::new(v)
    }

    fn placed(device: &Arc<DeviceState>, at: Vec3, id: u32) -> Arc<Instance> {
        let group = Group::new(device);
        group.set_param(
            "surface",
            Arc::new(ObjectArray::from_objects(device, [ball(device), ball(device)])),
        );
        group.commit();
        let inst = Instance::new(device);
        inst.set_param("group", Arc::new(group));
        inst.set_param("transform", Mat4::from_translation(at));
        inst.set_param("id", id);
        inst.commit();
        Arc::new(inst)
    }

    #[test]
    fn summary_empty_world() {
        let device = DeviceState::new();
        let mut world = World::new(&device);
        world.commit();
        let summary = SceneInspector::summary(&world, &device);
        assert_eq!(summary.instance_count, 0);
        assert_eq!(summary.zero_instance, None);
        assert!(summary.bounds.is_empty());
        assert!(!summary.needs_commit);
    }

    #[test]
    fn summary_counts_instances_and_zero_group() {
        let device = DeviceState::new();
        let mut world = World::new(&device);
        world.set_param(
            "instance",
            Arc::new(ObjectArray::from_objects(
                &device,
                [placed(&device, Vec3::X * 5.0, 1)],
            )),
        );
        world.set_param(
            "volume",
            Arc::new(ObjectArray::from_objects(&device, [fog(&device)])),
        );
        world.commit();

        let summary = SceneInspector::summary(&world, &device);
        assert_eq!(summary.instance_count, 2);
        assert_eq!(summary.zero_instance, Some(1));
        assert_eq!(summary.surface_count, 2);
        assert_eq!(summary.volume_count, 1);
        assert!(
            summary
                .object_counts
                .contains(&(ObjectKind::Instance, 2))
        );
    }

    #[test]
    fn inspect_instance_found() {
        let device = DeviceState::new();
        let mut world = World::new(&device);
        world.set_param(
            "instance",
            Arc::new(ObjectArray::from_objects(
                &device,
                [placed(&device, Vec3::new(1.0, 2.0, 3.0), 7)],
            )),
        );
        world.commit();

        let info = SceneInspector::inspect_instance(&world, 0).unwrap();
        assert_eq!(info.translation, [1.0, 2.0, 3.0]);
        assert_eq!(info.id, Some(7));
        assert_eq!(info.surface_count, 2);
        assert!(!info.is_zero);
        assert!(format!("{info}").contains("id=7"));
    }

    #[test]
    fn inspect_instance_not_found() {
        let device = DeviceState::new();
        let mut world = World::new(&device);
        world.commit();
        assert!(SceneInspector::inspect_instance(&world, 0).is_none());
    }

    #[test]
    fn zero_instance_has_no_user_id() {
        let device = DeviceState::new();
        let mut world = World::new(&device);
        world.set_param(
            "surface",
            Arc::new(ObjectArray::from_objects(&device, [ball(&device)])),
        );
        world.commit();

        let info = SceneInspector::inspect_instance(&world, 0).unwrap();
        assert!(info.is_zero);
        assert_eq!(info.id, None);
        assert_eq!(SceneInspector::list_instances(&world), vec![info.object_id]);
    }

    #[test]
    fn summary_display() {
        let device = DeviceState::new();
        let mut world = World::new(&device);
        world.commit();
        world.set_param("id", 3u32);
        let s = format!("{}", SceneInspector::summary(&world, &device));
        assert!(s.contains("instances=0"));
        assert!(s.contains("uncommitted"));
        assert!(s.contains("world=1"));
    }
}
