use crate::array::ObjectArray;
use crate::device::{DeviceState, ObjectKind, TypeFor};
use crate::group::Group;
use crate::handle::{Exclusive, ObjectRef};
use crate::instance::Instance;
use crate::object::{ObjectCore, ParamValue, Parameterized, SceneObject, Severity};
use crate::observer::{ChangeObserver, Subscription};
use crate::ray::{Ray, VolumeRay};
use crate::surface::Surface;
use crate::volume::Volume;
use prism_common::{Aabb, INVALID_ID, ObjectId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Read-only reference to an instance in the committed instance list.
pub type InstanceRef = ObjectRef<Instance>;

/// Receives change notifications from the arrays a world observes.
#[derive(Debug, Default)]
struct Invalidation {
    dirty: AtomicBool,
    notifications: AtomicU64,
}

impl ChangeObserver for Invalidation {
    fn notify_change(&self, source: ObjectId) {
        tracing::trace!(%source, "world invalidated");
        self.dirty.store(true, Ordering::Release);
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }
}

/// The scene root: a list of instances to trace against.
///
/// Surfaces and volumes attached directly to the world (`surface`/`volume`
/// parameters) are placed in a private "zero" group wrapped by a private zero
/// instance, so they render without the host authoring an instance.
///
/// # Invariants
/// - The zero group and zero instance live as long as the world and are never
///   handed to the host.
/// - `instances()` reflects the most recent `commit()`.
#[derive(Debug)]
pub struct World {
    core: ObjectCore,
    zero_group: Exclusive<Group>,
    zero_instance: Exclusive<Instance>,
    instance_data: Option<Arc<ObjectArray<Instance>>>,
    zero_surface_data: Option<Arc<ObjectArray<Surface>>>,
    instances: Vec<InstanceRef>,
    zero_index: Option<usize>,
    invalidation: Arc<Invalidation>,
    subscriptions: Vec<Subscription>,
    committed_version: Option<u64>,
}

impl TypeFor for World {
    const KIND: ObjectKind = ObjectKind::World;
}

impl World {
    pub fn new(device: &Arc<DeviceState>) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::World, "", device),
            zero_group: Exclusive::new(Group::new(device)),
            zero_instance: Exclusive::new(Instance::new(device)),
            instance_data: None,
            zero_surface_data: None,
            instances: Vec::new(),
            zero_index: None,
            invalidation: Arc::new(Invalidation::default()),
            subscriptions: Vec::new(),
            committed_version: None,
        }
    }

    /// Rebuild the zero group/instance and the instance list from the current
    /// parameters, then observe the host arrays for changes.
    pub fn commit(&mut self) {
        let _span = tracing::debug_span!("world_commit", world = %self.core.id()).entered();
        self.cleanup();

        self.zero_surface_data = self.core.get_param::<Arc<ObjectArray<Surface>>>("surface");
        let zero_volume_data = self.core.get_param::<Arc<ObjectArray<Volume>>>("volume");

        let add_zero_instance = self.zero_surface_data.is_some() || zero_volume_data.is_some();
        if add_zero_instance {
            self.core
                .report_message(Severity::Debug, "world will add zero instance");
        }

        if let Some(surfaces) = &self.zero_surface_data {
            self.core.report_message(
                Severity::Debug,
                format_args!("world found {} surfaces in zero instance", surfaces.size()),
            );
        }
        self.forward_to_zero_group("surface");

        if let Some(volumes) = &zero_volume_data {
            self.core.report_message(
                Severity::Debug,
                format_args!("world found {} volumes in zero instance", volumes.size()),
            );
        }
        self.forward_to_zero_group("volume");

        // the zero instance always places the zero group untransformed
        self.zero_instance
            .core()
            .set_param_direct("group", ParamValue::Group(self.zero_group.lend()));
        self.zero_instance.remove_param("transform");
        self.zero_instance
            .set_param("id", self.core.get_param_or("id", INVALID_ID));

        // group before the instance that binds it
        self.zero_group.commit();
        self.zero_instance.commit();

        self.instance_data = self.core.get_param::<Arc<ObjectArray<Instance>>>("instance");
        self.rebuild_instances(add_zero_instance);

        let observer: Arc<dyn ChangeObserver> = self.invalidation.clone();
        if let Some(data) = &self.instance_data {
            self.subscriptions.push(data.add_change_observer(&observer));
        }
        if let Some(data) = &self.zero_surface_data {
            self.subscriptions.push(data.add_change_observer(&observer));
        }

        self.invalidation.dirty.store(false, Ordering::Release);
        self.committed_version = Some(self.core.param_version());
    }

    fn forward_to_zero_group(&self, name: &str) {
        match self.core.get_param_direct(name) {
            Some(value) => self.zero_group.core().set_param_direct(name, value),
            None => {
                self.zero_group.remove_param(name);
            }
        }
    }

    fn rebuild_instances(&mut self, add_zero_instance: bool) {
        self.instances.clear();
        self.zero_index = None;

        if let Some(data) = &self.instance_data {
            data.remove_appended_handles();
            if add_zero_instance {
                data.append_handle(&self.zero_instance.lend());
            }
            let zero: &Instance = &self.zero_instance;
            for handle in data.entries().into_iter().flatten() {
                if !handle.is_valid() {
                    continue;
                }
                if std::ptr::eq(Arc::as_ptr(&handle), zero) {
                    self.zero_index = Some(self.instances.len());
                }
                self.instances.push(ObjectRef::new(handle));
            }
        } else if add_zero_instance {
            self.zero_index = Some(0);
            self.instances.push(self.zero_instance.lend_ref());
        }

        tracing::debug!(
            world = %self.core.id(),
            instances = self.instances.len(),
            zero = ?self.zero_index,
            "instance list rebuilt"
        );
    }

    /// Instances committed at the last `commit()`, in trace order.
    pub fn instances(&self) -> &[InstanceRef] {
        &self.instances
    }

    /// Position of the zero instance in `instances()`, if present.
    pub fn zero_instance_index(&self) -> Option<usize> {
        self.zero_index
    }

    /// True until the world is committed, and again after any world parameter
    /// changes or an observed array reports a change.
    pub fn needs_commit(&self) -> bool {
        self.invalidation.dirty.load(Ordering::Acquire)
            || self.committed_version != Some(self.core.param_version())
    }

    /// Number of change notifications received from observed arrays.
    pub fn notification_count(&self) -> u64 {
        self.invalidation.notifications.load(Ordering::Relaxed)
    }

    /// Forward `ray` through every instance in order. An instance whose group
    /// finds or improves `ray.volume` records its index on the ray; the
    /// group's nearer-entry policy decides, not the world.
    pub fn intersect_volumes(&self, ray: &mut VolumeRay) {
        for (i, inst) in self.instances.iter().enumerate() {
            if inst.get().intersect_volumes(ray) {
                ray.inst_index = i as u32;
            }
        }
    }

    /// Nearest surface hit across all instances. Returns true on any hit.
    pub fn intersect_surfaces(&self, ray: &mut Ray) -> bool {
        let mut hit = false;
        for (i, inst) in self.instances.iter().enumerate() {
            hit |= inst.get().intersect_surfaces(ray, i as u32);
        }
        hit
    }

    /// World-space bounds of all committed instances.
    pub fn bounds(&self) -> Aabb {
        self.instances
            .iter()
            .fold(Aabb::empty(), |acc, inst| acc.union(&inst.bounds()))
    }

    pub fn get_property(&self, name: &str) -> Option<ParamValue> {
        match name {
            "bounds" => Some(ParamValue::Bounds(self.bounds())),
            "valid" => Some(ParamValue::Bool(true)),
            _ => None,
        }
    }

    fn cleanup(&mut self) {
        self.subscriptions.clear();
        if let Some(data) = &self.instance_data {
            data.remove_appended_handles();
        }
    }
}

impl Parameterized for World {
    fn core(&self) -> &ObjectCore {
        &self.core
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.cleanup();
    }
}
