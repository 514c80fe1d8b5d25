//! Generic object model: named parameters, commit, properties, diagnostics.
//!
//! # Invariants
//! - Parameters are inert until the owning object is committed.
//! - A type mismatch on a typed parameter read is reported, never fatal.

use crate::array::ObjectArray;
use crate::device::{DeviceState, ObjectKind};
use crate::geometry::Geometry;
use crate::group::Group;
use crate::instance::Instance;
use crate::material::Material;
use crate::observer::{ChangeObserver, ObserverList, Subscription};
use crate::surface::Surface;
use crate::volume::Volume;
use glam::{Mat4, UVec2, UVec3, Vec2, Vec3, Vec4};
use parking_lot::RwLock;
use prism_common::{Aabb, ObjectId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Diagnostic severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    FatalError,
    Error,
    Warning,
    PerformanceWarning,
    Info,
    Debug,
}

/// A parameter value as set by the host.
#[derive(Clone)]
pub enum ParamValue {
    Bool(bool),
    UInt(u32),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    UInt2(UVec2),
    Mat4(Mat4),
    Bounds(Aabb),
    String(String),
    FloatArray(Arc<[f32]>),
    Float3Array(Arc<[Vec3]>),
    UInt3Array(Arc<[UVec3]>),
    Geometry(Arc<Geometry>),
    Material(Arc<Material>),
    Surface(Arc<Surface>),
    Volume(Arc<Volume>),
    Group(Arc<Group>),
    Instance(Arc<Instance>),
    SurfaceArray(Arc<ObjectArray<Surface>>),
    VolumeArray(Arc<ObjectArray<Volume>>),
    InstanceArray(Arc<ObjectArray<Instance>>),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::UInt(_) => "uint32",
            Self::Float(_) => "float32",
            Self::Float2(_) => "float32_vec2",
            Self::Float3(_) => "float32_vec3",
            Self::Float4(_) => "float32_vec4",
            Self::UInt2(_) => "uint32_vec2",
            Self::Mat4(_) => "float32_mat4",
            Self::Bounds(_) => "float32_box3",
            Self::String(_) => "string",
            Self::FloatArray(_) => "array1d<float32>",
            Self::Float3Array(_) => "array1d<float32_vec3>",
            Self::UInt3Array(_) => "array1d<uint32_vec3>",
            Self::Geometry(_) => "geometry",
            Self::Material(_) => "material",
            Self::Surface(_) => "surface",
            Self::Volume(_) => "volume",
            Self::Group(_) => "group",
            Self::Instance(_) => "instance",
            Self::SurfaceArray(_) => "array1d<surface>",
            Self::VolumeArray(_) => "array1d<volume>",
            Self::InstanceArray(_) => "array1d<instance>",
        }
    }
}

impl fmt::Debug for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::UInt(v) => write!(f, "UInt({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Float2(v) => write!(f, "Float2({v})"),
            Self::Float3(v) => write!(f, "Float3({v})"),
            Self::Float4(v) => write!(f, "Float4({v})"),
            Self::UInt2(v) => write!(f, "UInt2({v})"),
            Self::Mat4(v) => write!(f, "Mat4({v})"),
            Self::Bounds(v) => write!(f, "Bounds({} .. {})", v.min, v.max),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::FloatArray(v) => write!(f, "FloatArray(len={})", v.len()),
            Self::Float3Array(v) => write!(f, "Float3Array(len={})", v.len()),
            Self::UInt3Array(v) => write!(f, "UInt3Array(len={})", v.len()),
            other => write!(f, "Object({})", other.type_name()),
        }
    }
}

/// Typed extraction of a [`ParamValue`].
pub trait FromParam: Sized {
    fn from_param(value: &ParamValue) -> Option<Self>;
}

macro_rules! param_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromParam for $ty {
                fn from_param(value: &ParamValue) -> Option<Self> {
                    match value {
                        ParamValue::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for ParamValue {
                fn from(v: $ty) -> Self {
                    ParamValue::$variant(v)
                }
            }
        )*
    };
}

param_conversions! {
    bool => Bool,
    u32 => UInt,
    f32 => Float,
    Vec2 => Float2,
    Vec3 => Float3,
    Vec4 => Float4,
    UVec2 => UInt2,
    Mat4 => Mat4,
    Aabb => Bounds,
    String => String,
    Arc<[f32]> => FloatArray,
    Arc<[Vec3]> => Float3Array,
    Arc<[UVec3]> => UInt3Array,
    Arc<Geometry> => Geometry,
    Arc<Material> => Material,
    Arc<Surface> => Surface,
    Arc<Volume> => Volume,
    Arc<Group> => Group,
    Arc<Instance> => Instance,
    Arc<ObjectArray<Surface>> => SurfaceArray,
    Arc<ObjectArray<Volume>> => VolumeArray,
    Arc<ObjectArray<Instance>> => InstanceArray,
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<Vec<f32>> for ParamValue {
    fn from(v: Vec<f32>) -> Self {
        ParamValue::FloatArray(v.into())
    }
}

impl From<Vec<Vec3>> for ParamValue {
    fn from(v: Vec<Vec3>) -> Self {
        ParamValue::Float3Array(v.into())
    }
}

impl From<Vec<UVec3>> for ParamValue {
    fn from(v: Vec<UVec3>) -> Self {
        ParamValue::UInt3Array(v.into())
    }
}

/// State shared by every scene object: identity, parameters, observers and
/// the back-reference to the device it was created on.
pub struct ObjectCore {
    id: ObjectId,
    kind: ObjectKind,
    subtype: String,
    params: RwLock<BTreeMap<String, ParamValue>>,
    param_version: AtomicU64,
    observers: Arc<ObserverList>,
    device: Weak<DeviceState>,
}

impl ObjectCore {
    pub fn new(kind: ObjectKind, subtype: &str, device: &Arc<DeviceState>) -> Self {
        device.track(kind);
        Self {
            id: ObjectId::new(),
            kind,
            subtype: subtype.to_string(),
            params: RwLock::new(BTreeMap::new()),
            param_version: AtomicU64::new(0),
            observers: ObserverList::new(),
            device: Arc::downgrade(device),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn device(&self) -> Option<Arc<DeviceState>> {
        self.device.upgrade()
    }

    /// Monotonic counter bumped by every parameter set or removal.
    pub fn param_version(&self) -> u64 {
        self.param_version.load(Ordering::Acquire)
    }

    pub fn set_param(&self, name: &str, value: impl Into<ParamValue>) {
        self.set_param_direct(name, value.into());
    }

    pub fn set_param_direct(&self, name: &str, value: ParamValue) {
        self.params.write().insert(name.to_string(), value);
        self.param_version.fetch_add(1, Ordering::AcqRel);
    }

    /// Remove a parameter. Returns true if it was set.
    pub fn remove_param(&self, name: &str) -> bool {
        let removed = self.params.write().remove(name).is_some();
        if removed {
            self.param_version.fetch_add(1, Ordering::AcqRel);
        }
        removed
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.read().contains_key(name)
    }

    /// Raw parameter value, whatever its type.
    pub fn get_param_direct(&self, name: &str) -> Option<ParamValue> {
        self.params.read().get(name).cloned()
    }

    /// Typed parameter read. A value of the wrong type is reported and
    /// treated as absent.
    pub fn get_param<T: FromParam>(&self, name: &str) -> Option<T> {
        let value = self.get_param_direct(name)?;
        let typed = T::from_param(&value);
        if typed.is_none() {
            self.report_message(
                Severity::Warning,
                format_args!(
                    "parameter '{name}' has unexpected type {}",
                    value.type_name()
                ),
            );
        }
        typed
    }

    pub fn get_param_or<T: FromParam>(&self, name: &str, default: T) -> T {
        self.get_param(name).unwrap_or(default)
    }

    /// Names of all currently set parameters, sorted.
    pub fn param_names(&self) -> Vec<String> {
        self.params.read().keys().cloned().collect()
    }

    pub fn add_change_observer(&self, observer: &Arc<dyn ChangeObserver>) -> Subscription {
        self.observers.subscribe(observer)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Notify observers that this object's contents changed.
    pub fn notify_change(&self) {
        self.observers.notify(self.id);
    }

    pub fn report_message(&self, severity: Severity, message: impl fmt::Display) {
        let object = self.id.short();
        let kind = self.kind.name();
        match severity {
            Severity::FatalError | Severity::Error => {
                tracing::error!(%object, kind, "{message}")
            }
            Severity::Warning | Severity::PerformanceWarning => {
                tracing::warn!(%object, kind, "{message}")
            }
            Severity::Info => tracing::info!(%object, kind, "{message}"),
            Severity::Debug => tracing::debug!(%object, kind, "{message}"),
        }
    }
}

impl Drop for ObjectCore {
    fn drop(&mut self) {
        if let Some(device) = self.device.upgrade() {
            device.untrack(self.kind);
        }
    }
}

impl fmt::Debug for ObjectCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCore")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("subtype", &self.subtype)
            .field("params", &self.param_names())
            .finish()
    }
}

/// Anything carrying an [`ObjectCore`]: exposes parameter access directly.
pub trait Parameterized {
    fn core(&self) -> &ObjectCore;

    fn set_param(&self, name: &str, value: impl Into<ParamValue>) {
        self.core().set_param(name, value);
    }

    fn remove_param(&self, name: &str) -> bool {
        self.core().remove_param(name)
    }
}

/// A shared scene object that the host commits through a handle.
pub trait SceneObject: Parameterized {
    /// Finalize pending parameter changes into derived state.
    fn commit(&self);

    fn is_valid(&self) -> bool {
        true
    }

    fn get_property(&self, name: &str) -> Option<ParamValue> {
        match name {
            "valid" => Some(ParamValue::Bool(self.is_valid())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> (Arc<DeviceState>, ObjectCore) {
        let device = DeviceState::new();
        let core = ObjectCore::new(ObjectKind::Material, "matte", &device);
        (device, core)
    }

    #[test]
    fn typed_round_trip() {
        let (_d, core) = core();
        core.set_param("id", 7u32);
        core.set_param("color", Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(core.get_param::<u32>("id"), Some(7));
        assert_eq!(core.get_param::<Vec3>("color"), Some(Vec3::new(1.0, 0.5, 0.0)));
    }

    #[test]
    fn wrong_type_reads_as_absent() {
        let (_d, core) = core();
        core.set_param("id", 1.5f32);
        assert_eq!(core.get_param::<u32>("id"), None);
        assert_eq!(core.get_param_or("id", 3u32), 3);
    }

    #[test]
    fn remove_param_reports_presence() {
        let (_d, core) = core();
        core.set_param("mode", "normal");
        assert!(core.remove_param("mode"));
        assert!(!core.remove_param("mode"));
        assert!(!core.has_param("mode"));
    }

    #[test]
    fn param_version_tracks_changes() {
        let (_d, core) = core();
        let v0 = core.param_version();
        core.set_param("opacity", 0.5f32);
        assert!(core.param_version() > v0);
        let v1 = core.param_version();
        core.remove_param("missing");
        assert_eq!(core.param_version(), v1);
    }

    #[test]
    fn direct_params_copy_any_value() {
        let (_d, a) = core();
        let b = ObjectCore::new(ObjectKind::Material, "matte", &a.device().unwrap());
        a.set_param("data", vec![Vec3::ZERO, Vec3::ONE]);
        b.set_param_direct("data", a.get_param_direct("data").unwrap());
        let data: Arc<[Vec3]> = b.get_param("data").unwrap();
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn device_counts_follow_lifetime() {
        let device = DeviceState::new();
        {
            let _a = ObjectCore::new(ObjectKind::Surface, "", &device);
            let _b = ObjectCore::new(ObjectKind::Surface, "", &device);
            assert_eq!(device.object_count(ObjectKind::Surface), 2);
        }
        assert_eq!(device.object_count(ObjectKind::Surface), 0);
    }
}
