use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// API-facing type tag of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Array,
    Geometry,
    Material,
    Surface,
    Volume,
    Group,
    Instance,
    World,
    Renderer,
    Camera,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 10] = [
        ObjectKind::Array,
        ObjectKind::Geometry,
        ObjectKind::Material,
        ObjectKind::Surface,
        ObjectKind::Volume,
        ObjectKind::Group,
        ObjectKind::Instance,
        ObjectKind::World,
        ObjectKind::Renderer,
        ObjectKind::Camera,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Geometry => "geometry",
            Self::Material => "material",
            Self::Surface => "surface",
            Self::Volume => "volume",
            Self::Group => "group",
            Self::Instance => "instance",
            Self::World => "world",
            Self::Renderer => "renderer",
            Self::Camera => "camera",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static registration of a concrete object type to its API tag.
pub trait TypeFor {
    const KIND: ObjectKind;
}

/// Process-wide device context shared by every object created on the device.
///
/// Objects hold a non-owning back-reference to it; the host owns the `Arc`.
#[derive(Debug, Default)]
pub struct DeviceState {
    counts: [AtomicUsize; ObjectKind::ALL.len()],
}

impl DeviceState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of live objects of the given kind.
    pub fn object_count(&self, kind: ObjectKind) -> usize {
        self.counts[kind.slot()].load(Ordering::Relaxed)
    }

    /// Live object counts for every kind, in tag order.
    pub fn object_counts(&self) -> Vec<(ObjectKind, usize)> {
        ObjectKind::ALL
            .iter()
            .map(|k| (*k, self.object_count(*k)))
            .collect()
    }

    pub(crate) fn track(&self, kind: ObjectKind) {
        self.counts[kind.slot()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn untrack(&self, kind: ObjectKind) {
        self.counts[kind.slot()].fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_start_at_zero() {
        let device = DeviceState::new();
        for (_, count) in device.object_counts() {
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn track_and_untrack() {
        let device = DeviceState::new();
        device.track(ObjectKind::World);
        device.track(ObjectKind::World);
        device.untrack(ObjectKind::World);
        assert_eq!(device.object_count(ObjectKind::World), 1);
        assert_eq!(device.object_count(ObjectKind::Group), 0);
    }

    #[test]
    fn kind_names_are_unique() {
        let mut names: Vec<_> = ObjectKind::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ObjectKind::ALL.len());
    }
}
