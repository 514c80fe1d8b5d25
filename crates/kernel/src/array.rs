use crate::device::{DeviceState, ObjectKind, TypeFor};
use crate::object::{ObjectCore, Parameterized};
use crate::observer::{ChangeObserver, Subscription};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

/// Host-owned ordered sequence of object handles.
///
/// Host entries may be null. Containers may append their own entries; those are
/// held weakly, listed after the host entries, and removed again with
/// [`ObjectArray::remove_appended_handles`] without touching host data.
/// Appended entries belong to the container that appended them and are never
/// returned by [`ObjectArray::handles`].
pub struct ObjectArray<T> {
    core: ObjectCore,
    handles: RwLock<Vec<Option<Arc<T>>>>,
    appended: RwLock<Vec<Weak<T>>>,
}

impl<T: TypeFor> ObjectArray<T> {
    pub fn new(device: &Arc<DeviceState>, handles: Vec<Option<Arc<T>>>) -> Self {
        Self {
            core: ObjectCore::new(ObjectKind::Array, T::KIND.name(), device),
            handles: RwLock::new(handles),
            appended: RwLock::new(Vec::new()),
        }
    }

    /// Array without null entries.
    pub fn from_objects(device: &Arc<DeviceState>, objects: impl IntoIterator<Item = Arc<T>>) -> Self {
        Self::new(device, objects.into_iter().map(Some).collect())
    }
}

impl<T> ObjectArray<T> {
    /// Number of host entries.
    pub fn size(&self) -> usize {
        self.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Snapshot of the host entries.
    pub fn handles(&self) -> Vec<Option<Arc<T>>> {
        self.handles.read().clone()
    }

    /// Host entries followed by appended ones. Appended entries whose owner is
    /// gone read as null.
    pub(crate) fn entries(&self) -> Vec<Option<Arc<T>>> {
        let mut out = self.handles();
        out.extend(self.appended.read().iter().map(Weak::upgrade));
        out
    }

    /// Replace the host entries and notify observers.
    pub fn set_handles(&self, handles: Vec<Option<Arc<T>>>) {
        *self.handles.write() = handles;
        self.core.notify_change();
    }

    /// Overwrite one host entry. Returns false if `index` is out of range.
    pub fn set(&self, index: usize, handle: Option<Arc<T>>) -> bool {
        {
            let mut handles = self.handles.write();
            match handles.get_mut(index) {
                Some(slot) => *slot = handle,
                None => return false,
            }
        }
        self.core.notify_change();
        true
    }

    pub fn push(&self, handle: Option<Arc<T>>) {
        self.handles.write().push(handle);
        self.core.notify_change();
    }

    /// Append a non-owning entry after the host entries. Not a host change, so
    /// observers are not notified.
    pub fn append_handle(&self, handle: &Arc<T>) {
        self.appended.write().push(Arc::downgrade(handle));
    }

    pub fn remove_appended_handles(&self) {
        self.appended.write().clear();
    }

    pub fn appended_count(&self) -> usize {
        self.appended.read().len()
    }

    pub fn add_change_observer(&self, observer: &Arc<dyn ChangeObserver>) -> Subscription {
        self.core.add_change_observer(observer)
    }
}

impl<T> Parameterized for ObjectArray<T> {
    fn core(&self) -> &ObjectCore {
        &self.core
    }
}

impl<T> fmt::Debug for ObjectArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectArray")
            .field("id", &self.core.id())
            .field("element", &self.core.subtype())
            .field("host", &self.handles.read().len())
            .field("appended", &self.appended.read().len())
            .finish()
    }
}
