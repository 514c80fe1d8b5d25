//! Ownership wrappers separating objects the host can share from objects a
//! container keeps to itself.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

/// An object exclusively owned by its container.
///
/// Not `Clone` and never handed to the host. Other objects of this crate may
/// borrow a strong reference (e.g. an instance binding its group) or a weak
/// one (an auto-appended array entry), but ownership stays with the holder.
pub struct Exclusive<T>(Arc<T>);

impl<T> Exclusive<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub(crate) fn lend(&self) -> Arc<T> {
        Arc::clone(&self.0)
    }

    pub(crate) fn lend_ref(&self) -> ObjectRef<T> {
        ObjectRef(self.lend())
    }
}

impl<T> Deref for Exclusive<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Exclusive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Exclusive").field(&*self.0).finish()
    }
}

/// A reference to a scene object held in a derived list.
///
/// Read-only: it does not deref to the object, so parameters cannot be set
/// through it, and it cannot be cloned to take part in ownership. Queries are
/// provided per object type.
///
/// ```compile_fail
/// use prism_kernel::{DeviceState, Parameterized, World};
///
/// let device = DeviceState::new();
/// let mut world = World::new(&device);
/// world.commit();
/// world.instances()[0].set_param("id", 1u32);
/// ```
pub struct ObjectRef<T>(Arc<T>);

impl<T> ObjectRef<T> {
    pub(crate) fn new(inner: Arc<T>) -> Self {
        Self(inner)
    }

    pub(crate) fn get(&self) -> &T {
        &self.0
    }

    /// Identity comparison against any reference to an object.
    pub fn is(&self, other: &T) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.0), other)
    }

    pub fn same_object(&self, other: &ObjectRef<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the referenced object, for identity checks only.
    pub fn as_ptr(&self) -> *const T {
        Arc::as_ptr(&self.0)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObjectRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectRef").field(&*self.0).finish()
    }
}

/// Read-only view of an object bound inside another, valid while the holder
/// is borrowed.
///
/// ```compile_fail
/// use prism_kernel::{DeviceState, World};
///
/// let device = DeviceState::new();
/// let group = {
///     let mut world = World::new(&device);
///     world.commit();
///     world.instances()[0].group()
/// };
/// ```
pub struct ObjectView<'a, T> {
    inner: Arc<T>,
    _holder: PhantomData<&'a T>,
}

impl<T> ObjectView<'_, T> {
    pub(crate) fn new(inner: Arc<T>) -> Self {
        Self {
            inner,
            _holder: PhantomData,
        }
    }

    pub(crate) fn get(&self) -> &T {
        &self.inner
    }

    pub fn is(&self, other: &T) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.inner), other)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObjectView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectView").field(&*self.inner).finish()
    }
}
