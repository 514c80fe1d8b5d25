//! Scene kernel: the object model and the scene hierarchy traced by renderers.
//!
//! Leaf-first: geometry and materials form surfaces; surfaces and volumes form
//! groups; instances place groups; the [`World`] lists instances.
//!
//! # Invariants
//! - Parameters only take effect on commit.
//! - Derived state is read-only between commits, so any number of rays may be
//!   traced concurrently against a committed world.

pub mod array;
pub mod device;
pub mod geometry;
pub mod group;
pub mod handle;
pub mod instance;
pub mod material;
pub mod object;
pub mod observer;
pub mod ray;
pub mod surface;
pub mod volume;
pub mod world;

pub use array::ObjectArray;
pub use device::{DeviceState, ObjectKind, TypeFor};
pub use geometry::{Geometry, GeometryHit};
pub use group::Group;
pub use handle::{ObjectRef, ObjectView};
pub use instance::Instance;
pub use material::Material;
pub use object::{FromParam, ObjectCore, ParamValue, Parameterized, SceneObject, Severity};
pub use observer::{ChangeObserver, Subscription};
pub use ray::{Ray, SurfaceHit, VolumeHit, VolumeRay};
pub use surface::Surface;
pub use volume::Volume;
pub use world::{InstanceRef, World};

pub fn crate_info() -> &'static str {
    "prism-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
