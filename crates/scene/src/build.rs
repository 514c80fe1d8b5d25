use crate::SceneError;
use crate::desc::{GeometryDesc, SceneDesc, SurfaceDesc, VolumeDesc};
use glam::UVec3;
use prism_kernel::{
    DeviceState, Geometry, Group, Instance, Material, ObjectArray, Parameterized, SceneObject,
    Surface, Volume, World,
};
use prism_render::{Camera, Renderer};
use std::collections::HashMap;
use std::sync::Arc;

/// Committed objects of a built scene, ready to render.
///
/// Holds the host-side arrays so they can be edited and the world
/// recommitted.
#[derive(Debug)]
pub struct BuiltScene {
    pub world: World,
    pub renderer: Renderer,
    pub camera: Camera,
    pub groups: Vec<(String, Arc<Group>)>,
    pub instances: Option<Arc<ObjectArray<Instance>>>,
    pub surfaces: Option<Arc<ObjectArray<Surface>>>,
    pub volumes: Option<Arc<ObjectArray<Volume>>>,
}

impl BuiltScene {
    pub fn group(&self, name: &str) -> Option<&Arc<Group>> {
        self.groups.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }
}

impl SceneDesc {
    /// Create and commit every object the description names: materials,
    /// geometry and surfaces, volumes, groups, instances, then the world,
    /// renderer and camera.
    pub fn build(&self, device: &Arc<DeviceState>) -> Result<BuiltScene, SceneError> {
        let _span = tracing::info_span!("scene_build").entered();

        let mut materials = HashMap::new();
        for desc in &self.materials {
            let material = Material::new(device);
            material.set_param("color", desc.color);
            material.set_param("opacity", desc.opacity);
            material.commit();
            materials.insert(desc.name.as_str(), Arc::new(material));
        }
        let default_material = Arc::new(Material::new(device));
        default_material.commit();

        let surface = |desc: &SurfaceDesc| -> Result<Arc<Surface>, SceneError> {
            let material = match &desc.material {
                Some(name) => materials
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| SceneError::UnknownReference {
                        kind: "material",
                        name: name.clone(),
                    })?,
                None => default_material.clone(),
            };
            let surface = Surface::new(device);
            surface.set_param("geometry", build_geometry(&desc.geometry, device)?);
            surface.set_param("material", material);
            if let Some(id) = desc.id {
                surface.set_param("id", id);
            }
            surface.commit();
            Ok(Arc::new(surface))
        };

        let mut groups = Vec::with_capacity(self.groups.len());
        for desc in &self.groups {
            let group = Group::new(device);
            if !desc.surfaces.is_empty() {
                let surfaces = desc.surfaces.iter().map(&surface).collect::<Result<Vec<_>, _>>()?;
                group.set_param("surface", Arc::new(ObjectArray::from_objects(device, surfaces)));
            }
            if !desc.volumes.is_empty() {
                let volumes = desc.volumes.iter().map(|v| build_volume(v, device));
                group.set_param("volume", Arc::new(ObjectArray::from_objects(device, volumes)));
            }
            group.commit();
            groups.push((desc.name.clone(), Arc::new(group)));
        }

        let mut world = World::new(device);
        if let Some(id) = self.id {
            world.set_param("id", id);
        }

        let instances = if self.instances.is_empty() {
            None
        } else {
            let mut handles = Vec::with_capacity(self.instances.len());
            for desc in &self.instances {
                let group = groups
                    .iter()
                    .find(|(name, _)| *name == desc.group)
                    .map(|(_, g)| g.clone())
                    .ok_or_else(|| SceneError::UnknownReference {
                        kind: "group",
                        name: desc.group.clone(),
                    })?;
                let instance = Instance::new(device);
                instance.set_param("group", group);
                instance.set_param("transform", desc.transform.to_matrix());
                if let Some(id) = desc.id {
                    instance.set_param("id", id);
                }
                instance.commit();
                handles.push(Arc::new(instance));
            }
            let array = Arc::new(ObjectArray::from_objects(device, handles));
            world.set_param("instance", array.clone());
            Some(array)
        };

        let surfaces = if self.surfaces.is_empty() {
            None
        } else {
            let handles = self.surfaces.iter().map(&surface).collect::<Result<Vec<_>, _>>()?;
            let array = Arc::new(ObjectArray::from_objects(device, handles));
            world.set_param("surface", array.clone());
            Some(array)
        };

        let volumes = if self.volumes.is_empty() {
            None
        } else {
            let handles = self.volumes.iter().map(|v| build_volume(v, device));
            let array = Arc::new(ObjectArray::from_objects(device, handles));
            world.set_param("volume", array.clone());
            Some(array)
        };

        world.commit();

        let mut renderer = Renderer::new(device);
        if let Some(background) = self.renderer.background {
            renderer.set_param("background", background);
        }
        if let Some(ambient) = self.renderer.ambient_radiance {
            renderer.set_param("ambientRadiance", ambient);
        }
        if let Some(mode) = &self.renderer.mode {
            renderer.set_param("mode", mode.as_str());
        }
        renderer.commit();

        let mut camera = Camera::new(&self.camera.projection, device);
        camera.set_param("position", self.camera.position);
        camera.set_param("direction", self.camera.direction);
        camera.set_param("up", self.camera.up);
        if let Some(fovy) = self.camera.fovy {
            camera.set_param("fovy", fovy);
        }
        if let Some(height) = self.camera.height {
            camera.set_param("height", height);
        }
        camera.commit();

        tracing::info!(
            groups = groups.len(),
            instances = world.instances().len(),
            "scene built"
        );

        Ok(BuiltScene {
            world,
            renderer,
            camera,
            groups,
            instances,
            surfaces,
            volumes,
        })
    }
}

fn build_geometry(desc: &GeometryDesc, device: &Arc<DeviceState>) -> Result<Arc<Geometry>, SceneError> {
    let geometry = match desc {
        GeometryDesc::Sphere {
            positions,
            radius,
            radii,
        } => {
            if positions.is_empty() {
                return Err(SceneError::InvalidGeometry("sphere without positions".into()));
            }
            let geometry = Geometry::sphere(device);
            geometry.set_param("vertex.position", positions.clone());
            if let Some(radii) = radii {
                if radii.len() != positions.len() {
                    return Err(SceneError::InvalidGeometry(format!(
                        "{} radii for {} spheres",
                        radii.len(),
                        positions.len()
                    )));
                }
                geometry.set_param("vertex.radius", radii.clone());
            }
            if let Some(radius) = radius {
                geometry.set_param("radius", *radius);
            }
            geometry
        }
        GeometryDesc::Triangle { positions, indices } => {
            let indices = match indices {
                Some(indices) => indices.clone(),
                None if positions.len() % 3 == 0 => (0..positions.len() as u32 / 3)
                    .map(|i| UVec3::new(3 * i, 3 * i + 1, 3 * i + 2))
                    .collect(),
                None => {
                    return Err(SceneError::InvalidGeometry(format!(
                        "{} vertices is not a whole number of triangles",
                        positions.len()
                    )));
                }
            };
            if indices.is_empty() {
                return Err(SceneError::InvalidGeometry("triangle mesh without triangles".into()));
            }
            if let Some(bad) = indices
                .iter()
                .find(|tri| tri.max_element() as usize >= positions.len())
            {
                return Err(SceneError::InvalidGeometry(format!(
                    "triangle {bad} indexes past {} vertices",
                    positions.len()
                )));
            }
            let geometry = Geometry::triangle(device);
            geometry.set_param("vertex.position", positions.clone());
            geometry.set_param("primitive.index", indices);
            geometry
        }
    };
    geometry.commit();
    Ok(Arc::new(geometry))
}

fn build_volume(desc: &VolumeDesc, device: &Arc<DeviceState>) -> Arc<Volume> {
    let volume = Volume::new(device);
    volume.set_param("bounds.min", desc.min);
    volume.set_param("bounds.max", desc.max);
    volume.set_param("color", desc.color);
    volume.set_param("density", desc.density);
    if let Some(id) = desc.id {
        volume.set_param("id", id);
    }
    volume.commit();
    Arc::new(volume)
}
