//! Serde model of a scene file.
//!
//! ```yaml
//! renderer: { background: [0.1, 0.1, 0.2, 1.0], mode: default }
//! camera: { position: [0, 1, 5], direction: [0, 0, -1] }
//! materials:
//!   - { name: red, color: [1, 0, 0] }
//! groups:
//!   - name: ball
//!     surfaces:
//!       - { material: red, geometry: { type: sphere, positions: [[0, 0, 0]], radius: 1 } }
//! instances:
//!   - { group: ball, transform: { translation: [2, 0, 0] } }
//! ```
//!
//! Top-level `surfaces`/`volumes` attach directly to the world.

use crate::SceneError;
use glam::{Mat4, Quat, UVec3, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDesc {
    pub id: Option<u32>,
    pub renderer: RendererDesc,
    pub camera: CameraDesc,
    pub materials: Vec<MaterialDesc>,
    pub groups: Vec<GroupDesc>,
    pub instances: Vec<InstanceDesc>,
    pub surfaces: Vec<SurfaceDesc>,
    pub volumes: Vec<VolumeDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RendererDesc {
    pub background: Option<Vec4>,
    pub ambient_radiance: Option<f32>,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDesc {
    /// `perspective` or `orthographic`.
    pub projection: String,
    pub position: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
    pub fovy: Option<f32>,
    pub height: Option<f32>,
}

impl Default for CameraDesc {
    fn default() -> Self {
        Self {
            projection: "perspective".into(),
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            fovy: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDesc {
    pub name: String,
    #[serde(default = "default_material_color")]
    pub color: Vec3,
    #[serde(default = "one")]
    pub opacity: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupDesc {
    pub name: String,
    #[serde(default)]
    pub surfaces: Vec<SurfaceDesc>,
    #[serde(default)]
    pub volumes: Vec<VolumeDesc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDesc {
    #[serde(default)]
    pub id: Option<u32>,
    /// Material name; the default material when absent.
    #[serde(default)]
    pub material: Option<String>,
    pub geometry: GeometryDesc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryDesc {
    Sphere {
        positions: Vec<Vec3>,
        #[serde(default)]
        radius: Option<f32>,
        #[serde(default)]
        radii: Option<Vec<f32>>,
    },
    Triangle {
        positions: Vec<Vec3>,
        /// Consecutive vertex triples when absent.
        #[serde(default)]
        indices: Option<Vec<UVec3>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDesc {
    #[serde(default)]
    pub id: Option<u32>,
    pub min: Vec3,
    pub max: Vec3,
    #[serde(default = "one3")]
    pub color: Vec3,
    #[serde(default = "one")]
    pub density: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDesc {
    pub group: String,
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub transform: TransformDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDesc {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TransformDesc {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl TransformDesc {
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation.normalize(), self.translation)
    }
}

fn default_material_color() -> Vec3 {
    prism_kernel::material::DEFAULT_MATERIAL_COLOR
}

fn one() -> f32 {
    1.0
}

fn one3() -> Vec3 {
    Vec3::ONE
}

impl SceneDesc {
    /// Load a description, picking the format from the file extension
    /// (`.yaml`, `.yml` or `.json`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let desc = match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&std::fs::read_to_string(path)?)?,
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?)?,
            _ => return Err(SceneError::UnsupportedExtension(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), "scene description loaded");
        Ok(desc)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, SceneError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, SceneError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Built-in scene: a ground quad and a sphere attached to the world, three
    /// instances of a two-sphere group, and a slab of fog.
    pub fn demo() -> Self {
        let mat = |name: &str, color: Vec3| MaterialDesc {
            name: name.into(),
            color,
            opacity: 1.0,
        };
        let ball = |x: f32, material: &str, id: u32| SurfaceDesc {
            id: Some(id),
            material: Some(material.into()),
            geometry: GeometryDesc::Sphere {
                positions: vec![Vec3::new(x, 0.5, 0.0)],
                radius: Some(0.5),
                radii: None,
            },
        };
        let at = |x: f32, z: f32| TransformDesc {
            translation: Vec3::new(x, 0.0, z),
            ..TransformDesc::default()
        };

        Self {
            id: Some(0),
            renderer: RendererDesc {
                background: Some(Vec4::new(0.05, 0.05, 0.1, 1.0)),
                ambient_radiance: Some(1.0),
                mode: None,
            },
            camera: CameraDesc {
                position: Vec3::new(0.0, 2.0, 7.0),
                direction: Vec3::new(0.0, -0.25, -1.0),
                fovy: Some(50f32.to_radians()),
                ..CameraDesc::default()
            },
            materials: vec![
                mat("ground", Vec3::new(0.6, 0.6, 0.55)),
                mat("red", Vec3::new(0.9, 0.2, 0.15)),
                mat("blue", Vec3::new(0.2, 0.35, 0.9)),
                mat("gold", Vec3::new(0.95, 0.75, 0.2)),
            ],
            groups: vec![GroupDesc {
                name: "pair".into(),
                surfaces: vec![ball(-0.6, "red", 1), ball(0.6, "blue", 2)],
                volumes: vec![],
            }],
            instances: vec![
                InstanceDesc {
                    group: "pair".into(),
                    id: Some(10),
                    transform: at(-2.5, -1.0),
                },
                InstanceDesc {
                    group: "pair".into(),
                    id: Some(11),
                    transform: at(0.0, -2.0),
                },
                InstanceDesc {
                    group: "pair".into(),
                    id: Some(12),
                    transform: at(2.5, -1.0),
                },
            ],
            surfaces: vec![
                SurfaceDesc {
                    id: Some(100),
                    material: Some("ground".into()),
                    geometry: GeometryDesc::Triangle {
                        positions: vec![
                            Vec3::new(-6.0, 0.0, -6.0),
                            Vec3::new(6.0, 0.0, -6.0),
                            Vec3::new(6.0, 0.0, 6.0),
                            Vec3::new(-6.0, 0.0, 6.0),
                        ],
                        indices: Some(vec![UVec3::new(0, 2, 1), UVec3::new(0, 3, 2)]),
                    },
                },
                SurfaceDesc {
                    id: Some(101),
                    material: Some("gold".into()),
                    geometry: GeometryDesc::Sphere {
                        positions: vec![Vec3::new(0.0, 0.8, 1.5)],
                        radius: Some(0.8),
                        radii: None,
                    },
                },
            ],
            volumes: vec![VolumeDesc {
                id: Some(200),
                min: Vec3::new(-6.0, 0.0, -6.0),
                max: Vec3::new(6.0, 0.3, 6.0),
                color: Vec3::new(0.8, 0.85, 1.0),
                density: 0.6,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_defaults_are_filled() {
        let desc = SceneDesc::from_yaml_str(
            r#"
materials:
  - name: red
    color: [1, 0, 0]
surfaces:
  - material: red
    geometry: { type: sphere, positions: [[0, 0, -3]], radius: 1 }
"#,
        )
        .unwrap();
        assert_eq!(desc.camera, CameraDesc::default());
        assert_eq!(desc.materials[0].opacity, 1.0);
        assert_eq!(desc.surfaces[0].id, None);
        assert!(matches!(
            desc.surfaces[0].geometry,
            GeometryDesc::Sphere { radius: Some(r), .. } if r == 1.0
        ));
        assert!(desc.instances.is_empty());
    }

    #[test]
    fn json_instance_transform() {
        let desc = SceneDesc::from_json_str(
            r#"{
                "groups": [{ "name": "g" }],
                "instances": [{ "group": "g", "id": 3, "transform": { "translation": [1, 2, 3] } }],
                "renderer": { "ambientRadiance": 0.5, "mode": "normal" }
            }"#,
        )
        .unwrap();
        let inst = &desc.instances[0];
        assert_eq!(inst.id, Some(3));
        assert_eq!(
            inst.transform.to_matrix(),
            Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(desc.renderer.ambient_radiance, Some(0.5));
        assert_eq!(desc.renderer.mode.as_deref(), Some("normal"));
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = SceneDesc::from_yaml_str("surfaces: [ { geometry: { type: cone } } ]");
        assert!(matches!(err, Err(SceneError::Yaml(_))));
    }

    #[test]
    fn load_by_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let demo = SceneDesc::demo();

        let yaml = tmp.path().join("demo.yaml");
        std::fs::write(&yaml, demo.to_yaml_string().unwrap()).unwrap();
        assert_eq!(SceneDesc::load(&yaml).unwrap(), demo);

        let json = tmp.path().join("demo.JSON");
        std::fs::write(&json, serde_json::to_string(&demo).unwrap()).unwrap();
        assert_eq!(SceneDesc::load(&json).unwrap(), demo);

        let toml = tmp.path().join("demo.toml");
        std::fs::write(&toml, "").unwrap();
        assert!(matches!(
            SceneDesc::load(&toml),
            Err(SceneError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = SceneDesc::load(tmp.path().join("nope.yml"));
        assert!(matches!(err, Err(SceneError::Io(_))));
    }
}
