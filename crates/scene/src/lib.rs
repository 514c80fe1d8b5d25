//! Scene descriptions: a serde model of a whole scene (objects, renderer and
//! camera settings) and the code that turns it into committed kernel objects.
//!
//! # Invariants
//! - `build` commits leaves before the objects that reference them.
//! - A description that builds once builds identically again.

mod build;
mod desc;

pub use build::BuiltScene;
pub use desc::{
    CameraDesc, GeometryDesc, GroupDesc, InstanceDesc, MaterialDesc, RendererDesc, SceneDesc,
    SurfaceDesc, TransformDesc, VolumeDesc,
};

use std::path::PathBuf;

/// Errors from loading or building a scene description.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported scene file extension: {0}")]
    UnsupportedExtension(PathBuf),
    #[error("unknown {kind} '{name}'")]
    UnknownReference { kind: &'static str, name: String },
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

pub fn crate_info() -> &'static str {
    "prism-scene v0.1.0"
}
