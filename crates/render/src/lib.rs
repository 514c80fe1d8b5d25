//! Reference renderer: turns rays into pixel samples against a committed
//! [`prism_kernel::World`].
//!
//! # Invariants
//! - The renderer never mutates the world it traces.
//! - Samples depend only on the ray, the renderer settings and world state.

mod camera;
mod frame;
mod renderer;
mod sample;

pub use camera::{Camera, Projection};
pub use frame::{Frame, FrameError};
pub use renderer::{DEFAULT_BACKGROUND, RenderMode, Renderer};
pub use sample::PixelSample;

pub fn crate_info() -> &'static str {
    "prism-render v0.1.0"
}
