use glam::{UVec2, Vec2, Vec4};
use prism_kernel::World;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::camera::Camera;
use crate::renderer::Renderer;
use crate::sample::PixelSample;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid frame size {0}x{1}")]
    InvalidSize(u32, u32),
}

/// Framebuffer of pixel samples, row 0 at the top.
#[derive(Debug)]
pub struct Frame {
    size: UVec2,
    samples: Vec<PixelSample>,
    duration: Option<Duration>,
}

impl Frame {
    pub fn new(size: UVec2) -> Result<Self, FrameError> {
        if size.x == 0 || size.y == 0 {
            return Err(FrameError::InvalidSize(size.x, size.y));
        }
        Ok(Self {
            size,
            samples: vec![PixelSample::default(); size.x as usize * size.y as usize],
            duration: None,
        })
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Sample every pixel center. Rows run in parallel; each sample only reads
    /// the committed world, so the result does not depend on scheduling.
    pub fn render(&mut self, world: &World, renderer: &Renderer, camera: &Camera) {
        let _span = tracing::info_span!("frame_render", width = self.size.x, height = self.size.y)
            .entered();
        if world.needs_commit() {
            tracing::warn!("rendering a world with uncommitted changes");
        }

        let start = Instant::now();
        let size = self.size.as_vec2();
        let width = self.size.x as usize;
        self.samples
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, sample) in row.iter_mut().enumerate() {
                    let screen = Vec2::new(
                        (x as f32 + 0.5) / size.x,
                        1.0 - (y as f32 + 0.5) / size.y,
                    );
                    *sample = renderer.render_sample(screen, camera.create_ray(screen), world);
                }
            });

        let elapsed = start.elapsed();
        self.duration = Some(elapsed);
        tracing::info!(elapsed_ms = elapsed.as_secs_f64() * 1000.0, "frame rendered");
    }

    pub fn sample(&self, x: u32, y: u32) -> Option<&PixelSample> {
        if x >= self.size.x || y >= self.size.y {
            return None;
        }
        self.samples.get((y * self.size.x + x) as usize)
    }

    pub fn samples(&self) -> &[PixelSample] {
        &self.samples
    }

    pub fn color(&self) -> Vec<Vec4> {
        self.samples.iter().map(|s| s.color).collect()
    }

    pub fn depth(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.depth).collect()
    }

    pub fn primitive_id(&self) -> Vec<u32> {
        self.samples.iter().map(|s| s.prim_id).collect()
    }

    pub fn object_id(&self) -> Vec<u32> {
        self.samples.iter().map(|s| s.obj_id).collect()
    }

    pub fn instance_id(&self) -> Vec<u32> {
        self.samples.iter().map(|s| s.inst_id).collect()
    }

    /// Color channel clamped and quantized to 8-bit RGBA, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.samples
            .iter()
            .flat_map(|s| {
                s.color
                    .clamp(Vec4::ZERO, Vec4::ONE)
                    .to_array()
                    .map(|c| (c * 255.0).round() as u8)
            })
            .collect()
    }

    /// Wall time of the last `render`, if any.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}
