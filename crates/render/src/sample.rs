use glam::Vec4;
use prism_common::INVALID_ID;

/// Result of sampling one primary ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub color: Vec4,
    /// Distance to the first contribution, `+inf` when nothing was hit.
    pub depth: f32,
    pub prim_id: u32,
    pub obj_id: u32,
    pub inst_id: u32,
}

impl Default for PixelSample {
    fn default() -> Self {
        Self {
            color: Vec4::ZERO,
            depth: f32::INFINITY,
            prim_id: INVALID_ID,
            obj_id: INVALID_ID,
            inst_id: INVALID_ID,
        }
    }
}

impl PixelSample {
    /// Sample for a ray that escaped the scene.
    pub fn background(color: Vec4) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn is_background(&self) -> bool {
        self.depth == f32::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ids_are_unset() {
        let s = PixelSample::default();
        assert_eq!(s.prim_id, !0u32);
        assert_eq!(s.obj_id, !0u32);
        assert_eq!(s.inst_id, !0u32);
        assert!(s.is_background());
    }

    #[test]
    fn background_sample_keeps_color() {
        let s = PixelSample::background(Vec4::new(0.1, 0.2, 0.3, 1.0));
        assert_eq!(s.color, Vec4::new(0.1, 0.2, 0.3, 1.0));
        assert_eq!(s.depth, f32::INFINITY);
    }
}
