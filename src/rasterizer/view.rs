//! Per-frame camera constants consumed by the core

use super::error::RenderError;
use super::math::{mat4_look_at_lh, mat4_mul, mat4_perspective_lh, Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewData {
    pub width: usize,
    pub height: usize,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub target: Vec3,
    /// perspective * look_at, row-major, left-handed
    pub view_projection: Mat4,
    pub camera_direction: Vec3,
    pub camera_translation: Vec3,
}

impl ViewData {
    /// Build view constants for a camera at `eye` looking at `target` (world up is +Y)
    pub fn look_at(
        width: usize,
        height: usize,
        fov: f32,
        min_z: f32,
        max_z: f32,
        eye: Vec3,
        target: Vec3,
    ) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidView("viewport has zero area"));
        }
        if !(min_z > 0.0 && min_z < max_z) {
            return Err(RenderError::InvalidView("depth range must satisfy 0 < min_z < max_z"));
        }
        if !(fov > 0.0 && fov < 180.0) {
            return Err(RenderError::InvalidView("fov must be within (0, 180) degrees"));
        }
        let forward = target - eye;
        if forward.len() == 0.0 {
            return Err(RenderError::InvalidView("eye and target coincide"));
        }
        if forward.normalize().cross(Vec3::UP).len() < 1e-6 {
            return Err(RenderError::InvalidView("view direction is parallel to world up"));
        }

        let aspect = width as f32 / height as f32;
        let projection = mat4_perspective_lh(fov, aspect, min_z, max_z);
        let view = mat4_look_at_lh(eye, target, Vec3::UP);

        Ok(Self {
            width,
            height,
            fov,
            min_z,
            max_z,
            target,
            view_projection: mat4_mul(&projection, &view),
            camera_direction: forward.normalize(),
            camera_translation: eye,
        })
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
