//! Orbit camera for the viewer
//!
//! Yaw/pitch around a target point, turned into `ViewData` each frame.

use softraster::rasterizer::{RenderError, Vec3, ViewData};

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            yaw: 0.0,
            pitch: 0.0,
            distance,
            fov: 60.0,
            min_z: 0.1,
            max_z: 100.0,
        }
    }

    /// World position; yaw = pitch = 0 sits on -Z looking toward +Z
    pub fn eye(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            -self.pitch.cos() * self.yaw.cos(),
        );
        self.target + offset * self.distance
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dy;
        self.pitch = (self.pitch + dx).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Scale the distance, kept between the near plane and half the far plane
    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(self.min_z * 10.0, self.max_z * 0.5);
    }

    pub fn view_data(&self, width: usize, height: usize) -> Result<ViewData, RenderError> {
        ViewData::look_at(width, height, self.fov, self.min_z, self.max_z, self.eye(), self.target)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let mut cam = Self::new(Vec3::new(0.0, 0.5, 0.0), 7.0);
        cam.rotate(0.45, 0.6);
        cam
    }
}
