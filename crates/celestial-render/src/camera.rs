//! A perspective camera circling a target point.

use glam::{Mat4, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    /// Rotation about +Y in radians; 0 puts the camera on +Z.
    pub yaw: f32,
    /// Elevation above the XZ plane in radians.
    pub pitch: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            ..Default::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vec3::new(sin_yaw * cos_pitch, sin_pitch, cos_yaw * cos_pitch) * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        self.aspect_ratio = width as f32 / height.max(1) as f32;
    }

    /// Advance the orbit by `radians` of yaw.
    pub fn orbit(&mut self, radians: f32) {
        self.yaw = (self.yaw + radians).rem_euclid(std::f32::consts::TAU);
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 10.0,
            yaw: 0.0,
            pitch: 0.2,
            fov_y: std::f32::consts::FRAC_PI_4,
            aspect_ratio: 4.0 / 3.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at_distance() {
        let mut camera = OrbitCamera::new(Vec3::new(1.0, 0.0, 0.0), 5.0);
        for _ in 0..8 {
            camera.orbit(0.7);
            let d = (camera.position() - camera.target).length();
            assert!((d - 5.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_zero_yaw_pitch_sits_on_positive_z() {
        let camera = OrbitCamera {
            pitch: 0.0,
            ..OrbitCamera::new(Vec3::ZERO, 10.0)
        };
        assert!((camera.position() - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = OrbitCamera::new(Vec3::new(2.0, 3.0, -1.0), 8.0);
        let clip = camera.view_projection_matrix() * camera.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
