//! Perspective camera

use genview_core::{Mat4, Vec3};

use crate::config::ViewerConfig;

/// Perspective camera looking at a target point
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_degrees,
            aspect,
            near,
            far,
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
        }
    }

    /// Camera with the configured lens for a surface of the given size
    pub fn for_surface(config: &ViewerConfig, width: u32, height: u32) -> Self {
        Self::new(
            config.fov_degrees,
            config.aspect_for(width, height),
            config.near,
            config.far,
        )
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Distance from the camera to its target
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Unit vector from the target toward the camera, if they are apart
    pub fn direction(&self) -> Option<Vec3> {
        (self.position - self.target).try_normalize()
    }

    /// Place the camera `distance` from its target along `direction`
    pub fn place(&mut self, direction: Vec3, distance: f32) {
        let direction = direction.try_normalize().unwrap_or(Vec3::Z);
        self.position = self.target + direction * distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_along_direction() {
        let mut camera = PerspectiveCamera::new(45.0, 1.0, 0.1, 1000.0);
        camera.place(Vec3::ONE, 3.0);
        assert!((camera.distance() - 3.0).abs() < 1e-5);
        assert!(camera.direction().unwrap().abs_diff_eq(Vec3::ONE.normalize(), 1e-6));
    }

    #[test]
    fn test_invalid_aspect_is_ignored() {
        let mut camera = PerspectiveCamera::for_surface(&ViewerConfig::default(), 0, 0);
        assert_eq!(camera.aspect, 1.6);
        camera.set_aspect(0.0);
        camera.set_aspect(f32::NAN);
        assert_eq!(camera.aspect, 1.6);
    }
}
