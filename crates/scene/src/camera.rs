//! First-person fly camera.

use glam::Vec3;

/// Radians of rotation per pixel of mouse motion.
pub const MOUSE_SENSITIVITY: f32 = 0.005;

/// World units moved per frame while a movement key is held.
pub const MOVE_SPEED: f32 = 0.1;

/// Pitch limit in radians, just short of straight up or down.
pub const PITCH_LIMIT: f32 = 1.5;

/// A yaw/pitch camera with Y up.
///
/// Yaw 0 looks down +Z; yaw π looks down -Z. Forward and right are derived
/// on demand from the angles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlyCamera {
    /// Camera position in world space
    pub position: Vec3,
    /// Rotation about the Y axis, in radians
    pub yaw: f32,
    /// Elevation angle in radians, clamped to `±PITCH_LIMIT`
    pub pitch: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 5.0),
            yaw: 3.14,
            pitch: 0.0,
        }
    }
}

impl FlyCamera {
    /// Creates a camera at the default pose.
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        )
        .normalize_or_zero()
    }

    /// Unit vector to the camera's right, always horizontal.
    pub fn right(&self) -> Vec3 {
        Vec3::Y.cross(self.forward()).normalize_or_zero()
    }

    /// Walks `forward` units along the view direction flattened onto the XZ
    /// plane and strafes `right` units sideways. Height never changes.
    pub fn move_by(&mut self, forward: f32, right: f32) {
        let fwd = self.forward();
        let walk = Vec3::new(fwd.x, 0.0, fwd.z).normalize_or_zero();
        self.position += walk * forward + self.right() * right;
    }

    /// Adds to yaw and pitch, then clamps pitch.
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Applies a mouse delta in pixels. Screen Y grows downward, so the
    /// pitch delta is inverted.
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.rotate(dx * MOUSE_SENSITIVITY, -dy * MOUSE_SENSITIVITY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_pose() {
        let camera = FlyCamera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 2.0, 5.0));
        assert_relative_eq!(camera.yaw, 3.14);
        assert_relative_eq!(camera.pitch, 0.0);
    }

    #[test]
    fn test_yaw_pi_faces_negative_z() {
        let camera = FlyCamera {
            yaw: std::f32::consts::PI,
            ..FlyCamera::default()
        };
        let forward = camera.forward();
        assert_relative_eq!(forward.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(forward.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(forward.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_forward_is_unit_length() {
        let camera = FlyCamera {
            yaw: 0.7,
            pitch: -0.4,
            ..FlyCamera::default()
        };
        assert_relative_eq!(camera.forward().length(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_right_is_horizontal_and_orthogonal() {
        let camera = FlyCamera {
            yaw: 1.2,
            pitch: 0.9,
            ..FlyCamera::default()
        };
        let right = camera.right();
        assert_relative_eq!(right.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(right.dot(camera.forward()), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_move_forward_keeps_height() {
        let mut camera = FlyCamera {
            pitch: 1.0,
            ..FlyCamera::default()
        };
        let start = camera.position;
        camera.move_by(1.0, 0.0);

        assert_relative_eq!(camera.position.y, start.y);
        let travelled = (camera.position - start).length();
        assert_relative_eq!(travelled, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_strafe_moves_along_right() {
        let mut camera = FlyCamera::default();
        let start = camera.position;
        let right = camera.right();
        camera.move_by(0.0, 2.0);
        let delta = camera.position - start;
        assert_relative_eq!(delta.x, right.x * 2.0, epsilon = 1e-5);
        assert_relative_eq!(delta.z, right.z * 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_pitch_clamps() {
        let mut camera = FlyCamera::default();
        camera.rotate(0.0, 10.0);
        assert_relative_eq!(camera.pitch, PITCH_LIMIT);
        assert_relative_eq!(camera.forward().y, 1.5_f32.sin(), epsilon = 1e-5);

        camera.rotate(0.0, -20.0);
        assert_relative_eq!(camera.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn test_yaw_is_unbounded() {
        let mut camera = FlyCamera::default();
        camera.rotate(10.0, 0.0);
        assert_relative_eq!(camera.yaw, 13.14, epsilon = 1e-5);
    }

    #[test]
    fn test_look_inverts_vertical_delta() {
        let mut camera = FlyCamera::default();
        camera.look(100.0, 40.0);
        assert_relative_eq!(camera.yaw, 3.14 + 0.5, epsilon = 1e-5);
        assert_relative_eq!(camera.pitch, -0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_straight_up_walk_is_zero() {
        // At the pole the flattened forward vanishes; walking must not
        // produce NaN.
        let mut camera = FlyCamera {
            pitch: std::f32::consts::FRAC_PI_2,
            ..FlyCamera::default()
        };
        camera.move_by(1.0, 0.0);
        assert!(camera.position.is_finite());
    }
}
