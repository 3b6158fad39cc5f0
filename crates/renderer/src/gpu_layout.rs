//! Shader-visible buffer layouts.
//!
//! These structures must match the fragment shader's `FrameUniforms`
//! (binding 0, std140) and `SceneData` (binding 1, std430) blocks exactly.
//! Every field is `f32` or `i32` and every `vec3` is followed by a scalar,
//! so `#[repr(C)]` produces the same offsets the shader expects.

use bytemuck::{Pod, Zeroable};
use lumen_scene::{FlyCamera, PointLight, Scene, Sphere, SpotLight};

/// Capacity of the sphere array in [`SceneGpu`].
pub const MAX_SPHERES: usize = 100;

/// Per-frame constants (binding 0).
///
/// # Memory Layout
///
/// - Offset 0: resolution (8 bytes)
/// - Offset 8: time (4 bytes)
/// - Offset 12: sun_enabled (4 bytes)
/// - Offset 16: camera position + padding (16 bytes)
/// - Offset 32: camera direction + padding (16 bytes)
/// - Total size: 48 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// Render target size in pixels.
    pub resolution: [f32; 2],
    /// Seconds since startup.
    pub time: f32,
    /// 1.0 when the sun contributes light, 0.0 otherwise.
    pub sun_enabled: f32,
    pub camera_position: [f32; 3],
    pub _pad0: f32,
    /// Unit view direction.
    pub camera_direction: [f32; 3],
    pub _pad1: f32,
}

impl FrameUniforms {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub fn new(resolution: [f32; 2], time: f32, camera: &FlyCamera, sun_enabled: bool) -> Self {
        Self {
            resolution,
            time,
            sun_enabled: if sun_enabled { 1.0 } else { 0.0 },
            camera_position: camera.position.to_array(),
            _pad0: 0.0,
            camera_direction: camera.forward().to_array(),
            _pad1: 0.0,
        }
    }
}

/// One sphere, 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SphereGpu {
    pub center: [f32; 3],
    pub radius: f32,
    pub color: [f32; 3],
    pub roughness: f32,
}

impl From<&Sphere> for SphereGpu {
    fn from(sphere: &Sphere) -> Self {
        Self {
            center: sphere.center.to_array(),
            radius: sphere.radius,
            color: sphere.color.to_array(),
            roughness: sphere.roughness,
        }
    }
}

/// Point light, 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PointLightGpu {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub _pad0: f32,
}

impl From<&PointLight> for PointLightGpu {
    fn from(light: &PointLight) -> Self {
        Self {
            position: light.position.to_array(),
            intensity: light.intensity,
            color: light.color.to_array(),
            _pad0: 0.0,
        }
    }
}

/// Spot light, 48 bytes. Cut-offs are cosines.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SpotLightGpu {
    pub position: [f32; 3],
    pub intensity: f32,
    pub direction: [f32; 3],
    pub cut_off: f32,
    pub color: [f32; 3],
    pub outer_cut_off: f32,
}

impl From<&SpotLight> for SpotLightGpu {
    fn from(light: &SpotLight) -> Self {
        Self {
            position: light.position.to_array(),
            intensity: light.intensity,
            direction: light.direction.to_array(),
            cut_off: light.cut_off,
            color: light.color.to_array(),
            outer_cut_off: light.outer_cut_off,
        }
    }
}

/// Scene storage buffer contents (binding 1).
///
/// # Memory Layout
///
/// - Offset 0: spheres (100 * 32 = 3200 bytes)
/// - Offset 3200: point light (32 bytes)
/// - Offset 3232: spot light (48 bytes)
/// - Offset 3280: sphere_count (4 bytes)
/// - Offset 3284: sun_direction (12 bytes)
/// - Total size: 3296 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneGpu {
    pub spheres: [SphereGpu; MAX_SPHERES],
    pub point_light: PointLightGpu,
    pub spot_light: SpotLightGpu,
    /// Number of leading entries of `spheres` the shader reads.
    pub sphere_count: i32,
    pub sun_direction: [f32; 3],
}

impl Default for SceneGpu {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl SceneGpu {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Packs `scene`, keeping the first [`MAX_SPHERES`] spheres.
    ///
    /// Unused sphere entries are zeroed, so identical scenes always produce
    /// identical bytes.
    pub fn from_scene(scene: &Scene) -> (Self, WriteReport) {
        let mut gpu = Self::zeroed();

        let written = scene.spheres.len().min(MAX_SPHERES);
        for (dst, src) in gpu.spheres.iter_mut().zip(&scene.spheres) {
            *dst = SphereGpu::from(src);
        }

        gpu.sphere_count = written as i32;
        gpu.point_light = PointLightGpu::from(&scene.point_light);
        gpu.spot_light = SpotLightGpu::from(&scene.spot_light);
        gpu.sun_direction = scene.sun.direction.to_array();

        let report = WriteReport {
            spheres_written: written,
            spheres_dropped: scene.spheres.len() - written,
        };
        (gpu, report)
    }
}

/// What a frame slot write actually stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub spheres_written: usize,
    /// Spheres past [`MAX_SPHERES`] that the GPU will not see this frame.
    pub spheres_dropped: usize,
}

impl WriteReport {
    /// Whether any sphere was dropped.
    #[inline]
    pub fn truncated(&self) -> bool {
        self.spheres_dropped > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;
    use std::mem::offset_of;

    #[test]
    fn test_frame_uniforms_layout() {
        assert_eq!(FrameUniforms::SIZE, 48);
        assert_eq!(offset_of!(FrameUniforms, time), 8);
        assert_eq!(offset_of!(FrameUniforms, sun_enabled), 12);
        assert_eq!(offset_of!(FrameUniforms, camera_position), 16);
        assert_eq!(offset_of!(FrameUniforms, camera_direction), 32);
    }

    #[test]
    fn test_light_and_sphere_sizes() {
        assert_eq!(std::mem::size_of::<SphereGpu>(), 32);
        assert_eq!(std::mem::size_of::<PointLightGpu>(), 32);
        assert_eq!(std::mem::size_of::<SpotLightGpu>(), 48);
        assert_eq!(offset_of!(SphereGpu, color), 16);
        assert_eq!(offset_of!(SpotLightGpu, direction), 16);
        assert_eq!(offset_of!(SpotLightGpu, color), 32);
    }

    #[test]
    fn test_scene_gpu_layout() {
        assert_eq!(SceneGpu::SIZE, 3296);
        assert_eq!(offset_of!(SceneGpu, point_light), 3200);
        assert_eq!(offset_of!(SceneGpu, spot_light), 3232);
        assert_eq!(offset_of!(SceneGpu, sphere_count), 3280);
        assert_eq!(offset_of!(SceneGpu, sun_direction), 3284);
    }

    #[test]
    fn test_frame_uniforms_from_camera() {
        let camera = FlyCamera::default();
        let uniforms = FrameUniforms::new([1280.0, 720.0], 2.5, &camera, false);
        assert_eq!(uniforms.resolution, [1280.0, 720.0]);
        assert_relative_eq!(uniforms.time, 2.5);
        assert_relative_eq!(uniforms.sun_enabled, 0.0);
        assert_eq!(uniforms.camera_position, [0.0, 2.0, 5.0]);

        let dir = Vec3::from_array(uniforms.camera_direction);
        assert_relative_eq!(dir.length(), 1.0, epsilon = 1e-5);
        assert!(dir.z < -0.99);

        let lit = FrameUniforms::new([1.0, 1.0], 0.0, &camera, true);
        assert_relative_eq!(lit.sun_enabled, 1.0);
    }

    #[test]
    fn test_default_scene_packs_without_truncation() {
        let scene = Scene::default();
        let (gpu, report) = SceneGpu::from_scene(&scene);

        assert_eq!(gpu.sphere_count, 4);
        assert_eq!(report.spheres_written, 4);
        assert!(!report.truncated());
        assert_eq!(gpu.spheres[3].center, [0.0, -101.0, 0.0]);
        assert_eq!(gpu.spheres[4], SphereGpu::default());
        assert_eq!(gpu.spot_light.color, [1.0, 1.0, 0.0]);
        assert_eq!(gpu.sun_direction, [0.5, 1.0, -0.5]);
    }

    #[test]
    fn test_too_many_spheres_truncate() {
        let mut scene = Scene::empty();
        for _ in 0..130 {
            scene.add_sphere();
        }
        let (gpu, report) = SceneGpu::from_scene(&scene);

        assert_eq!(gpu.sphere_count, MAX_SPHERES as i32);
        assert_eq!(report.spheres_written, MAX_SPHERES);
        assert_eq!(report.spheres_dropped, 30);
        assert!(report.truncated());
    }

    #[test]
    fn test_zero_spheres() {
        let (gpu, report) = SceneGpu::from_scene(&Scene::empty());
        assert_eq!(gpu.sphere_count, 0);
        assert_eq!(report, WriteReport::default());
        assert!(gpu.spheres.iter().all(|s| *s == SphereGpu::default()));
    }

    #[test]
    fn test_identical_scenes_pack_identically() {
        let scene = Scene::default();
        let (a, _) = SceneGpu::from_scene(&scene);
        let (b, _) = SceneGpu::from_scene(&scene.clone());
        assert_eq!(bytemuck::bytes_of(&a), bytemuck::bytes_of(&b));
    }
}
