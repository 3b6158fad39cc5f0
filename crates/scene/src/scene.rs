//! Spheres and the editable scene snapshot.

use glam::Vec3;

use crate::light::{PointLight, SpotLight, Sun};

/// A shaded sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    /// Linear RGB albedo
    pub color: Vec3,
    /// 0 is mirror-like, 1 is fully diffuse
    pub roughness: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32, color: Vec3, roughness: f32) -> Self {
        Self {
            center,
            radius,
            color,
            roughness,
        }
    }
}

/// Where [`Scene::add_sphere`] drops new spheres.
pub const SPAWN_POINT: Vec3 = Vec3::new(0.0, 5.0, 0.0);

/// Everything the renderer reads each frame.
///
/// The renderer holds no copy; the caller owns the scene and passes a
/// reference per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub point_light: PointLight,
    pub spot_light: SpotLight,
    pub sun: Sun,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            spheres: vec![
                Sphere::new(Vec3::ZERO, 1.0, Vec3::new(1.0, 0.0, 0.0), 0.5),
                Sphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0, Vec3::new(0.0, 1.0, 0.0), 0.2),
                Sphere::new(Vec3::new(-2.0, 0.0, 0.0), 1.0, Vec3::new(0.0, 0.0, 1.0), 0.8),
                // Floor
                Sphere::new(Vec3::new(0.0, -101.0, 0.0), 100.0, Vec3::splat(0.5), 1.0),
            ],
            point_light: PointLight::default(),
            spot_light: SpotLight::default(),
            sun: Sun::default(),
        }
    }
}

impl Scene {
    /// A scene with no spheres and default lights.
    pub fn empty() -> Self {
        Self {
            spheres: Vec::new(),
            ..Self::default()
        }
    }

    /// Appends a white unit sphere at [`SPAWN_POINT`] and returns its index.
    pub fn add_sphere(&mut self) -> usize {
        self.spheres
            .push(Sphere::new(SPAWN_POINT, 1.0, Vec3::ONE, 0.5));
        self.spheres.len() - 1
    }

    /// Removes the sphere at `index`, if any.
    pub fn remove_sphere(&mut self, index: usize) -> Option<Sphere> {
        (index < self.spheres.len()).then(|| self.spheres.remove(index))
    }

    /// Removes the most recently added sphere, if any.
    pub fn remove_last_sphere(&mut self) -> Option<Sphere> {
        self.spheres.pop()
    }

    /// Flips the sun on or off and returns the new state.
    pub fn toggle_sun(&mut self) -> bool {
        self.sun.enabled = !self.sun.enabled;
        self.sun.enabled
    }

    #[inline]
    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_scene() {
        let scene = Scene::default();
        assert_eq!(scene.sphere_count(), 4);

        let floor = scene.spheres[3];
        assert_eq!(floor.center, Vec3::new(0.0, -101.0, 0.0));
        assert_relative_eq!(floor.radius, 100.0);
        assert_relative_eq!(floor.roughness, 1.0);

        assert_relative_eq!(scene.spheres[1].roughness, 0.2);
        assert_eq!(scene.point_light.position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(scene.spot_light.color, Vec3::new(1.0, 1.0, 0.0));
        assert!(scene.sun.enabled);
    }

    #[test]
    fn test_add_and_remove() {
        let mut scene = Scene::default();
        let index = scene.add_sphere();
        assert_eq!(index, 4);
        assert_eq!(scene.spheres[index].center, SPAWN_POINT);
        assert_eq!(scene.spheres[index].color, Vec3::ONE);

        let removed = scene.remove_last_sphere().unwrap();
        assert_eq!(removed.center, SPAWN_POINT);
        assert_eq!(scene.sphere_count(), 4);

        let red = scene.remove_sphere(0).unwrap();
        assert_eq!(red.color, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(scene.sphere_count(), 3);
        assert!(scene.remove_sphere(10).is_none());
    }

    #[test]
    fn test_remove_from_empty() {
        let mut scene = Scene::empty();
        assert!(scene.remove_last_sphere().is_none());
        assert!(scene.remove_sphere(0).is_none());
    }

    #[test]
    fn test_toggle_sun() {
        let mut scene = Scene::default();
        assert!(!scene.toggle_sun());
        assert!(!scene.sun.enabled);
        assert!(scene.toggle_sun());
    }
}
