//! Light definitions for the scene.

use glam::Vec3;

/// An omnidirectional light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    /// Light position in world space
    pub position: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Light color
    pub color: Vec3,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 0.0),
            intensity: 1.0,
            color: Vec3::ONE,
        }
    }
}

/// A cone-shaped light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    /// Light position in world space
    pub position: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Light direction
    pub direction: Vec3,
    /// Inner cone angle cosine
    pub cut_off: f32,
    /// Light color
    pub color: Vec3,
    /// Outer cone angle cosine
    pub outer_cut_off: f32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 2.0),
            intensity: 2.0,
            direction: Vec3::NEG_Y,
            cut_off: 0.9,
            color: Vec3::new(1.0, 1.0, 0.0),
            outer_cut_off: 0.8,
        }
    }
}

/// Directional sky light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sun {
    pub enabled: bool,
    /// Direction towards the sun. Not required to be normalized.
    pub direction: Vec3,
}

impl Default for Sun {
    fn default() -> Self {
        Self {
            enabled: true,
            direction: Vec3::new(0.5, 1.0, -0.5),
        }
    }
}
