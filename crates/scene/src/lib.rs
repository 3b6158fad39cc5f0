//! Scene description consumed by the renderer.
//!
//! This crate provides:
//! - A yaw/pitch fly camera
//! - Point, spot and sun lights
//! - Spheres and the editable scene that owns them
//! - A cursor for editing scene and camera parameters live

pub mod camera;
pub mod editor;
pub mod light;
pub mod scene;

pub use camera::{FlyCamera, MOUSE_SENSITIVITY, MOVE_SPEED};
pub use editor::{Param, ParamEditor};
pub use light::{PointLight, SpotLight, Sun};
pub use scene::{Scene, Sphere};
