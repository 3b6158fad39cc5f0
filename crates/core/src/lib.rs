//! Core utilities shared by every Lumen crate.
//!
//! This crate provides:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timing and FPS counting
//! - Runtime configuration

mod config;
mod error;
mod logging;
mod timer;

pub use config::{Config, MAX_FRAMES_IN_FLIGHT, PresentMode};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::{FpsCounter, FpsSample, Timer};
