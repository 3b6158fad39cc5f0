//! Runtime configuration.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Upper bound on frames the CPU may record ahead of the GPU.
pub const MAX_FRAMES_IN_FLIGHT: usize = 3;

/// Preferred presentation mode. Falls back to FIFO when unsupported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PresentMode {
    /// Vsync, always available.
    Fifo,
    /// Low-latency vsync with a replacing queue.
    #[default]
    Mailbox,
    /// No vsync, may tear.
    Immediate,
}

impl PresentMode {
    /// Returns the lowercase name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            PresentMode::Fifo => "fifo",
            PresentMode::Mailbox => "mailbox",
            PresentMode::Immediate => "immediate",
        }
    }
}

impl fmt::Display for PresentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings for the window, the renderer and logging.
#[derive(Clone, Debug)]
pub struct Config {
    /// Initial window width in pixels.
    pub width: u32,
    /// Initial window height in pixels.
    pub height: u32,
    /// Window title prefix.
    pub title: String,
    /// Number of frame slots (N).
    pub frames_in_flight: usize,
    /// Enable the Khronos validation layer when available.
    pub validation: bool,
    /// Preferred present mode.
    pub present_mode: PresentMode,
    /// Directory holding `raytracer.vert.spv` and `raytracer.frag.spv`.
    pub shader_dir: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Lumen".to_string(),
            frames_in_flight: 2,
            validation: cfg!(debug_assertions),
            present_mode: PresentMode::default(),
            shader_dir: PathBuf::from("shaders/spirv"),
            log_filter: "info,lumen=debug".to_string(),
        }
    }
}

impl Config {
    /// Checks that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero-sized window, an empty title, or
    /// a frame count outside `1..=MAX_FRAMES_IN_FLIGHT`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.title.trim().is_empty() {
            return Err(Error::Config("window title must not be empty".to_string()));
        }
        if !(1..=MAX_FRAMES_IN_FLIGHT).contains(&self.frames_in_flight) {
            return Err(Error::Config(format!(
                "frames in flight must be in 1..={}, got {}",
                MAX_FRAMES_IN_FLIGHT, self.frames_in_flight
            )));
        }
        Ok(())
    }
}
