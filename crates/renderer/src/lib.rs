//! Frame lifecycle for the sphere ray tracer.
//!
//! This crate drives the per-frame cycle:
//! - Frame slot rotation and swapchain rebuilds ([`scheduler`])
//! - GPU buffer layouts shared with the shaders ([`gpu_layout`])
//! - The Vulkan backend behind the scheduler ([`context`])
//! - UI drawn over the traced image ([`overlay`])

pub mod context;
mod error;
pub mod frame_resources;
pub mod gpu_layout;
pub mod overlay;
pub mod pipeline;
pub mod renderer;
pub mod scheduler;

pub use context::RenderContext;
pub use error::{FrameStage, RendererError, RendererResult};
pub use gpu_layout::{FrameUniforms, MAX_SPHERES, SceneGpu, WriteReport};
pub use overlay::{Overlay, PanelOverlay, PanelRect};
pub use renderer::Renderer;
pub use scheduler::{FrameBackend, FrameInput, FrameScheduler, FrameStatus, SlotState};
