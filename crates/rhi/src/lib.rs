//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! Thin RAII wrappers over `ash`:
//! - Instance, physical device selection, and the logical device
//! - Swapchain creation, recreation, acquire and present
//! - Persistently mapped buffers
//! - Descriptor layouts and pools
//! - Shader modules and graphics pipelines
//! - Command pools, command buffers, fences and semaphores

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod shader;
pub mod swapchain;
pub mod sync;

pub use error::{RhiError, RhiResult};

pub use ash::vk;
