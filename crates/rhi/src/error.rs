//! RHI error types.

use ash::vk;
use thiserror::Error;

/// Error type for everything below the renderer: instance, device, swapchain,
/// pipelines, and GPU memory.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] vk::Result),

    /// Failed to load Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// The presentation surface can no longer be used.
    #[error("Surface lost")]
    SurfaceLost,

    /// The surface currently allows no drawable extent (e.g. minimized window).
    #[error("No drawable extent available (requested {width}x{height})")]
    ExtentUnavailable {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// Shader bytecode could not be loaded or validated.
    #[error("Shader error: {0}")]
    ShaderCompile(String),

    /// The driver rejected a pipeline.
    #[error("Pipeline creation failed: {0}")]
    PipelineCreate(String),

    /// Swapchain error
    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// Invalid handle, out-of-range write, or poisoned lock
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),
}

impl RhiError {
    /// Maps surface-specific result codes onto their dedicated variants.
    pub fn from_surface_result(result: vk::Result) -> Self {
        match result {
            vk::Result::ERROR_SURFACE_LOST_KHR => RhiError::SurfaceLost,
            other => RhiError::VulkanError(other),
        }
    }
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_lost_mapping() {
        assert!(matches!(
            RhiError::from_surface_result(vk::Result::ERROR_SURFACE_LOST_KHR),
            RhiError::SurfaceLost
        ));
        assert!(matches!(
            RhiError::from_surface_result(vk::Result::ERROR_DEVICE_LOST),
            RhiError::VulkanError(vk::Result::ERROR_DEVICE_LOST)
        ));
    }
}
