//! Renderer error types.

use std::fmt;

use ash::vk;
use lumen_rhi::RhiError;
use thiserror::Error;

/// The step of a frame cycle in which a fatal error occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStage {
    WaitForSlot,
    Acquire,
    Reset,
    Record,
    Submit,
    Present,
    Drain,
}

impl FrameStage {
    pub fn name(self) -> &'static str {
        match self {
            FrameStage::WaitForSlot => "wait-for-slot",
            FrameStage::Acquire => "acquire",
            FrameStage::Reset => "reset",
            FrameStage::Record => "record",
            FrameStage::Submit => "submit",
            FrameStage::Present => "present",
            FrameStage::Drain => "drain",
        }
    }
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while creating or driving the renderer.
#[derive(Error, Debug)]
pub enum RendererError {
    /// A GPU object could not be created or used.
    #[error(transparent)]
    Rhi(#[from] RhiError),

    /// Window or surface setup failed.
    #[error(transparent)]
    Core(#[from] lumen_core::Error),

    #[error("Invalid renderer configuration: {0}")]
    InvalidConfig(String),

    /// Unrecoverable failure inside the frame cycle. The event loop should
    /// shut the renderer down and exit.
    #[error("Fatal {stage} failure: {result:?}")]
    Fatal {
        stage: FrameStage,
        result: vk::Result,
    },

    /// An earlier frame failed fatally. Only shutdown is accepted from here.
    #[error("Renderer halted by an earlier fatal error")]
    Halted,

    /// The renderer has been shut down and accepts no more frames.
    #[error("Renderer has been shut down")]
    ShutDown,
}

impl RendererError {
    /// Wraps a raw Vulkan failure from `stage`.
    #[inline]
    pub fn fatal(stage: FrameStage, result: vk::Result) -> Self {
        RendererError::Fatal { stage, result }
    }

    /// Whether the surface currently has no drawable area, e.g. a
    /// minimized window. Rebuilding later may succeed.
    pub fn is_extent_unavailable(&self) -> bool {
        matches!(self, RendererError::Rhi(RhiError::ExtentUnavailable { .. }))
    }
}

/// Result type alias for renderer operations.
pub type RendererResult<T> = Result<T, RendererError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_display_names_stage() {
        let err = RendererError::fatal(FrameStage::Submit, vk::Result::ERROR_DEVICE_LOST);
        let message = err.to_string();
        assert!(message.contains("submit"));
        assert!(message.contains("ERROR_DEVICE_LOST"));
    }

    #[test]
    fn test_extent_unavailable_detection() {
        let err: RendererError = RhiError::ExtentUnavailable {
            width: 0,
            height: 0,
        }
        .into();
        assert!(err.is_extent_unavailable());
        assert!(!RendererError::ShutDown.is_extent_unavailable());
    }

    #[test]
    fn test_halted_is_not_retryable() {
        assert!(!RendererError::Halted.is_extent_unavailable());
        assert!(RendererError::Halted.to_string().contains("halted"));
    }
}
