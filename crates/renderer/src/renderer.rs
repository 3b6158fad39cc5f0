//! Main renderer orchestration.
//!
//! [`Renderer`] pairs the Vulkan [`RenderContext`] with a
//! [`FrameScheduler`] and is the only type the application talks to.

use ash::vk;
use tracing::{error, info};

use lumen_core::Config;
use lumen_platform::Window;
use lumen_scene::{FlyCamera, Scene};

use crate::context::RenderContext;
use crate::error::RendererResult;
use crate::overlay::Overlay;
use crate::scheduler::{FrameBackend, FrameInput, FrameScheduler, FrameStatus};

/// Renders a [`Scene`] into a window, one frame per call.
pub struct Renderer {
    scheduler: FrameScheduler,
    context: RenderContext,
}

impl Renderer {
    /// Creates the renderer for `window`.
    ///
    /// # Errors
    ///
    /// Fails when `config` is invalid or any Vulkan object cannot be
    /// created. Nothing is leaked on failure.
    pub fn new(window: &Window, config: &Config) -> RendererResult<Self> {
        let context = RenderContext::new(window, config)?;
        let scheduler = FrameScheduler::new(config.frames_in_flight)?;
        Ok(Self { scheduler, context })
    }

    /// Renders one frame of `scene` seen from `camera`.
    ///
    /// `time` is seconds since startup and is forwarded to the shader.
    /// `overlay` is drawn on top of the traced image.
    ///
    /// # Errors
    ///
    /// Any error is fatal; the caller should [`shutdown`](Self::shutdown)
    /// and exit.
    pub fn render_frame(
        &mut self,
        camera: &FlyCamera,
        time: f32,
        scene: &Scene,
        overlay: Option<&dyn Overlay>,
    ) -> RendererResult<FrameStatus> {
        let input = FrameInput {
            camera,
            scene,
            time,
            overlay,
        };
        self.scheduler.run_frame(&mut self.context, &input)
    }

    /// Schedules a swapchain rebuild at the new window size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.scheduler.request_resize(width, height);
    }

    /// Waits for all submitted work. Safe to call more than once.
    pub fn shutdown(&mut self) -> RendererResult<()> {
        self.scheduler.shutdown(&mut self.context)
    }

    #[inline]
    pub fn frame_number(&self) -> u64 {
        self.scheduler.frame_number()
    }

    /// Current swapchain extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.context.extent()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Renderer shutdown failed: {}", e);
        }
        info!("Renderer destroyed after {} frame(s)", self.frame_number());
    }
}
