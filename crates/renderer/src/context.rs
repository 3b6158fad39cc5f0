//! The Vulkan side of the frame cycle.
//!
//! [`RenderContext`] owns every GPU object the renderer uses and implements
//! [`FrameBackend`] on top of them. It holds no scheduling state: which slot
//! and which image to use always comes from the caller.
//!
//! # Resource Destruction Order
//!
//! Fields are declared in drop order:
//! 1. Frame slots (buffers, command buffers, fences, acquire semaphores)
//! 2. Pipeline and descriptor set layout
//! 3. Per-image present semaphores
//! 4. Swapchain
//! 5. Device
//! 6. Surface
//! 7. Instance
//!
//! `Drop` waits for the device to go idle before any of it is released.

use std::ffi::CString;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info};

use lumen_core::{Config, PresentMode};
use lumen_platform::{Surface, Window};
use lumen_rhi::RhiError;
use lumen_rhi::descriptor::DescriptorSetLayout;
use lumen_rhi::device::Device;
use lumen_rhi::instance::Instance;
use lumen_rhi::physical_device::select_physical_device;
use lumen_rhi::swapchain::{AcquireOutcome, PresentOutcome, Swapchain};
use lumen_rhi::sync::SemaphoreSet;

use crate::error::{FrameStage, RendererError, RendererResult};
use crate::frame_resources::FrameResources;
use crate::gpu_layout::WriteReport;
use crate::overlay::Overlay;
use crate::pipeline::{FULLSCREEN_VERTEX_COUNT, FullscreenPipeline, create_frame_descriptor_layout};
use crate::scheduler::{FrameBackend, FrameInput};

/// Cleared into every image before the full-screen pass. Any pixel left
/// this color was not written by the shader.
pub const CLEAR_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

/// Maps the configured present mode to Vulkan.
pub fn to_vk_present_mode(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
    }
}

/// Turns a raw Vulkan failure at `stage` into [`RendererError::Fatal`];
/// other RHI errors pass through unchanged.
fn at_stage(stage: FrameStage) -> impl Fn(RhiError) -> RendererError {
    move |e| match e {
        RhiError::VulkanError(result) => RendererError::fatal(stage, result),
        other => RendererError::Rhi(other),
    }
}

/// Device, swapchain, pipeline and frame slots for one window.
pub struct RenderContext {
    frames: FrameResources,
    pipeline: FullscreenPipeline,
    set_layout: DescriptorSetLayout,
    present_semaphores: SemaphoreSet,
    swapchain: Swapchain,
    device: Arc<Device>,
    surface: Surface,
    instance: Instance,
}

impl RenderContext {
    /// Creates every GPU object for `window`.
    ///
    /// On failure, whatever was created so far is released in reverse
    /// order.
    ///
    /// # Errors
    ///
    /// - [`RendererError::Core`] for an invalid config or surface failure.
    /// - [`RendererError::Rhi`] for any Vulkan creation failure, including
    ///   missing shaders.
    pub fn new(window: &Window, config: &Config) -> RendererResult<Self> {
        config.validate()?;

        info!(
            "Initializing Vulkan renderer ({}x{}, {} frame slot(s), validation {})",
            window.width(),
            window.height(),
            config.frames_in_flight,
            if config.validation { "on" } else { "off" }
        );

        let application_name = CString::new(config.title.as_str()).map_err(|_| {
            RendererError::InvalidConfig("window title contains a NUL byte".to_string())
        })?;
        let surface_extensions = window.required_extensions()?;
        let instance = Instance::new(&application_name, &surface_extensions, config.validation)?;

        let surface = window.create_surface(instance.entry(), instance.handle())?;

        let physical_device =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical_device)?;

        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            surface.handle(),
            window.width(),
            window.height(),
            to_vk_present_mode(config.present_mode),
        )?;
        let present_semaphores = SemaphoreSet::new(&device, swapchain.image_count())?;

        let set_layout = create_frame_descriptor_layout(device.clone())?;
        let pipeline = FullscreenPipeline::build(
            device.clone(),
            swapchain.format(),
            &set_layout,
            &config.shader_dir,
        )?;

        let frames = FrameResources::allocate(&device, &set_layout, config.frames_in_flight)?;

        info!(
            "Renderer initialized: {} swapchain image(s), {} frame slot(s)",
            swapchain.image_count(),
            frames.len()
        );

        Ok(Self {
            frames,
            pipeline,
            set_layout,
            present_semaphores,
            swapchain,
            device,
            surface,
            instance,
        })
    }

    fn swapchain_image(&self, image_index: u32) -> RendererResult<(vk::Image, vk::ImageView)> {
        match (
            self.swapchain.image(image_index),
            self.swapchain.image_view(image_index),
        ) {
            (Some(image), Some(view)) => Ok((image, view)),
            _ => Err(RhiError::InvalidHandle(format!(
                "swapchain image {} out of range ({} image(s))",
                image_index,
                self.swapchain.image_count()
            ))
            .into()),
        }
    }
}

impl FrameBackend for RenderContext {
    fn slot_count(&self) -> usize {
        self.frames.len()
    }

    fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    fn wait_for_slot(&mut self, slot: usize) -> RendererResult<()> {
        self.frames
            .slot(slot)?
            .in_flight()
            .wait(u64::MAX)
            .map_err(at_stage(FrameStage::WaitForSlot))
    }

    fn acquire(&mut self, slot: usize) -> RendererResult<AcquireOutcome> {
        let semaphore = self.frames.slot(slot)?.acquire_semaphore().handle();
        self.swapchain
            .acquire_next_image(semaphore)
            .map_err(|result| RendererError::fatal(FrameStage::Acquire, result))
    }

    fn reset_slot(&mut self, slot: usize) -> RendererResult<()> {
        let frame = self.frames.slot(slot)?;
        frame
            .in_flight()
            .reset()
            .map_err(at_stage(FrameStage::Reset))?;
        frame
            .command_buffer()
            .reset()
            .map_err(at_stage(FrameStage::Reset))
    }

    fn write_slot(&mut self, slot: usize, input: &FrameInput<'_>) -> RendererResult<WriteReport> {
        self.frames.write(slot, input, self.swapchain.extent())
    }

    fn record(
        &mut self,
        slot: usize,
        image_index: u32,
        overlay: Option<&dyn Overlay>,
    ) -> RendererResult<()> {
        let frame = self.frames.slot(slot)?;
        let (image, view) = self.swapchain_image(image_index)?;
        let extent = self.swapchain.extent();
        let cmd = frame.command_buffer();

        cmd.begin().map_err(at_stage(FrameStage::Record))?;

        cmd.transition_color_image(
            image,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        );

        let color_attachment = vk::RenderingAttachmentInfo::default()
            .image_view(view)
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: CLEAR_COLOR,
                },
            });

        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        let rendering_info = vk::RenderingInfo::default()
            .render_area(render_area)
            .layer_count(1)
            .color_attachments(std::slice::from_ref(&color_attachment));

        cmd.begin_rendering(&rendering_info);

        cmd.set_viewport(&vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });
        cmd.set_scissor(&render_area);

        let pipeline = self.pipeline.pipeline();
        cmd.bind_pipeline(pipeline.bind_point(), pipeline.handle());
        cmd.bind_descriptor_sets(
            pipeline.bind_point(),
            self.pipeline.layout().handle(),
            0,
            &[frame.descriptor_set()],
        );
        cmd.draw(FULLSCREEN_VERTEX_COUNT, 1, 0, 0);

        if let Some(overlay) = overlay {
            overlay.record(cmd, extent);
        }

        cmd.end_rendering();

        cmd.transition_color_image(
            image,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
        );

        cmd.end().map_err(at_stage(FrameStage::Record))
    }

    fn submit(&mut self, slot: usize, image_index: u32) -> RendererResult<()> {
        let frame = self.frames.slot(slot)?;
        let present_semaphore = self.present_semaphores.get(image_index)?;

        let wait_semaphores = [frame.acquire_semaphore().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [present_semaphore.handle()];
        let command_buffers = [frame.command_buffer().handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the command buffer was fully recorded by `record`, and the
        // fence was reset by `reset_slot` after its last wait.
        unsafe {
            self.device
                .submit_graphics(&[submit_info], frame.in_flight().handle())
                .map_err(|result| RendererError::fatal(FrameStage::Submit, result))
        }
    }

    fn present(&mut self, image_index: u32) -> RendererResult<PresentOutcome> {
        let wait_semaphore = self.present_semaphores.get(image_index)?.handle();
        self.swapchain
            .present(self.device.present_queue(), image_index, wait_semaphore)
            .map_err(|result| RendererError::fatal(FrameStage::Present, result))
    }

    fn rebuild(&mut self, extent: vk::Extent2D) -> RendererResult<()> {
        let old_format = self.swapchain.format();

        self.swapchain.recreate(
            &self.instance,
            self.surface.handle(),
            extent.width,
            extent.height,
        )?;

        self.present_semaphores = SemaphoreSet::new(&self.device, self.swapchain.image_count())?;

        if self.swapchain.format() != old_format {
            info!(
                "Swapchain format changed {:?} -> {:?}, rebuilding pipeline",
                old_format,
                self.swapchain.format()
            );
            self.pipeline = FullscreenPipeline::build(
                self.device.clone(),
                self.swapchain.format(),
                &self.set_layout,
                self.pipeline.shader_dir(),
            )?;
        }

        debug!(
            "Render context rebuilt: generation {}, {} image(s)",
            self.swapchain.generation(),
            self.swapchain.image_count()
        );
        Ok(())
    }

    fn drain(&mut self) -> RendererResult<()> {
        self.device
            .wait_idle()
            .map_err(at_stage(FrameStage::Drain))
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during teardown: {:?}", e);
        }
        info!("Render context destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_mode_mapping() {
        assert_eq!(to_vk_present_mode(PresentMode::Fifo), vk::PresentModeKHR::FIFO);
        assert_eq!(
            to_vk_present_mode(PresentMode::Mailbox),
            vk::PresentModeKHR::MAILBOX
        );
        assert_eq!(
            to_vk_present_mode(PresentMode::Immediate),
            vk::PresentModeKHR::IMMEDIATE
        );
    }

    #[test]
    fn test_vulkan_errors_become_fatal_at_stage() {
        let err = at_stage(FrameStage::WaitForSlot)(RhiError::VulkanError(
            vk::Result::ERROR_DEVICE_LOST,
        ));
        assert!(matches!(
            err,
            RendererError::Fatal {
                stage: FrameStage::WaitForSlot,
                result: vk::Result::ERROR_DEVICE_LOST
            }
        ));

        let passthrough = at_stage(FrameStage::Reset)(RhiError::SurfaceLost);
        assert!(matches!(passthrough, RendererError::Rhi(RhiError::SurfaceLost)));
    }
}
