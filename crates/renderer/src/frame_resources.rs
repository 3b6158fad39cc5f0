//! Per-slot GPU resources.
//!
//! Each of the N frame slots owns a uniform buffer, a scene storage buffer,
//! a descriptor set pointing at both, a command buffer, an acquire semaphore
//! and an in-flight fence. Everything is allocated once and rewritten in
//! place every time the slot comes around.
//!
//! # Synchronization Flow
//!
//! ```text
//! 1. Wait on in_flight fence (GPU is done with this slot)
//! 2. Acquire swapchain image (signals acquire semaphore)
//! 3. Reset fence, reset command buffer
//! 4. Write uniform and scene buffers
//! 5. Record, then submit:
//!    - wait on acquire semaphore
//!    - signal the image's present semaphore
//!    - signal in_flight fence
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use lumen_rhi::RhiResult;
use lumen_rhi::buffer::{Buffer, BufferUsage};
use lumen_rhi::command::{CommandBuffer, CommandPool};
use lumen_rhi::descriptor::{self, DescriptorPool, DescriptorSetLayout};
use lumen_rhi::device::Device;
use lumen_rhi::sync::{Fence, Semaphore};

use crate::error::{RendererError, RendererResult};
use crate::gpu_layout::{FrameUniforms, SceneGpu, WriteReport};
use crate::pipeline::{SCENE_BINDING, UNIFORM_BINDING};
use crate::scheduler::FrameInput;

/// Resources of one frame slot.
pub struct FrameSlot {
    uniform_buffer: Buffer,
    scene_buffer: Buffer,
    descriptor_set: vk::DescriptorSet,
    command_buffer: CommandBuffer,
    acquire_semaphore: Semaphore,
    in_flight: Fence,
}

impl FrameSlot {
    #[inline]
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }

    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    /// Signaled by acquire, waited by submit.
    #[inline]
    pub fn acquire_semaphore(&self) -> &Semaphore {
        &self.acquire_semaphore
    }

    /// Signaled when the slot's submission completes. Created signaled.
    #[inline]
    pub fn in_flight(&self) -> &Fence {
        &self.in_flight
    }
}

/// All frame slots plus the pools they allocate from.
pub struct FrameResources {
    // Slots go first so they drop before the pools.
    slots: Vec<FrameSlot>,
    _descriptor_pool: DescriptorPool,
    _command_pool: CommandPool,
}

impl FrameResources {
    /// Allocates `count` slots whose descriptor sets use `layout`.
    ///
    /// Descriptor sets are written here once; buffers never move afterwards.
    pub fn allocate(
        device: &Arc<Device>,
        layout: &DescriptorSetLayout,
        count: usize,
    ) -> RhiResult<Self> {
        let graphics_family = device.queue_families().graphics_family.ok_or_else(|| {
            lumen_rhi::RhiError::InvalidHandle("device has no graphics queue family".to_string())
        })?;

        let command_pool = CommandPool::new(device.clone(), graphics_family)?;
        let command_buffers = command_pool.allocate_command_buffers(count as u32)?;

        let descriptor_pool =
            DescriptorPool::new(device.clone(), count as u32, &layout.pool_sizes(count as u32))?;
        let layouts = vec![layout.handle(); count];
        let descriptor_sets = descriptor_pool.allocate(&layouts)?;

        let mut slots = Vec::with_capacity(count);
        for (i, (command_buffer, descriptor_set)) in
            command_buffers.into_iter().zip(descriptor_sets).enumerate()
        {
            let uniform_buffer = Buffer::new(
                device.clone(),
                BufferUsage::Uniform,
                FrameUniforms::SIZE as vk::DeviceSize,
            )?;
            let scene_buffer = Buffer::new(
                device.clone(),
                BufferUsage::Storage,
                SceneGpu::SIZE as vk::DeviceSize,
            )?;

            descriptor::write_buffers(
                device,
                descriptor_set,
                &[
                    (UNIFORM_BINDING, &uniform_buffer),
                    (SCENE_BINDING, &scene_buffer),
                ],
            );

            slots.push(FrameSlot {
                uniform_buffer,
                scene_buffer,
                descriptor_set,
                command_buffer,
                acquire_semaphore: Semaphore::new(device.clone())?,
                in_flight: Fence::new(device.clone(), true)?,
            });
            debug!("Allocated frame slot {}", i);
        }

        info!("Frame resources allocated for {} slot(s)", count);

        Ok(Self {
            slots,
            _descriptor_pool: descriptor_pool,
            _command_pool: command_pool,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::InvalidConfig`] when out of range.
    pub fn slot(&self, index: usize) -> RendererResult<&FrameSlot> {
        self.slots.get(index).ok_or_else(|| {
            RendererError::InvalidConfig(format!(
                "frame slot {} out of range (have {})",
                index,
                self.slots.len()
            ))
        })
    }

    /// Overwrites slot `index`'s buffers from `input`.
    ///
    /// The caller must have waited on the slot's fence; the GPU may
    /// otherwise still be reading these bytes.
    pub fn write(
        &self,
        index: usize,
        input: &FrameInput<'_>,
        resolution: vk::Extent2D,
    ) -> RendererResult<WriteReport> {
        let slot = self.slot(index)?;

        let uniforms = FrameUniforms::new(
            [resolution.width as f32, resolution.height as f32],
            input.time,
            input.camera,
            input.scene.sun.enabled,
        );
        let (scene, report) = SceneGpu::from_scene(input.scene);

        slot.uniform_buffer
            .write_bytes(0, bytemuck::bytes_of(&uniforms))?;
        slot.scene_buffer.write_bytes(0, bytemuck::bytes_of(&scene))?;

        Ok(report)
    }
}
