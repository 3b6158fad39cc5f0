//! Host-visible, persistently mapped GPU buffers.
//!
//! Per-frame data is rewritten every frame, so buffers live in
//! `MemoryLocation::CpuToGpu`. gpu-allocator keeps that memory mapped for
//! the allocation's lifetime, so a write is a plain memcpy with no map or
//! unmap.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// How a buffer is bound to shaders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    /// Small, fixed-layout shader constants (`UNIFORM_BUFFER`)
    Uniform,
    /// Larger structured data read by shaders (`STORAGE_BUFFER`)
    Storage,
}

impl BufferUsage {
    /// Converts to Vulkan buffer usage flags.
    pub fn to_vk_usage(self) -> vk::BufferUsageFlags {
        match self {
            BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
            BufferUsage::Storage => vk::BufferUsageFlags::STORAGE_BUFFER,
        }
    }

    /// Matching descriptor type.
    pub fn descriptor_type(self) -> vk::DescriptorType {
        match self {
            BufferUsage::Uniform => vk::DescriptorType::UNIFORM_BUFFER,
            BufferUsage::Storage => vk::DescriptorType::STORAGE_BUFFER,
        }
    }

    /// Allocation name used in gpu-allocator reports.
    pub fn name(self) -> &'static str {
        match self {
            BufferUsage::Uniform => "uniform",
            BufferUsage::Storage => "storage",
        }
    }
}

/// A `VkBuffer` bound to mapped, host-coherent memory.
pub struct Buffer {
    device: Arc<Device>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: vk::DeviceSize,
    usage: BufferUsage,
}

impl Buffer {
    /// Creates a mapped buffer of `size` bytes.
    ///
    /// # Errors
    ///
    /// Fails on a zero size or when the buffer or its memory cannot be
    /// created. Everything created before the failure is released.
    pub fn new(device: Arc<Device>, usage: BufferUsage, size: vk::DeviceSize) -> RhiResult<Self> {
        if size == 0 {
            return Err(RhiError::InvalidHandle(
                "Buffer size must be greater than 0".to_string(),
            ));
        }

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage.to_vk_usage())
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.handle().create_buffer(&buffer_info, None)? };
        let requirements = unsafe { device.handle().get_buffer_memory_requirements(buffer) };

        // From here on, `this` owns the buffer and its Drop cleans up on error.
        let mut this = Self {
            device,
            buffer,
            allocation: None,
            size,
            usage,
        };

        let allocation = this.device.allocator()?.allocate(&AllocationCreateDesc {
            name: usage.name(),
            requirements,
            location: MemoryLocation::CpuToGpu,
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;

        let mapped = allocation.mapped_ptr().is_some();
        let (memory, offset) = unsafe { (allocation.memory(), allocation.offset()) };
        this.allocation = Some(allocation);

        if !mapped {
            return Err(RhiError::InvalidHandle(format!(
                "{} buffer memory is not host-mapped",
                usage.name()
            )));
        }

        unsafe {
            this.device
                .handle()
                .bind_buffer_memory(this.buffer, memory, offset)?;
        }

        debug!("Created {} buffer: {} bytes", usage.name(), size);
        Ok(this)
    }

    /// Copies `data` into the mapped memory at `offset`.
    ///
    /// The caller must ensure the GPU is not reading this range (for frame
    /// slots, by waiting on the slot fence first).
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidHandle`] if the write would overrun the buffer.
    pub fn write_bytes(&self, offset: vk::DeviceSize, data: &[u8]) -> RhiResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let end = offset + data.len() as vk::DeviceSize;
        if end > self.size {
            return Err(RhiError::InvalidHandle(format!(
                "Write exceeds {} buffer: offset {} + {} bytes > {}",
                self.usage.name(),
                offset,
                data.len(),
                self.size
            )));
        }

        let mapped_ptr = self
            .allocation
            .as_ref()
            .and_then(Allocation::mapped_ptr)
            .ok_or_else(|| RhiError::InvalidHandle("Buffer memory is not mapped".to_string()))?;

        // SAFETY: bounds checked above; the mapping lives as long as the allocation.
        unsafe {
            let dst = mapped_ptr.as_ptr().cast::<u8>().add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst, data.len());
        }

        Ok(())
    }

    /// Returns the Vulkan buffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Returns the buffer usage type.
    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            match self.device.allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        tracing::error!("Failed to free buffer allocation: {:?}", e);
                    }
                }
                Err(e) => tracing::error!("Leaking buffer allocation: {}", e),
            }
        }

        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_usage_to_vk_usage() {
        assert_eq!(
            BufferUsage::Uniform.to_vk_usage(),
            vk::BufferUsageFlags::UNIFORM_BUFFER
        );
        assert_eq!(
            BufferUsage::Storage.to_vk_usage(),
            vk::BufferUsageFlags::STORAGE_BUFFER
        );
    }

    #[test]
    fn test_buffer_usage_descriptor_type() {
        assert_eq!(
            BufferUsage::Uniform.descriptor_type(),
            vk::DescriptorType::UNIFORM_BUFFER
        );
        assert_eq!(
            BufferUsage::Storage.descriptor_type(),
            vk::DescriptorType::STORAGE_BUFFER
        );
    }

    #[test]
    fn test_buffer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Buffer>();
    }
}
