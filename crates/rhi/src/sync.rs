//! Fences and semaphores.
//!
//! - [`Fence`] lets the CPU wait for a submission to finish.
//! - [`Semaphore`] orders work between GPU queue operations.
//! - [`SemaphoreSet`] holds one semaphore per swapchain image. It is rebuilt
//!   whenever the image set changes.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// RAII binary semaphore.
pub struct Semaphore {
    device: Arc<Device>,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Creates an unsignaled binary semaphore.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };
        Ok(Self { device, semaphore })
    }

    /// Returns the raw Vulkan semaphore handle.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
    }
}

/// RAII fence.
pub struct Fence {
    device: Arc<Device>,
    fence: vk::Fence,
}

impl Fence {
    /// Creates a fence. Slot fences start signaled so the first wait returns
    /// immediately.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);
        let fence = unsafe { device.handle().create_fence(&create_info, None)? };

        Ok(Self { device, fence })
    }

    /// Returns the raw Vulkan fence handle.
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Blocks until the fence is signaled or `timeout` nanoseconds pass.
    pub fn wait(&self, timeout: u64) -> Result<(), RhiError> {
        unsafe {
            self.device
                .handle()
                .wait_for_fences(&[self.fence], true, timeout)?
        };
        Ok(())
    }

    /// Returns the fence to the unsignaled state.
    pub fn reset(&self) -> Result<(), RhiError> {
        unsafe { self.device.handle().reset_fences(&[self.fence])? };
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
    }
}

/// One semaphore per swapchain image, indexed by image index.
///
/// A present must wait on the semaphore of the image being presented. The
/// frame-slot count plays no part in indexing this set.
pub struct SemaphoreSet {
    semaphores: Vec<Semaphore>,
}

impl SemaphoreSet {
    /// Creates `count` semaphores.
    pub fn new(device: &Arc<Device>, count: usize) -> RhiResult<Self> {
        let semaphores = (0..count)
            .map(|_| Semaphore::new(device.clone()))
            .collect::<RhiResult<Vec<_>>>()?;
        debug!("Created {} per-image semaphore(s)", count);
        Ok(Self { semaphores })
    }

    /// Semaphore for `image_index`.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidHandle`] when the index is outside the set.
    pub fn get(&self, image_index: u32) -> RhiResult<&Semaphore> {
        self.semaphores.get(image_index as usize).ok_or_else(|| {
            RhiError::InvalidHandle(format!(
                "image index {} out of range for {} semaphore(s)",
                image_index,
                self.semaphores.len()
            ))
        })
    }

    /// Number of semaphores in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.semaphores.len()
    }

    /// Whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.semaphores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semaphore_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Semaphore>();
    }

    #[test]
    fn test_fence_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Fence>();
    }

    #[test]
    fn test_semaphore_set_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SemaphoreSet>();
    }
}
