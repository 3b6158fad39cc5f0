//! Frame scheduling over N frame slots and M swapchain images.
//!
//! [`FrameScheduler`] owns no GPU objects. It decides *when* each step of a
//! frame happens and hands the *how* to a [`FrameBackend`]: the Vulkan
//! [`RenderContext`](crate::context::RenderContext) in the application, or a
//! scripted mock in tests.
//!
//! # Frame cycle
//!
//! ```text
//! 0. pending resize?  zero extent -> Skipped, else rebuild
//! 1. wait for the slot's fence             Submitted -> Complete
//! 2. acquire an image                      OutOfDate -> rebuild, Rebuilt
//! 3. reset fence and command buffer        -> Recording
//! 4. write the slot's buffers
//! 5. record against the acquired image
//! 6. submit                                -> Submitted (or Lost)
//! 7. present                               OutOfDate/Suboptimal -> rebuild next
//! 8. advance slot and frame number
//! ```
//!
//! Any error other than an out-of-date swapchain or an unavailable extent
//! halts the scheduler. A slot that failed between reset and submit is left
//! `Lost`; its fence would never signal, so no later frame may wait on it.
//!
//! Acquire semaphores are per slot; present semaphores are per image. The
//! backend owns both, the scheduler only passes the right indices.

use ash::vk;
use lumen_rhi::swapchain::{AcquireOutcome, PresentOutcome};
use lumen_scene::{FlyCamera, Scene};
use tracing::{debug, error, info, warn};

use crate::error::{RendererError, RendererResult};
use crate::gpu_layout::WriteReport;
use crate::overlay::Overlay;

/// Everything read from the application for one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameInput<'a> {
    pub camera: &'a FlyCamera,
    pub scene: &'a Scene,
    /// Seconds since startup.
    pub time: f32,
    /// Drawn over the traced image inside the same rendering pass.
    pub overlay: Option<&'a dyn Overlay>,
}

/// Lifecycle of one frame slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SlotState {
    /// Never used.
    #[default]
    Idle,
    /// Fence reset, buffers being written and commands recorded.
    Recording,
    /// Handed to the GPU; the fence will signal on completion.
    Submitted,
    /// The fence has been observed signaled.
    Complete,
    /// Submission failed; the slot's contents are undefined.
    Lost,
}

/// What one call to [`FrameScheduler::run_frame`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// Work was submitted and handed to presentation.
    Presented {
        slot: usize,
        image_index: u32,
        report: WriteReport,
        /// A rebuild is scheduled when this is not `Presented`.
        outcome: PresentOutcome,
    },
    /// The swapchain was out of date at acquire and has been rebuilt; no
    /// work was submitted.
    Rebuilt,
    /// Nothing to draw into, e.g. a minimized window.
    Skipped,
}

/// The GPU side of a frame cycle.
///
/// Slot indices are always in `0..slot_count()`. Image indices come from
/// the most recent [`acquire`](FrameBackend::acquire).
pub trait FrameBackend {
    /// Number of frame slots (N).
    fn slot_count(&self) -> usize;

    /// Current swapchain extent.
    fn extent(&self) -> vk::Extent2D;

    /// Blocks until the slot's last submission has completed.
    fn wait_for_slot(&mut self, slot: usize) -> RendererResult<()>;

    /// Acquires an image, signaling the slot's acquire semaphore.
    fn acquire(&mut self, slot: usize) -> RendererResult<AcquireOutcome>;

    /// Resets the slot's fence and command buffer.
    fn reset_slot(&mut self, slot: usize) -> RendererResult<()>;

    /// Overwrites the slot's uniform and scene buffers.
    fn write_slot(&mut self, slot: usize, input: &FrameInput<'_>) -> RendererResult<WriteReport>;

    /// Records the slot's command buffer against `image_index`, followed by
    /// `overlay` when one is given.
    fn record(
        &mut self,
        slot: usize,
        image_index: u32,
        overlay: Option<&dyn Overlay>,
    ) -> RendererResult<()>;

    /// Submits the slot's command buffer.
    fn submit(&mut self, slot: usize, image_index: u32) -> RendererResult<()>;

    /// Presents `image_index`.
    fn present(&mut self, image_index: u32) -> RendererResult<PresentOutcome>;

    /// Rebuilds the swapchain and everything sized by it.
    fn rebuild(&mut self, extent: vk::Extent2D) -> RendererResult<()>;

    /// Waits until the device has no work pending.
    fn drain(&mut self) -> RendererResult<()>;
}

/// Drives frame slots round-robin through a [`FrameBackend`].
#[derive(Debug)]
pub struct FrameScheduler {
    slots: Vec<SlotState>,
    current_slot: usize,
    frame_number: u64,
    /// Extent requested by the window, applied at the next frame.
    pending_extent: Option<vk::Extent2D>,
    /// Rebuild before the next acquire.
    rebuild_pending: bool,
    /// Set after warning about a truncated scene; cleared once it fits.
    truncation_warned: bool,
    /// Set by the first fatal error; cleared only by dropping the scheduler.
    halted: bool,
    shut_down: bool,
}

impl FrameScheduler {
    /// Creates a scheduler for `slot_count` slots.
    ///
    /// # Errors
    ///
    /// Returns [`RendererError::InvalidConfig`] when `slot_count` is zero.
    pub fn new(slot_count: usize) -> RendererResult<Self> {
        if slot_count == 0 {
            return Err(RendererError::InvalidConfig(
                "at least one frame slot is required".to_string(),
            ));
        }

        Ok(Self {
            slots: vec![SlotState::Idle; slot_count],
            current_slot: 0,
            frame_number: 0,
            pending_extent: None,
            rebuild_pending: false,
            truncation_warned: false,
            halted: false,
            shut_down: false,
        })
    }

    /// Index of the slot the next frame will use.
    #[inline]
    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    /// Frames presented so far.
    #[inline]
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// State of `slot`, or `None` when out of range.
    #[inline]
    pub fn slot_state(&self, slot: usize) -> Option<SlotState> {
        self.slots.get(slot).copied()
    }

    /// Extent waiting to be applied, if any.
    #[inline]
    pub fn pending_extent(&self) -> Option<vk::Extent2D> {
        self.pending_extent
    }

    /// Whether a fatal error has stopped the frame cycle.
    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Records a new window size. The swapchain is rebuilt at the start of
    /// the next [`run_frame`](Self::run_frame), not here.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        debug!("Resize requested: {}x{}", width, height);
        self.pending_extent = Some(vk::Extent2D { width, height });
    }

    /// Runs one frame cycle.
    ///
    /// # Errors
    ///
    /// - [`RendererError::ShutDown`] after [`shutdown`](Self::shutdown).
    /// - [`RendererError::Halted`] once any earlier frame has failed.
    /// - Any backend error other than an out-of-date swapchain or an
    ///   unavailable extent. These are fatal and halt the scheduler.
    pub fn run_frame<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        input: &FrameInput<'_>,
    ) -> RendererResult<FrameStatus> {
        if self.shut_down {
            return Err(RendererError::ShutDown);
        }
        if self.halted {
            return Err(RendererError::Halted);
        }

        let result = self.cycle(backend, input);
        if let Err(e) = &result {
            error!("Frame {} failed, halting: {}", self.frame_number, e);
            self.halted = true;
        }
        result
    }

    fn cycle<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        input: &FrameInput<'_>,
    ) -> RendererResult<FrameStatus> {
        if let Some(extent) = self.pending_extent {
            if extent.width == 0 || extent.height == 0 {
                return Ok(FrameStatus::Skipped);
            }
            self.rebuild_pending = true;
        }

        if self.rebuild_pending && !self.try_rebuild(backend)? {
            return Ok(FrameStatus::Skipped);
        }

        let slot = self.current_slot;

        backend.wait_for_slot(slot)?;
        if self.slots[slot] == SlotState::Submitted {
            self.slots[slot] = SlotState::Complete;
        }

        let (image_index, suboptimal) = match backend.acquire(slot)? {
            AcquireOutcome::Acquired {
                image_index,
                suboptimal,
            } => (image_index, suboptimal),
            AcquireOutcome::OutOfDate => {
                debug!("Swapchain out of date at acquire (slot {})", slot);
                self.rebuild_pending = true;
                return Ok(if self.try_rebuild(backend)? {
                    FrameStatus::Rebuilt
                } else {
                    FrameStatus::Skipped
                });
            }
        };

        let report = match self.fill_and_submit(backend, slot, image_index, input) {
            Ok(report) => report,
            Err(e) => {
                self.slots[slot] = SlotState::Lost;
                return Err(e);
            }
        };
        self.slots[slot] = SlotState::Submitted;

        let outcome = backend.present(image_index)?;
        if suboptimal || outcome.needs_rebuild() {
            debug!("Rebuild scheduled after present ({:?})", outcome);
            self.rebuild_pending = true;
        }

        self.current_slot = (self.current_slot + 1) % self.slots.len();
        self.frame_number += 1;

        Ok(FrameStatus::Presented {
            slot,
            image_index,
            report,
            outcome,
        })
    }

    /// Drains the device and rebuilds the swapchain now, at the pending
    /// extent if one was requested.
    ///
    /// Safe to call with no work in flight.
    pub fn rebuild<B: FrameBackend>(&mut self, backend: &mut B) -> RendererResult<()> {
        if self.shut_down {
            return Err(RendererError::ShutDown);
        }
        if self.halted {
            return Err(RendererError::Halted);
        }

        let extent = self.pending_extent.unwrap_or_else(|| backend.extent());
        backend.drain()?;
        self.mark_drained();
        backend.rebuild(extent)?;

        self.pending_extent = None;
        self.rebuild_pending = false;
        info!(
            "Swapchain rebuilt at {}x{} (frame {})",
            extent.width, extent.height, self.frame_number
        );
        Ok(())
    }

    /// Drains the device and stops accepting frames. Later calls do nothing.
    pub fn shutdown<B: FrameBackend>(&mut self, backend: &mut B) -> RendererResult<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        backend.drain()?;
        self.mark_drained();
        info!("Frame scheduler shut down after {} frame(s)", self.frame_number);
        Ok(())
    }

    /// Steps 3 to 6. The slot's fence is unsignaled from the reset onward,
    /// so any failure here loses the slot.
    fn fill_and_submit<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        slot: usize,
        image_index: u32,
        input: &FrameInput<'_>,
    ) -> RendererResult<WriteReport> {
        backend.reset_slot(slot)?;
        self.slots[slot] = SlotState::Recording;

        let report = backend.write_slot(slot, input)?;
        self.note_truncation(&report);

        backend.record(slot, image_index, input.overlay)?;
        backend.submit(slot, image_index)?;
        Ok(report)
    }

    /// Rebuilds, treating an unavailable extent as "try again later".
    /// Returns whether the rebuild happened.
    fn try_rebuild<B: FrameBackend>(&mut self, backend: &mut B) -> RendererResult<bool> {
        match self.rebuild(backend) {
            Ok(()) => Ok(true),
            Err(e) if e.is_extent_unavailable() => {
                debug!("Rebuild deferred: {}", e);
                self.rebuild_pending = true;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn mark_drained(&mut self) {
        for state in &mut self.slots {
            if *state == SlotState::Submitted {
                *state = SlotState::Complete;
            }
        }
    }

    fn note_truncation(&mut self, report: &WriteReport) {
        if report.truncated() {
            if !self.truncation_warned {
                warn!(
                    "Scene has {} spheres; only the first {} are rendered",
                    report.spheres_written + report.spheres_dropped,
                    report.spheres_written
                );
                self.truncation_warned = true;
            }
        } else {
            self.truncation_warned = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_slots_rejected() {
        assert!(matches!(
            FrameScheduler::new(0),
            Err(RendererError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_new_scheduler_state() {
        let scheduler = FrameScheduler::new(3).unwrap();
        assert_eq!(scheduler.slot_count(), 3);
        assert_eq!(scheduler.current_slot(), 0);
        assert_eq!(scheduler.frame_number(), 0);
        assert_eq!(scheduler.slot_state(2), Some(SlotState::Idle));
        assert_eq!(scheduler.slot_state(3), None);
        assert!(!scheduler.is_halted());
        assert!(!scheduler.is_shut_down());
    }

    #[test]
    fn test_request_resize_is_deferred() {
        let mut scheduler = FrameScheduler::new(2).unwrap();
        scheduler.request_resize(800, 600);
        scheduler.request_resize(1024, 768);
        assert_eq!(
            scheduler.pending_extent(),
            Some(vk::Extent2D {
                width: 1024,
                height: 768
            })
        );
    }

    #[test]
    fn test_truncation_warning_resets_when_scene_fits() {
        let mut scheduler = FrameScheduler::new(1).unwrap();
        let truncated = WriteReport {
            spheres_written: 100,
            spheres_dropped: 5,
        };
        scheduler.note_truncation(&truncated);
        assert!(scheduler.truncation_warned);
        scheduler.note_truncation(&WriteReport::default());
        assert!(!scheduler.truncation_warned);
    }
}
