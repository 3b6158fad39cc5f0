//! UI drawn over the traced image.
//!
//! An [`Overlay`] is recorded after the full-screen pass, inside the same
//! rendering scope, so it writes straight into the swapchain image.
//! [`PanelOverlay`] is the built-in one: flat rectangles placed in
//! normalized window coordinates.

use std::fmt;

use ash::vk;
use lumen_rhi::command::CommandBuffer;

/// Records auxiliary draws for one frame.
pub trait Overlay: fmt::Debug {
    /// Called with the swapchain image bound as color attachment 0.
    fn record(&self, cmd: &CommandBuffer, extent: vk::Extent2D);
}

/// A solid rectangle. Coordinates are fractions of the window with the
/// origin at the top left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Linear RGBA, written without blending
    pub color: [f32; 4],
}

impl PanelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32, color: [f32; 4]) -> Self {
        Self {
            x,
            y,
            width,
            height,
            color,
        }
    }

    /// Pixel rectangle inside `extent`, or `None` when nothing of it is
    /// visible.
    pub fn to_pixels(&self, extent: vk::Extent2D) -> Option<vk::Rect2D> {
        let span = |start: f32, len: f32, size: u32| -> Option<(u32, u32)> {
            let size_f = size as f32;
            let lo = (start.clamp(0.0, 1.0) * size_f).round() as u32;
            let hi = ((start + len).clamp(0.0, 1.0) * size_f).round() as u32;
            (hi > lo).then_some((lo, hi - lo))
        };

        let (x, width) = span(self.x, self.width, extent.width)?;
        let (y, height) = span(self.y, self.height, extent.height)?;
        Some(vk::Rect2D {
            offset: vk::Offset2D {
                x: x as i32,
                y: y as i32,
            },
            extent: vk::Extent2D { width, height },
        })
    }
}

/// Rectangles drawn in insertion order; later ones cover earlier ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanelOverlay {
    rects: Vec<PanelRect>,
}

impl PanelOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rect: PanelRect) {
        self.rects.push(rect);
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    #[inline]
    pub fn rects(&self) -> &[PanelRect] {
        &self.rects
    }

    /// Visible rectangles in pixels, paired with their color.
    pub fn pixel_rects(&self, extent: vk::Extent2D) -> Vec<([f32; 4], vk::Rect2D)> {
        self.rects
            .iter()
            .filter_map(|rect| rect.to_pixels(extent).map(|px| (rect.color, px)))
            .collect()
    }
}

impl Overlay for PanelOverlay {
    fn record(&self, cmd: &CommandBuffer, extent: vk::Extent2D) {
        for (color, rect) in self.pixel_rects(extent) {
            cmd.clear_color_rects(color, std::slice::from_ref(&rect));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENT: vk::Extent2D = vk::Extent2D {
        width: 200,
        height: 100,
    };
    const WHITE: [f32; 4] = [1.0; 4];

    #[test]
    fn test_rect_maps_to_pixels() {
        let rect = PanelRect::new(0.25, 0.5, 0.5, 0.25, WHITE);
        let px = rect.to_pixels(EXTENT).unwrap();
        assert_eq!(px.offset, vk::Offset2D { x: 50, y: 50 });
        assert_eq!(
            px.extent,
            vk::Extent2D {
                width: 100,
                height: 25
            }
        );
    }

    #[test]
    fn test_rect_is_clipped_to_window() {
        let rect = PanelRect::new(0.9, -0.5, 0.5, 1.0, WHITE);
        let px = rect.to_pixels(EXTENT).unwrap();
        assert_eq!(px.offset, vk::Offset2D { x: 180, y: 0 });
        assert_eq!(
            px.extent,
            vk::Extent2D {
                width: 20,
                height: 50
            }
        );
    }

    #[test]
    fn test_invisible_rects_are_dropped() {
        let mut overlay = PanelOverlay::new();
        overlay.push(PanelRect::new(1.2, 0.0, 0.1, 0.1, WHITE));
        overlay.push(PanelRect::new(0.1, 0.1, 0.0, 0.5, WHITE));
        overlay.push(PanelRect::new(0.0, 0.0, 0.1, 0.1, [0.0, 0.0, 0.0, 1.0]));
        let visible = overlay.pixel_rects(EXTENT);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].0, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_zero_extent_draws_nothing() {
        let mut overlay = PanelOverlay::new();
        overlay.push(PanelRect::new(0.0, 0.0, 1.0, 1.0, WHITE));
        let empty = vk::Extent2D {
            width: 0,
            height: 0,
        };
        assert!(overlay.pixel_rects(empty).is_empty());
        overlay.clear();
        assert!(overlay.rects().is_empty());
    }
}
