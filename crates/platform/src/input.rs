//! Keyboard and mouse-motion state for the fly camera.

use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Tracks held keys, edge-triggered presses, and accumulated mouse motion.
#[derive(Debug, Default)]
pub struct InputState {
    /// Currently held keys
    pressed_keys: HashSet<KeyCode>,
    /// Keys that went down since the last `begin_frame`
    just_pressed_keys: HashSet<KeyCode>,
    /// Raw mouse motion accumulated since the last `begin_frame`
    mouse_delta: (f32, f32),
}

impl InputState {
    /// Create a new input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears per-frame state. Call once after the frame consumed it.
    pub fn begin_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.mouse_delta = (0.0, 0.0);
    }

    /// Handle a key press event. Auto-repeat does not re-trigger `is_key_just_pressed`.
    pub fn on_key_pressed(&mut self, key: KeyCode) {
        if self.pressed_keys.insert(key) {
            self.just_pressed_keys.insert(key);
        }
    }

    /// Handle a key release event.
    pub fn on_key_released(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    /// Accumulate a relative mouse motion event.
    pub fn on_mouse_motion(&mut self, dx: f32, dy: f32) {
        self.mouse_delta.0 += dx;
        self.mouse_delta.1 += dy;
    }

    /// Drops held keys, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
        self.just_pressed_keys.clear();
    }

    /// Check if a key is currently held.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Check if a key went down this frame.
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    /// Mouse motion accumulated this frame.
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    /// WASD movement as `(forward, right)`, each in `{-1, 0, 1}`.
    pub fn movement_axes(&self) -> (f32, f32) {
        let axis = |positive: KeyCode, negative: KeyCode| {
            let mut value = 0.0;
            if self.is_key_pressed(positive) {
                value += 1.0;
            }
            if self.is_key_pressed(negative) {
                value -= 1.0;
            }
            value
        };
        (
            axis(KeyCode::KeyW, KeyCode::KeyS),
            axis(KeyCode::KeyD, KeyCode::KeyA),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_just_pressed_is_edge_triggered() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyL);
        assert!(input.is_key_just_pressed(KeyCode::KeyL));

        input.begin_frame();
        input.on_key_pressed(KeyCode::KeyL); // auto-repeat
        assert!(!input.is_key_just_pressed(KeyCode::KeyL));
        assert!(input.is_key_pressed(KeyCode::KeyL));
    }

    #[test]
    fn test_movement_axes() {
        let mut input = InputState::new();
        assert_eq!(input.movement_axes(), (0.0, 0.0));

        input.on_key_pressed(KeyCode::KeyW);
        input.on_key_pressed(KeyCode::KeyA);
        assert_eq!(input.movement_axes(), (1.0, -1.0));

        input.on_key_pressed(KeyCode::KeyS);
        assert_eq!(input.movement_axes(), (0.0, -1.0));

        input.release_all();
        assert_eq!(input.movement_axes(), (0.0, 0.0));
    }

    #[test]
    fn test_mouse_motion_accumulates_until_frame_start() {
        let mut input = InputState::new();
        input.on_mouse_motion(2.0, -1.0);
        input.on_mouse_motion(3.0, 4.0);
        assert_eq!(input.mouse_delta(), (5.0, 3.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
    }
}
