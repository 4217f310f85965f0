// Input state tracking for keyboard and mouse
// Abstracts winit events into a queryable per-frame snapshot

use std::collections::HashSet;

use bevy_ecs::prelude::*;
use winit::event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Resource, Debug, Default)]
pub struct InputState {
    // Keyboard
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    // Mouse
    pub mouse_position: (f32, f32),
    /// Raw device motion accumulated this frame. Unlike cursor deltas this
    /// keeps reporting while the cursor is grabbed.
    pub mouse_motion: (f32, f32),
    left_clicks: u32,

    // Scroll: accumulated vertical scroll this frame in lines, reset in end_frame()
    pub scroll_delta: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a winit WindowEvent into the input state.
    /// Call this once per event before the game's own event handling.
    pub fn process_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if !event.repeat {
                                self.keys_pressed.insert(key);
                            }
                            self.keys_held.insert(key);
                        }
                        ElementState::Released => { self.keys_held.remove(&key); }
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = (position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                self.left_clicks += 1;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.scroll_delta += y;
            }
            WindowEvent::Focused(false) => {
                self.keys_held.clear();
            }
            _ => {}
        }
    }

    pub fn process_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.mouse_motion.0 += delta.0 as f32;
            self.mouse_motion.1 += delta.1 as f32;
        }
    }

    /// Call once per frame after update() and render() have consumed input.
    /// Resets per-frame accumulators.
    pub fn end_frame(&mut self) {
        self.scroll_delta = 0.0;
        self.mouse_motion = (0.0, 0.0);
        self.keys_pressed.clear();
        self.left_clicks = 0;
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn was_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn left_clicked(&self) -> bool {
        self.left_clicks > 0
    }

    /// Drop clicks that landed on UI so the world does not see them.
    pub fn discard_clicks(&mut self) {
        self.left_clicks = 0;
    }

    /// -1, 0 or 1 per axis: (D - A, S - W).
    pub fn move_axes(&self) -> (f32, f32) {
        let axis = |pos: KeyCode, neg: KeyCode| {
            (self.is_key_held(pos) as i32 - self.is_key_held(neg) as i32) as f32
        };
        (axis(KeyCode::KeyD, KeyCode::KeyA), axis(KeyCode::KeyS, KeyCode::KeyW))
    }

    #[cfg(test)]
    pub fn press(&mut self, key: KeyCode) {
        self.keys_held.insert(key);
        self.keys_pressed.insert(key);
    }

    #[cfg(test)]
    pub fn release(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    #[cfg(test)]
    pub fn click(&mut self) {
        self.left_clicks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_axes_cancel_out() {
        let mut input = InputState::new();
        input.press(KeyCode::KeyW);
        assert_eq!(input.move_axes(), (0.0, -1.0));
        input.press(KeyCode::KeyS);
        input.press(KeyCode::KeyD);
        assert_eq!(input.move_axes(), (1.0, 0.0));
    }

    #[test]
    fn end_frame_clears_edges_not_holds() {
        let mut input = InputState::new();
        input.press(KeyCode::KeyF);
        input.click();
        input.scroll_delta = 2.0;
        input.end_frame();
        assert!(input.is_key_held(KeyCode::KeyF));
        assert!(!input.was_key_pressed(KeyCode::KeyF));
        assert!(!input.left_clicked());
        assert_eq!(input.scroll_delta, 0.0);
    }

    #[test]
    fn device_motion_accumulates() {
        let mut input = InputState::new();
        input.process_device_event(&DeviceEvent::MouseMotion { delta: (3.0, -1.0) });
        input.process_device_event(&DeviceEvent::MouseMotion { delta: (2.0, 4.0) });
        assert_eq!(input.mouse_motion, (5.0, 3.0));
    }
}
