/// Platform-agnostic pointer input
use glam::Vec2;

/// Platform-independent input events. Positions are physical pixels
/// relative to the drawing surface, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMoved { x: f32, y: f32 },
    PointerDown { button: MouseButton, x: f32, y: f32 },
    PointerUp { button: MouseButton, x: f32, y: f32 },
    /// A completed press and release, as the browser's `click`.
    Click { x: f32, y: f32 },
    Wheel { delta_y: f32 },
    Resized { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

/// What the pointer is doing right now.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub pointer: Option<Vec2>,
    pub left_down: bool,
    pub right_down: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::PointerMoved { x, y } | InputEvent::Click { x, y } => {
                self.pointer = Some(Vec2::new(x, y));
            }
            InputEvent::PointerDown { button, x, y } => {
                self.pointer = Some(Vec2::new(x, y));
                self.set_button(button, true);
            }
            InputEvent::PointerUp { button, x, y } => {
                self.pointer = Some(Vec2::new(x, y));
                self.set_button(button, false);
            }
            InputEvent::Wheel { .. } | InputEvent::Resized { .. } => {}
        }
    }

    fn set_button(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.left_down = down,
            MouseButton::Right => self.right_down = down,
            MouseButton::Middle => {}
        }
    }

    /// Winit has no click event; a left release where the pointer currently
    /// is counts as one.
    pub fn click_from_release(&self, event: &InputEvent) -> Option<InputEvent> {
        match *event {
            InputEvent::PointerUp { button: MouseButton::Left, x, y } if self.left_down => {
                Some(InputEvent::Click { x, y })
            }
            _ => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{MouseEvent, WheelEvent};

    /// CSS pixels → physical pixels.
    fn physical(e: &MouseEvent, dpr: f64) -> (f32, f32) {
        ((e.client_x() as f64 * dpr) as f32, (e.client_y() as f64 * dpr) as f32)
    }

    pub fn mouse_move_to_input(e: &MouseEvent, dpr: f64) -> InputEvent {
        let (x, y) = physical(e, dpr);
        InputEvent::PointerMoved { x, y }
    }

    pub fn mouse_click_to_input(e: &MouseEvent, dpr: f64) -> InputEvent {
        let (x, y) = physical(e, dpr);
        InputEvent::Click { x, y }
    }

    pub fn mouse_button_to_input(e: &MouseEvent, dpr: f64, is_down: bool) -> InputEvent {
        let (x, y) = physical(e, dpr);
        let button = MouseButton::from_web_button(e.button());
        if is_down {
            InputEvent::PointerDown { button, x, y }
        } else {
            InputEvent::PointerUp { button, x, y }
        }
    }

    pub fn mouse_wheel_to_input(e: &WheelEvent) -> InputEvent {
        InputEvent::Wheel { delta_y: e.delta_y() as f32 }
    }
}
