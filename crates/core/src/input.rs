//! Pointer state for camera control.
//!
//! Owned by the event loop and passed by reference; the camera never reads
//! global input.

use crate::{Vec2, camera::OrbitalCamera};

/// Mouse button currently dragging, if any.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragButton {
    #[default]
    None,
    Left,
    Right,
    Middle,
}

/// Pointer movement while a button is held. `dy` is positive upward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drag {
    pub button: DragButton,
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PointerState {
    pressed: DragButton,
    last: Option<Vec2>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn pressed(&self) -> DragButton {
        self.pressed
    }

    /// Record a press or release. Releasing any button ends the drag.
    pub fn button(&mut self, button: DragButton, pressed: bool) {
        self.pressed = if pressed { button } else { DragButton::None };
    }

    /// Record a cursor position; returns the drag offset if a button is held.
    pub fn moved(&mut self, x: f32, y: f32) -> Option<Drag> {
        let prev = self.last.replace(Vec2::new(x, y));
        if self.pressed == DragButton::None {
            return None;
        }
        let prev = prev?;
        Some(Drag {
            button: self.pressed,
            dx: x - prev.x,
            dy: prev.y - y,
        })
    }

    /// Forget the last position (cursor left the window).
    pub fn reset(&mut self) {
        self.last = None;
        self.pressed = DragButton::None;
    }
}

/// Left orbits, right tracks + pedestals, middle dollies.
pub fn apply_drag(drag: &Drag, camera: &mut OrbitalCamera) {
    match drag.button {
        DragButton::Left => camera.orbit(drag.dx, drag.dy),
        DragButton::Right => {
            camera.track(drag.dx);
            camera.pedestal(drag.dy);
        }
        DragButton::Middle => camera.dolly(drag.dy),
        DragButton::None => {}
    }
}
