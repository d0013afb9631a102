//! Input state management for pointer events.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event in screen coordinates of the map viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// The pointer left the viewport.
    Leave,
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

/// Tracks the current pointer state across events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    /// Whether the pointer is over the viewport.
    pub inside: bool,
    /// Currently pressed mouse buttons.
    pressed_buttons: HashSet<MouseButton>,
    /// Start position of the current left-button drag.
    pub drag_start: Option<Point>,
}

impl InputState {
    /// Create a new input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a pointer event.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        match *event {
            PointerEvent::Down { position, button } => {
                self.pointer_position = position;
                self.inside = true;
                self.pressed_buttons.insert(button);
                if button == MouseButton::Left {
                    self.drag_start = Some(position);
                }
            }
            PointerEvent::Up { position, button } => {
                self.pointer_position = position;
                self.pressed_buttons.remove(&button);
                if button == MouseButton::Left {
                    self.drag_start = None;
                }
            }
            PointerEvent::Move { position } | PointerEvent::Scroll { position, .. } => {
                self.pointer_position = position;
                self.inside = true;
            }
            PointerEvent::Leave => {
                self.inside = false;
            }
        }
    }

    /// Check if a button is currently pressed.
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Check if the left button is held down.
    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// Get the drag delta from start position, if dragging.
    pub fn drag_delta(&self) -> Option<Vec2> {
        self.drag_start.map(|start| self.pointer_position - start)
    }

    /// Forget all pressed buttons, e.g. when a modal dialog stole the
    /// release event.
    pub fn reset(&mut self) {
        self.pressed_buttons.clear();
        self.drag_start = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_press() {
        let mut input = InputState::new();

        input.handle_pointer_event(&PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Left,
        });

        assert!(input.is_button_pressed(MouseButton::Left));
        assert!(!input.is_button_pressed(MouseButton::Right));
        assert!(input.is_dragging());
    }

    #[test]
    fn test_button_release() {
        let mut input = InputState::new();

        input.handle_pointer_event(&PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Left,
        });
        input.handle_pointer_event(&PointerEvent::Up {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Left,
        });

        assert!(!input.is_button_pressed(MouseButton::Left));
        assert!(!input.is_dragging());
    }

    #[test]
    fn test_right_button_does_not_drag() {
        let mut input = InputState::new();

        input.handle_pointer_event(&PointerEvent::Down {
            position: Point::new(5.0, 5.0),
            button: MouseButton::Right,
        });

        assert!(input.is_button_pressed(MouseButton::Right));
        assert!(!input.is_dragging());
    }

    #[test]
    fn test_drag_tracking() {
        let mut input = InputState::new();

        input.handle_pointer_event(&PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Left,
        });
        input.handle_pointer_event(&PointerEvent::Move {
            position: Point::new(150.0, 120.0),
        });

        let delta = input.drag_delta().unwrap();
        assert!((delta.x - 50.0).abs() < f64::EPSILON);
        assert!((delta.y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_leave_and_return() {
        let mut input = InputState::new();

        input.handle_pointer_event(&PointerEvent::Move {
            position: Point::new(10.0, 10.0),
        });
        assert!(input.inside);

        input.handle_pointer_event(&PointerEvent::Leave);
        assert!(!input.inside);
        assert_eq!(input.pointer_position, Point::new(10.0, 10.0));

        input.handle_pointer_event(&PointerEvent::Scroll {
            position: Point::new(20.0, 30.0),
            delta: Vec2::new(0.0, 120.0),
        });
        assert!(input.inside);
        assert_eq!(input.pointer_position, Point::new(20.0, 30.0));
    }

    #[test]
    fn test_reset_clears_buttons() {
        let mut input = InputState::new();
        input.handle_pointer_event(&PointerEvent::Down {
            position: Point::ZERO,
            button: MouseButton::Left,
        });
        input.reset();
        assert!(!input.is_button_pressed(MouseButton::Left));
        assert!(input.drag_delta().is_none());
    }
}
