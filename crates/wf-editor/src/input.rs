//! Input abstraction layer.
//!
//! Normalizes host pointer and keyboard events into a unified `InputEvent`
//! consumed by the editor session. Coordinates are canvas coordinates.

use wf_core::Point;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Ctrl on Linux/Windows, ⌘ on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Primary button pressed.
    PointerDown { x: f32, y: f32, modifiers: Modifiers },

    PointerMove { x: f32, y: f32, modifiers: Modifiers },

    PointerUp { x: f32, y: f32, modifiers: Modifiers },

    /// Primary button double-click.
    DoubleClick { x: f32, y: f32 },

    /// Secondary button (right-click) at a canvas position.
    ContextMenu { x: f32, y: f32 },

    /// `KeyboardEvent.key` value, e.g. `"Escape"` or `"z"`.
    Key { key: String, modifiers: Modifiers },

    /// The canvas lost focus.
    Blur,
}

impl InputEvent {
    pub fn pointer_down(x: f32, y: f32) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_move(x: f32, y: f32) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f32, y: f32) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers: Modifiers::NONE,
        }
    }

    /// Extract position if this is a positioned event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::DoubleClick { x, y }
            | Self::ContextMenu { x, y } => Some(Point::new(*x, *y)),
            Self::Key { .. } | Self::Blur => None,
        }
    }
}
