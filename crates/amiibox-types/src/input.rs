//! Platform-agnostic input event types.
//!
//! The host maps its native controller input to these enums. The overlay
//! core never sees raw platform input.

use serde::{Deserialize, Serialize};

/// A platform-agnostic input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A face / d-pad / stick button pressed.
    ButtonPress(Button),
    /// Shoulder trigger pressed.
    TriggerPress(Trigger),
    /// The host asked the overlay to close.
    Quit,
}

/// Buttons the overlay reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Up,
    Down,
    /// A on Switch-style pads.
    Confirm,
    /// B on Switch-style pads.
    Cancel,
    /// Right stick click.
    StickPress,
}

/// Shoulder / trigger buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    Left,
    Right,
}
