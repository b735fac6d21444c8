//! Line commands typed on stdin, mapped to controller input.

use amiibox_core::input::{Button, InputEvent, Trigger};

pub const HELP: &str = "commands: up, down, a (confirm), b (back), l/r (emulation off/on), \
                        rs (toggle connection), q (quit), empty line (refresh)";

/// What one stdin line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum LineCommand {
    Input(InputEvent),
    /// Poll and redraw without input.
    Refresh,
    Help,
    Unknown(String),
}

pub fn parse_line(line: &str) -> LineCommand {
    let event = match line.trim().to_ascii_lowercase().as_str() {
        "" => return LineCommand::Refresh,
        "help" | "?" => return LineCommand::Help,
        "up" | "k" => InputEvent::ButtonPress(Button::Up),
        "down" | "j" => InputEvent::ButtonPress(Button::Down),
        "a" => InputEvent::ButtonPress(Button::Confirm),
        "b" => InputEvent::ButtonPress(Button::Cancel),
        "l" => InputEvent::TriggerPress(Trigger::Left),
        "r" => InputEvent::TriggerPress(Trigger::Right),
        "rs" => InputEvent::ButtonPress(Button::StickPress),
        "q" | "quit" => InputEvent::Quit,
        other => return LineCommand::Unknown(other.to_string()),
    };
    LineCommand::Input(event)
}
