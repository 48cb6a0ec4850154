//! Terminal front-end used by the `quizgate` binary.

pub mod terminal;

pub use terminal::{TerminalApp, TerminalCommand, parse_command, render_view};
