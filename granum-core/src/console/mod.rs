//! Diagnostic serial console
//!
//! ASCII line protocol on the debug UART. Replies go through the console
//! transmit pump, which turns every LF into CR LF.

pub mod command;
pub mod exec;
pub mod line;

pub use command::{parse, Command, CommandError, CommandKind, CommandSpec, DwinCommand, COMMANDS};
pub use exec::{Console, ConsoleContext};
pub use line::{LineEditor, LineEvent, LINE_CAPACITY};
