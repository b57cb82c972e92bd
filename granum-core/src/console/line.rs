//! Console line editor

use heapless::String;

/// Receive buffer size; one byte is kept free so a line holds at most
/// `LINE_CAPACITY - 1` characters
pub const LINE_CAPACITY: usize = 128;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7F;

/// Result of feeding one received byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineEvent {
    /// Nothing to echo
    None,
    /// Byte stored; echo it
    Echo(u8),
    /// Last character removed; echo `BS SP BS`
    Erase,
    /// Non-empty line terminated and waiting for processing
    Submitted,
    /// Empty line terminated; show the prompt again
    Prompt,
}

/// Accumulates one command line
///
/// Once a line is submitted, further bytes are ignored until the line is
/// taken with [`LineEditor::clear`].
#[derive(Debug, Default)]
pub struct LineEditor<const N: usize> {
    buf: String<N>,
    ready: bool,
}

impl<const N: usize> LineEditor<N> {
    pub const fn new() -> Self {
        Self {
            buf: String::new(),
            ready: false,
        }
    }

    pub fn feed(&mut self, byte: u8) -> LineEvent {
        if self.ready {
            return LineEvent::None;
        }

        match byte {
            b'\r' | b'\n' if self.buf.is_empty() => LineEvent::Prompt,
            b'\r' | b'\n' => {
                self.ready = true;
                LineEvent::Submitted
            }
            BACKSPACE | DELETE => match self.buf.pop() {
                Some(_) => LineEvent::Erase,
                None => LineEvent::None,
            },
            0x20..=0x7E if self.buf.len() < N.saturating_sub(1) => {
                // Printable ASCII always fits after the length check
                let _ = self.buf.push(byte as char);
                LineEvent::Echo(byte)
            }
            _ => LineEvent::None,
        }
    }

    /// The submitted line, if one is waiting
    pub fn line(&self) -> Option<&str> {
        self.ready.then_some(self.buf.as_str())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Drop the current line and accept input again
    pub fn clear(&mut self) {
        self.buf.clear();
        self.ready = false;
    }
}
