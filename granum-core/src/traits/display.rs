//! Display sink trait for the DWIN touchscreen

use granum_protocol::FrameError;

/// Errors that can occur when queueing display writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Message could not be encoded into a frame
    Frame(FrameError),
    /// Transmit queue has no room for the whole frame
    BufferOverflow,
}

impl From<FrameError> for DisplayError {
    fn from(e: FrameError) -> Self {
        DisplayError::Frame(e)
    }
}

/// Trait for display output
///
/// The display owns every widget; the controller only writes variables
/// (VPs) and switches pages. Implementations queue frames and return
/// immediately.
pub trait DisplaySink {
    /// True while earlier writes are still being transmitted
    fn is_busy(&self) -> bool;

    /// Write text padded to `width` bytes
    fn write_text(&mut self, vp: u16, text: &str, width: u8) -> Result<(), DisplayError>;

    /// Write a 16-bit integer variable
    fn write_i16(&mut self, vp: u16, value: i16) -> Result<(), DisplayError>;

    /// Write a 32-bit integer variable
    fn write_i32(&mut self, vp: u16, value: i32) -> Result<(), DisplayError>;

    /// Switch to a page
    fn set_page(&mut self, page: u16) -> Result<(), DisplayError>;

    /// Send pre-built bytes verbatim
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), DisplayError>;
}
