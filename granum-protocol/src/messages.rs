//! Message types for the DWIN display protocol
//!
//! Messages are divided into two categories:
//! - Controller → Display: VP writes (text, integers, page switch) and VP reads
//! - Display → Controller: write acknowledgements and VP reports

use crate::frame::{Frame, FrameError, CMD_READ_VP, CMD_WRITE_VP, MAX_PAYLOAD_SIZE};
use heapless::{String, Vec};

/// System VP that selects the displayed page
pub const VP_PAGE_SWITCH: u16 = 0x0084;

/// Fill byte for unused text positions
pub const TEXT_PAD: u8 = 0xFF;

/// Payload the display sends back after a successful write ("OK")
pub const WRITE_ACK: [u8; 2] = [0x4F, 0x4B];

/// Messages from the controller to the display
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerMessage<'a> {
    /// Write text into a VP of fixed width, padded with 0xFF
    Text { vp: u16, text: &'a str, width: u8 },
    /// Write a 16-bit integer variable
    Int16 { vp: u16, value: i16 },
    /// Write a 32-bit integer variable (two consecutive VP words)
    Int32 { vp: u16, value: i32 },
    /// Switch the displayed page
    SetPage { page: u16 },
    /// Write raw bytes starting at a VP
    Raw { vp: u16, data: &'a [u8] },
    /// Ask the display to report `words` VP words
    ReadVp { vp: u16, words: u8 },
}

impl<'a> ControllerMessage<'a> {
    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            ControllerMessage::Text { vp, text, width } => {
                let width = *width as usize;
                if width > MAX_PAYLOAD_SIZE {
                    return Err(FrameError::PayloadTooLarge);
                }

                let bytes = text.as_bytes();
                let len = bytes.len().min(width);

                let mut payload = Vec::<u8, MAX_PAYLOAD_SIZE>::new();
                payload
                    .extend_from_slice(&bytes[..len])
                    .map_err(|_| FrameError::PayloadTooLarge)?;
                payload
                    .resize(width, TEXT_PAD)
                    .map_err(|_| FrameError::PayloadTooLarge)?;

                Frame::new(CMD_WRITE_VP, *vp, &payload)
            }
            ControllerMessage::Int16 { vp, value } => {
                Frame::new(CMD_WRITE_VP, *vp, &value.to_be_bytes())
            }
            ControllerMessage::Int32 { vp, value } => {
                Frame::new(CMD_WRITE_VP, *vp, &value.to_be_bytes())
            }
            ControllerMessage::SetPage { page } => {
                let [hi, lo] = page.to_be_bytes();
                Frame::new(CMD_WRITE_VP, VP_PAGE_SWITCH, &[0x5A, 0x01, hi, lo])
            }
            ControllerMessage::Raw { vp, data } => Frame::new(CMD_WRITE_VP, *vp, data),
            ControllerMessage::ReadVp { vp, words } => Frame::new(CMD_READ_VP, *vp, &[*words]),
        }
    }
}

/// A VP report: the display's answer to a read, or a touch key upload
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VpReport {
    /// Reported VP address
    pub vp: u16,
    /// Number of 16-bit words announced by the display
    pub words: u8,
    /// Raw variable data
    pub data: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl VpReport {
    /// Key value: the last two data bytes, big-endian
    ///
    /// Touch keys upload a single word; text inputs end with their
    /// terminator word, so this is only meaningful for key/int VPs.
    pub fn value(&self) -> u16 {
        match self.data.len() {
            0 => 0,
            1 => self.data[0] as u16,
            n => u16::from_be_bytes([self.data[n - 2], self.data[n - 1]]),
        }
    }

    /// Printable text carried by the report
    ///
    /// Padding (0xFF) and non-printable bytes are skipped; text longer than
    /// `N` is truncated.
    pub fn text<const N: usize>(&self) -> String<N> {
        let mut out = String::new();
        for &byte in self.data.iter() {
            if !(0x20..=0x7E).contains(&byte) {
                continue;
            }
            if out.push(byte as char).is_err() {
                break;
            }
        }
        out
    }
}

/// Frames received from the display
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayMessage {
    /// Acknowledgement of a previous write
    WriteAck,
    /// Variable report
    Report(VpReport),
}

impl DisplayMessage {
    /// Parse a message from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.command {
            CMD_WRITE_VP => Ok(DisplayMessage::WriteAck),
            CMD_READ_VP => {
                let (&words, data) = frame.payload.split_first().ok_or(FrameError::TooShort)?;
                let data = Vec::from_slice(data).map_err(|_| FrameError::PayloadTooLarge)?;
                Ok(DisplayMessage::Report(VpReport {
                    vp: frame.vp,
                    words,
                    data,
                }))
            }
            _ => Err(FrameError::UnsupportedCommand),
        }
    }

    /// Parse a message straight from received bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        Self::from_frame(&Frame::decode(bytes)?)
    }
}
