//! Frame encoding and decoding for the DWIN DGUS serial protocol.
//!
//! Frame format:
//! - HEADER (2 bytes): 0x5A 0xA5 synchronization pair
//! - LENGTH (1 byte): number of bytes following the length byte
//! - COMMAND (1 byte): 0x82 write VP, 0x83 read VP / VP report
//! - ADDRESS (2 bytes): VP address, big-endian
//! - PAYLOAD (0-58 bytes): command-specific data
//!
//! The display has no checksum mode enabled; integrity relies on the length
//! byte and the header search done by [`crate::FrameReceiver`].

use heapless::Vec;

/// Frame synchronization header
pub const FRAME_HEADER: [u8; 2] = [0x5A, 0xA5];

/// Write variable(s) starting at a VP address (controller -> display)
pub const CMD_WRITE_VP: u8 = 0x82;

/// Read variable(s); the display answers and reports touches with this command
pub const CMD_READ_VP: u8 = 0x83;

/// Largest frame the receiver will buffer, header included
pub const MAX_FRAME_LEN: usize = 64;

/// Bytes before the length-counted section (header + length byte)
pub const PREAMBLE_LEN: usize = 3;

/// Smallest valid length byte: command + VP address
pub const MIN_BODY_LEN: usize = 3;

/// Maximum payload after command and address
pub const MAX_PAYLOAD_SIZE: usize = MAX_FRAME_LEN - PREAMBLE_LEN - MIN_BODY_LEN;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Header bytes are not 0x5A 0xA5
    BadHeader,
    /// Length byte disagrees with the number of bytes supplied
    LengthMismatch,
    /// Frame is shorter than header + command + address
    TooShort,
    /// Command byte is neither write nor read
    UnsupportedCommand,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Command byte (0x82 / 0x83)
    pub command: u8,
    /// VP address
    pub vp: u16,
    /// Payload data after the address
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame with the given command, address and payload
    pub fn new(command: u8, vp: u16, payload: &[u8]) -> Result<Self, FrameError> {
        let mut payload_vec = Vec::new();
        payload_vec
            .extend_from_slice(payload)
            .map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            command,
            vp,
            payload: payload_vec,
        })
    }

    /// Total encoded length in bytes
    pub fn encoded_len(&self) -> usize {
        PREAMBLE_LEN + MIN_BODY_LEN + self.payload.len()
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let [vp_hi, vp_lo] = self.vp.to_be_bytes();
        buffer[0] = FRAME_HEADER[0];
        buffer[1] = FRAME_HEADER[1];
        buffer[2] = (MIN_BODY_LEN + self.payload.len()) as u8;
        buffer[3] = self.command;
        buffer[4] = vp_hi;
        buffer[5] = vp_lo;
        buffer[6..frame_len].copy_from_slice(&self.payload);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_LEN>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_LEN];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }

    /// Decode a complete frame as delivered by the receiver
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < PREAMBLE_LEN + MIN_BODY_LEN {
            return Err(FrameError::TooShort);
        }
        if bytes[..2] != FRAME_HEADER {
            return Err(FrameError::BadHeader);
        }
        if bytes[2] as usize + PREAMBLE_LEN != bytes.len() {
            return Err(FrameError::LengthMismatch);
        }

        let vp = u16::from_be_bytes([bytes[4], bytes[5]]);
        Self::new(bytes[3], vp, &bytes[6..])
    }
}
