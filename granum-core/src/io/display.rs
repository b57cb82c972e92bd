//! DWIN display transport
//!
//! Encodes display writes into frames and queues them on a transmit pump.
//! A frame is queued whole or not at all so a full queue never leaves a
//! truncated frame on the wire.

use granum_protocol::{ControllerMessage, FrameReceiver};

use super::pump::TxPump;
use crate::traits::{BurstTx, DisplayError, DisplaySink};

/// Display transmit side plus its frame receiver
pub struct DisplayTransport<T: BurstTx, const N: usize, const B: usize> {
    pump: TxPump<T, N, B>,
    receiver: FrameReceiver,
}

impl<T: BurstTx, const N: usize, const B: usize> DisplayTransport<T, N, B> {
    pub const fn new(tx: T) -> Self {
        Self {
            pump: TxPump::new(tx),
            receiver: FrameReceiver::new(),
        }
    }

    /// Queue a message as one frame
    pub fn send(&mut self, msg: &ControllerMessage<'_>) -> Result<(), DisplayError> {
        let bytes = msg.to_frame()?.encode_to_vec()?;
        if bytes.len() > self.pump.free() {
            return Err(DisplayError::BufferOverflow);
        }
        self.pump.enqueue_raw(&bytes);
        Ok(())
    }

    pub fn pump(&mut self) -> &mut TxPump<T, N, B> {
        &mut self.pump
    }

    pub fn receiver(&mut self) -> &mut FrameReceiver {
        &mut self.receiver
    }
}

impl<T: BurstTx, const N: usize, const B: usize> DisplaySink for DisplayTransport<T, N, B> {
    fn is_busy(&self) -> bool {
        self.pump.is_busy()
    }

    fn write_text(&mut self, vp: u16, text: &str, width: u8) -> Result<(), DisplayError> {
        self.send(&ControllerMessage::Text { vp, text, width })
    }

    fn write_i16(&mut self, vp: u16, value: i16) -> Result<(), DisplayError> {
        self.send(&ControllerMessage::Int16 { vp, value })
    }

    fn write_i32(&mut self, vp: u16, value: i32) -> Result<(), DisplayError> {
        self.send(&ControllerMessage::Int32 { vp, value })
    }

    fn set_page(&mut self, page: u16) -> Result<(), DisplayError> {
        self.send(&ControllerMessage::SetPage { page })
    }

    fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        if bytes.len() > self.pump.free() {
            return Err(DisplayError::BufferOverflow);
        }
        self.pump.enqueue_raw(bytes);
        Ok(())
    }
}
