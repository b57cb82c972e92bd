//! Interrupt-fed frame reassembly
//!
//! The UART delivers either single bytes (RX interrupt) or bursts (DMA with
//! idle-line detection). Both paths feed the same accumulator. Exactly one
//! frame can wait for dispatch; the superloop hands it to a [`FrameHandler`]
//! through [`FrameReceiver::process`].

use crate::frame::{FRAME_HEADER, MAX_FRAME_LEN, MIN_BODY_LEN, PREAMBLE_LEN};

/// Receiver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxState {
    /// Searching for the first header byte
    Idle,
    /// Header seen, collecting the rest of the frame
    Accumulating,
    /// A complete frame is waiting for [`FrameReceiver::process`]
    FrameReady,
    /// Transport error; the partial frame was dropped
    Error,
}

/// Counters for link diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxStats {
    /// Frames handed to the handler
    pub frames: u32,
    /// Overrun / framing errors reported by the transport
    pub errors: u32,
    /// Frames whose length byte exceeded the buffer
    pub oversized: u32,
    /// Frames too short to carry command + address
    pub malformed: u32,
    /// Bytes dropped because a frame was still waiting for dispatch
    pub dropped: u32,
}

/// Consumer of complete frames
pub trait FrameHandler {
    /// Called once per complete frame; `frame` includes header and length byte
    fn on_frame(&mut self, frame: &[u8]);
}

impl<F: FnMut(&[u8])> FrameHandler for F {
    fn on_frame(&mut self, frame: &[u8]) {
        self(frame)
    }
}

/// Length-prefixed frame accumulator
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    state: RxState,
    buffer: [u8; MAX_FRAME_LEN],
    len: usize,
    expected: usize,
    stats: RxStats,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReceiver {
    /// Create a receiver armed for a header search
    pub const fn new() -> Self {
        Self {
            state: RxState::Idle,
            buffer: [0; MAX_FRAME_LEN],
            len: 0,
            expected: 0,
            stats: RxStats {
                frames: 0,
                errors: 0,
                oversized: 0,
                malformed: 0,
                dropped: 0,
            },
        }
    }

    /// Current state
    pub fn state(&self) -> RxState {
        self.state
    }

    /// Link counters
    pub fn stats(&self) -> RxStats {
        self.stats
    }

    /// Feed one received byte
    pub fn on_rx_byte(&mut self, byte: u8) {
        match self.state {
            RxState::FrameReady => {
                self.stats.dropped = self.stats.dropped.wrapping_add(1);
            }
            RxState::Idle | RxState::Error => {
                self.rearm();
                if byte == FRAME_HEADER[0] {
                    self.push(byte);
                    self.state = RxState::Accumulating;
                }
            }
            RxState::Accumulating => self.accumulate(byte),
        }
    }

    /// Feed a burst of bytes (DMA / idle-line event)
    pub fn on_rx_event(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.on_rx_byte(byte);
        }
    }

    /// Report an overrun or framing error from the transport
    ///
    /// The partial frame is discarded; reception re-arms on the next byte.
    /// A frame already waiting for dispatch is kept.
    pub fn on_error(&mut self) {
        self.stats.errors = self.stats.errors.wrapping_add(1);
        if self.state != RxState::FrameReady {
            self.rearm();
            self.state = RxState::Error;
        }
    }

    /// Dispatch a complete frame, if any
    ///
    /// Returns true when a frame was handed to `handler`.
    pub fn process<H: FrameHandler + ?Sized>(&mut self, handler: &mut H) -> bool {
        if self.state != RxState::FrameReady {
            return false;
        }

        handler.on_frame(&self.buffer[..self.len]);
        self.rearm();
        true
    }

    fn accumulate(&mut self, byte: u8) {
        match self.len {
            1 => {
                if byte == FRAME_HEADER[1] {
                    self.push(byte);
                } else if byte != FRAME_HEADER[0] {
                    // 0x5A 0x5A keeps the second byte as a new header candidate
                    self.rearm();
                }
            }
            2 => {
                let body = byte as usize;
                if body < MIN_BODY_LEN {
                    self.stats.malformed = self.stats.malformed.wrapping_add(1);
                    self.rearm();
                } else if PREAMBLE_LEN + body > MAX_FRAME_LEN {
                    self.stats.oversized = self.stats.oversized.wrapping_add(1);
                    self.rearm();
                } else {
                    self.push(byte);
                    self.expected = PREAMBLE_LEN + body;
                }
            }
            _ => {
                self.push(byte);
                if self.len == self.expected {
                    self.state = RxState::FrameReady;
                    self.stats.frames = self.stats.frames.wrapping_add(1);
                }
            }
        }
    }

    fn push(&mut self, byte: u8) {
        // Bounded by the length check in `accumulate`
        if self.len < MAX_FRAME_LEN {
            self.buffer[self.len] = byte;
            self.len += 1;
        }
    }

    fn rearm(&mut self) {
        self.state = RxState::Idle;
        self.len = 0;
        self.expected = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn collect(receiver: &mut FrameReceiver) -> Option<heapless::Vec<u8, MAX_FRAME_LEN>> {
        let mut out = None;
        receiver.process(&mut |frame: &[u8]| {
            out = Some(heapless::Vec::from_slice(frame).unwrap());
        });
        out
    }

    #[test]
    fn test_incomplete_frame_never_dispatched() {
        let mut rx = FrameReceiver::new();
        rx.on_rx_event(&[0x5A, 0xA5, 0x04, 0x83, 0x00, 0x01]);

        assert_eq!(rx.state(), RxState::Accumulating);
        assert!(collect(&mut rx).is_none());
        assert_eq!(rx.stats().frames, 0);
    }

    #[test]
    fn test_complete_frame_dispatched_once() {
        let mut rx = FrameReceiver::new();
        rx.on_rx_event(&[0x5A, 0xA5, 0x04, 0x83, 0x00, 0x01, 0x01]);

        assert_eq!(rx.state(), RxState::FrameReady);
        let frame = collect(&mut rx).unwrap();
        assert_eq!(&frame[..], &[0x5A, 0xA5, 0x04, 0x83, 0x00, 0x01, 0x01]);
        assert!(collect(&mut rx).is_none());
        assert_eq!(rx.state(), RxState::Idle);
    }

    #[test]
    fn test_resync_after_garbage() {
        let mut rx = FrameReceiver::new();
        rx.on_rx_event(&[0x00, 0xFF, 0x5A, 0x12, 0x5A, 0x5A, 0xA5, 0x03, 0x82, 0x4F, 0x4B]);

        let frame = collect(&mut rx).unwrap();
        assert_eq!(&frame[..], &[0x5A, 0xA5, 0x03, 0x82, 0x4F, 0x4B]);
    }

    #[test]
    fn test_error_discards_partial_frame() {
        let mut rx = FrameReceiver::new();
        rx.on_rx_event(&[0x5A, 0xA5, 0x05, 0x83]);
        rx.on_error();
        assert_eq!(rx.state(), RxState::Error);

        // The tail of the broken frame is not mistaken for a new one
        rx.on_rx_event(&[0x10, 0x00, 0x01]);
        assert!(collect(&mut rx).is_none());

        rx.on_rx_event(&[0x5A, 0xA5, 0x03, 0x82, 0x4F, 0x4B]);
        assert!(collect(&mut rx).is_some());
        assert_eq!(rx.stats().errors, 1);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut rx = FrameReceiver::new();
        rx.on_rx_event(&[0x5A, 0xA5, 0xF0, 0x83, 0x00, 0x01]);

        assert_eq!(rx.state(), RxState::Idle);
        assert_eq!(rx.stats().oversized, 1);
        assert!(collect(&mut rx).is_none());
    }

    #[test]
    fn test_short_length_ignored() {
        let mut rx = FrameReceiver::new();
        rx.on_rx_event(&[0x5A, 0xA5, 0x02, 0x83, 0x00]);

        assert!(collect(&mut rx).is_none());
        assert_eq!(rx.stats().malformed, 1);
    }

    #[test]
    fn test_bytes_dropped_while_frame_pending() {
        let mut rx = FrameReceiver::new();
        rx.on_rx_event(&[0x5A, 0xA5, 0x03, 0x82, 0x4F, 0x4B]);
        rx.on_rx_event(&[0x5A, 0xA5]);

        assert_eq!(rx.stats().dropped, 2);
        let frame = collect(&mut rx).unwrap();
        assert_eq!(frame.len(), 6);
    }

    #[test]
    fn test_max_length_frame_accepted() {
        let mut rx = FrameReceiver::new();
        let body = (MAX_FRAME_LEN - PREAMBLE_LEN) as u8;
        rx.on_rx_event(&[0x5A, 0xA5, body]);
        for i in 0..body {
            rx.on_rx_byte(i);
        }

        let frame = collect(&mut rx).unwrap();
        assert_eq!(frame.len(), MAX_FRAME_LEN);
    }

    proptest! {
        #[test]
        fn test_noise_only_yields_well_formed_frames(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let mut rx = FrameReceiver::new();
            for byte in bytes {
                rx.on_rx_byte(byte);
                if let Some(frame) = collect(&mut rx) {
                    prop_assert_eq!(&frame[..2], &FRAME_HEADER[..]);
                    prop_assert!(frame[2] as usize >= MIN_BODY_LEN);
                    prop_assert_eq!(frame.len(), PREAMBLE_LEN + frame[2] as usize);
                }
            }
        }
    }
}
