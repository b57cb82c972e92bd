//! Non-blocking transmit pump
//!
//! ```text
//! enqueue() ──► TxQueue<N> ──pump()──► scratch[B] ──start()──► hardware
//!                                                       │
//!                      on_tx_complete() ◄───────────────┘
//! ```

use core::fmt;

use super::queue::TxQueue;
use crate::traits::BurstTx;

/// Byte queue plus a single in-flight hardware burst
pub struct TxPump<T: BurstTx, const N: usize, const B: usize> {
    queue: TxQueue<N>,
    scratch: [u8; B],
    busy: bool,
    tx: T,
}

impl<T: BurstTx, const N: usize, const B: usize> TxPump<T, N, B> {
    /// Create a pump driving `tx`
    pub const fn new(tx: T) -> Self {
        Self {
            queue: TxQueue::new(),
            scratch: [0; B],
            busy: false,
            tx,
        }
    }

    /// Queue one text byte; a line feed is preceded by a carriage return
    ///
    /// Bytes that do not fit are dropped. A line ending is queued whole or
    /// not at all. Never blocks.
    pub fn enqueue(&mut self, byte: u8) {
        if byte == b'\n' {
            if self.queue.free() < 2 {
                self.queue.discard(2);
                return;
            }
            self.queue.push(b'\r');
        }
        self.queue.push(byte);
    }

    /// Queue text, applying the line-feed rule to each byte
    pub fn enqueue_str(&mut self, text: &str) {
        for &byte in text.as_bytes() {
            self.enqueue(byte);
        }
    }

    /// Queue binary data verbatim
    pub fn enqueue_raw(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.queue.push(byte);
        }
    }

    /// Start the next burst if the transmitter is idle
    ///
    /// Returns immediately while a burst is in flight. If the hardware
    /// refuses the transfer the burst is lost and the pump is idle again.
    pub fn pump(&mut self) -> Result<(), T::Error> {
        if self.busy || self.queue.is_empty() {
            return Ok(());
        }

        let count = self.queue.pop_into(&mut self.scratch);
        self.busy = true;
        if let Err(e) = self.tx.start(&self.scratch[..count]) {
            self.busy = false;
            return Err(e);
        }
        Ok(())
    }

    /// Completion event from the transmitter
    pub fn on_tx_complete(&mut self) {
        self.busy = false;
    }

    /// True while a burst is in flight or bytes remain queued
    pub fn is_busy(&self) -> bool {
        self.busy || !self.queue.is_empty()
    }

    /// True only while a burst is in flight
    pub fn in_flight(&self) -> bool {
        self.busy
    }

    /// Free queue space in bytes
    pub fn free(&self) -> usize {
        self.queue.free()
    }

    /// Bytes dropped because the queue was full
    pub fn dropped(&self) -> u32 {
        self.queue.dropped()
    }

    pub fn tx(&self) -> &T {
        &self.tx
    }

    pub fn tx_mut(&mut self) -> &mut T {
        &mut self.tx
    }
}

impl<T: BurstTx, const N: usize, const B: usize> fmt::Write for TxPump<T, N, B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.enqueue_str(s);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use crate::traits::BurstTx;
    use heapless::Vec;

    /// Transmitter that records every burst
    #[derive(Default)]
    pub struct RecordingTx {
        pub sent: Vec<u8, 2048>,
        pub bursts: usize,
        pub fail_next: bool,
    }

    impl BurstTx for RecordingTx {
        type Error = ();

        fn start(&mut self, burst: &[u8]) -> Result<(), ()> {
            if self.fail_next {
                self.fail_next = false;
                return Err(());
            }
            self.bursts += 1;
            self.sent.extend_from_slice(burst).map_err(|_| ())
        }
    }
}
