//! Transmit-side serial trait

/// A hardware transmitter that sends one bounded burst at a time
///
/// `start` only launches the transfer (DMA or interrupt driven). The owner
/// is told about completion through its own `on_tx_complete` entry point,
/// which the platform calls from the completion interrupt or task.
pub trait BurstTx {
    /// Error returned when the transfer cannot be started
    type Error;

    /// Begin transmitting `burst`
    ///
    /// The implementation must copy or fully consume `burst` before
    /// returning; the caller reuses the buffer for the next burst.
    fn start(&mut self, burst: &[u8]) -> Result<(), Self::Error>;
}
