//! Transmit pump to UART task bridge

use heapless::Vec;

use granum_core::traits::BurstTx;

use crate::channels::TxChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Burst larger than the task's buffer
    TooLong,
    /// Previous burst not yet taken by the task
    Busy,
}

/// Hands each burst to a UART transmit task
///
/// Completion arrives later through the matching `*_TX_DONE` signal.
pub struct ChannelTx<const B: usize> {
    channel: &'static TxChannel<B>,
}

impl<const B: usize> ChannelTx<B> {
    pub const fn new(channel: &'static TxChannel<B>) -> Self {
        Self { channel }
    }
}

impl<const B: usize> BurstTx for ChannelTx<B> {
    type Error = BridgeError;

    fn start(&mut self, burst: &[u8]) -> Result<(), Self::Error> {
        let burst = Vec::from_slice(burst).map_err(|_| BridgeError::TooLong)?;
        self.channel.try_send(burst).map_err(|_| BridgeError::Busy)
    }
}
