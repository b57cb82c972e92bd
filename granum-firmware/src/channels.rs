//! Inter-task communication channels
//!
//! The UART tasks are the interrupt side of the superloop: they hand received
//! bytes over through channels and report transmit completion through signals.
//! Uses embassy-sync primitives with a critical-section mutex.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::Vec;

use granum_hal_stm32c0::uart::{CONSOLE_BURST, DISPLAY_BURST};

/// Largest chunk handed over by one idle-line read
pub const RX_CHUNK: usize = 32;

/// Channel capacity for received chunks
const RX_CHANNEL_SIZE: usize = 8;

/// What a receive task delivers
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// Bytes received up to an idle line or a full buffer
    Data(Vec<u8, RX_CHUNK>),
    /// Framing, noise or overrun error
    Error,
}

pub type RxChannel = Channel<CriticalSectionRawMutex, RxEvent, RX_CHANNEL_SIZE>;

/// One in-flight transmit burst at a time
pub type TxChannel<const B: usize> = Channel<CriticalSectionRawMutex, Vec<u8, B>, 1>;

pub type TxDone = Signal<CriticalSectionRawMutex, ()>;

/// Console bytes from USART1
pub static CONSOLE_RX: RxChannel = Channel::new();

/// Display bytes from USART2
pub static DISPLAY_RX: RxChannel = Channel::new();

/// Console bursts waiting for USART1 DMA
pub static CONSOLE_TX: TxChannel<CONSOLE_BURST> = Channel::new();

/// Display bursts waiting for USART2 DMA
pub static DISPLAY_TX: TxChannel<DISPLAY_BURST> = Channel::new();

/// Console burst fully written
pub static CONSOLE_TX_DONE: TxDone = Signal::new();

/// Display burst fully written
pub static DISPLAY_TX_DONE: TxDone = Signal::new();
