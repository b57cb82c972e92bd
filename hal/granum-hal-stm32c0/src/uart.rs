//! UART configuration for STM32C0
//!
//! USART1 carries the diagnostic console, USART2 the DWIN display link.
//! Both transmit through DMA in bounded bursts.

use embassy_stm32::usart::Error as UsartError;

/// Console baud rate
pub const CONSOLE_BAUDRATE: u32 = 115_200;
/// DWIN display baud rate
pub const DISPLAY_BAUDRATE: u32 = 115_200;

/// Largest DMA burst per transfer
pub const CONSOLE_BURST: usize = 64;
pub const DISPLAY_BURST: usize = 64;

/// UART configuration
#[derive(Debug, Clone, Copy)]
pub struct UartConfig {
    /// Baud rate
    pub baudrate: u32,
}

impl UartConfig {
    pub const fn console() -> Self {
        Self {
            baudrate: CONSOLE_BAUDRATE,
        }
    }

    pub const fn display() -> Self {
        Self {
            baudrate: DISPLAY_BAUDRATE,
        }
    }
}

impl From<UartConfig> for embassy_stm32::usart::Config {
    fn from(cfg: UartConfig) -> Self {
        let mut config = embassy_stm32::usart::Config::default();
        config.baudrate = cfg.baudrate;
        config
    }
}

/// Error from UART operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartBusError {
    /// Framing error
    Framing,
    /// Noise error
    Noise,
    /// Overrun error
    Overrun,
    /// Parity error
    Parity,
    /// Buffer too long for one DMA transfer
    BufferTooLong,
    /// Other error
    Other,
}

impl From<UsartError> for UartBusError {
    fn from(e: UsartError) -> Self {
        match e {
            UsartError::Framing => UartBusError::Framing,
            UsartError::Noise => UartBusError::Noise,
            UsartError::Overrun => UartBusError::Overrun,
            UsartError::Parity => UartBusError::Parity,
            UsartError::BufferTooLong => UartBusError::BufferTooLong,
            _ => UartBusError::Other,
        }
    }
}
