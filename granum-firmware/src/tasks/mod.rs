//! Embassy async tasks
//!
//! The tasks only move bytes. Everything else runs in the superloop, which
//! reaches them through [`crate::channels`].

pub mod uart;

pub use uart::{console_tx_task, display_tx_task, uart_rx_task};
