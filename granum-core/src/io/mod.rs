//! Interrupt-friendly byte I/O
//!
//! Producers append to fixed-capacity queues from the superloop; the pump
//! moves bounded bursts to the hardware without ever blocking.

pub mod display;
pub mod pump;
pub mod queue;

pub use display::DisplayTransport;
pub use pump::TxPump;
pub use queue::TxQueue;
