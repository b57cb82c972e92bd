//! Measurement scheduling
//!
//! Independent millisecond timers drive sampling and display refresh from
//! the superloop. Nothing here blocks.

pub mod measurement;
pub mod periodic;

pub use measurement::{scale_a, MeasurementScheduler, Measurements, TEMP_FAULT_C};
pub use periodic::Periodic;
