//! Measurement sensors

pub mod internal_temp;
pub mod pulse;

pub use internal_temp::{AdcReader, InternalTemperature, TempCalibration};
pub use pulse::{CounterLatch, PulseCounter};
