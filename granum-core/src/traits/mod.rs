//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod clock;
pub mod display;
pub mod eeprom;
pub mod sensor;
pub mod serial;
pub mod servo;

pub use clock::{ClockError, Date, DateTime, Time, WallClock};
pub use display::{DisplayError, DisplaySink};
pub use eeprom::EepromDevice;
pub use sensor::{FrequencyCounter, SensorError, TemperatureSensor, WeightSensor};
pub use serial::BurstTx;
pub use servo::{Servo, ServoError};
