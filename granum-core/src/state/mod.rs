//! Instrument state machines
//!
//! The instrument sleeps in STOP mode and wakes on a touch. A wake must be
//! confirmed on the display within a few seconds or the instrument goes
//! back to sleep. A start-process key runs the sample servo sequence.

pub mod power;
pub mod sample;

pub use power::{PowerAction, PowerEvent, PowerManager, PowerState, WAKE_CONFIRM_MS};
pub use sample::{SampleEvent, SampleSequence, SampleStep};
