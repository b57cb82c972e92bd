//! Board-agnostic core logic for the grain moisture meter firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (serial, EEPROM, sensors, clock, display)
//! - Non-blocking transmit pumps and the display transport
//! - Replicated configuration store and the EEPROM page writer
//! - Measurement scheduler, the power state machine and the sample servo
//!   sequence
//! - Diagnostic console

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod console;
pub mod io;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod traits;
pub mod ui;
