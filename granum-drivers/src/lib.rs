//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in granum-core for the instrument's peripherals:
//!
//! - AT24C-series I2C EEPROM
//! - ADS1232 load-cell ADC (bit-banged)
//! - Capacitance oscillator pulse counter (hardware timer latch)
//! - MCU internal temperature sensor
//! - RTC calendar wall clock
//! - Hobby servos on PWM channels

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod eeprom;
pub mod scale;
pub mod sensor;
pub mod servo;
