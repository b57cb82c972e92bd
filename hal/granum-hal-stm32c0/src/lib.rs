//! STM32C0-specific HAL for the Granum firmware
//!
//! This crate provides STM32C0-specific constants, configuration types and
//! error converters. The firmware uses these along with embassy-stm32
//! directly for peripheral access.
//!
//! - STM32C071RB (main board MCU)
//! - TIM2 edge counter for the frequency sensor, TIM3 servo PWM timing
//!
//! # Features
//!
//! - `stm32c071rb` - Enable support for STM32C071RBT6
//! - `defmt` - Enable debug formatting support

#![no_std]

pub mod adc;
pub mod counter;
pub mod i2c;
pub mod servo;
pub mod uart;
