//! Non-volatile memory drivers

pub mod at24c;

pub use at24c::{At24c, EepromError};
