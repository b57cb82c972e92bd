//! Load-cell front ends

pub mod ads1232;

pub use ads1232::{Ads1232, ScaleCalibration};
