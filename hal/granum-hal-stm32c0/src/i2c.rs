//! I2C1 setup for the configuration EEPROM
//!
//! The AT24C32 is driven in blocking mode at standard speed; the paged
//! writer never issues a transfer while the part is in its write cycle.

use embassy_stm32::i2c;
use embassy_stm32::time::Hertz;

/// AT24C32 rated clock at 1.8 V
pub const EEPROM_BUS_HZ: u32 = 100_000;

/// Bus settings for the EEPROM
#[derive(Debug, Clone, Copy)]
pub struct I2cConfig {
    /// SCL frequency in Hz
    pub frequency: u32,
    /// Enable the internal pull-ups when the board has none fitted
    pub internal_pullups: bool,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: EEPROM_BUS_HZ,
            internal_pullups: false,
        }
    }
}

impl From<I2cConfig> for i2c::Config {
    fn from(cfg: I2cConfig) -> Self {
        let mut config = i2c::Config::default();
        config.frequency = Hertz(cfg.frequency);
        config.scl_pullup = cfg.internal_pullups;
        config.sda_pullup = cfg.internal_pullups;
        config
    }
}
