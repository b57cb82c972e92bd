//! ADS1232 24-bit load-cell ADC
//!
//! Bit-banged two-wire interface: DOUT/DRDY goes low when a conversion is
//! ready, then 24 SCLK pulses shift the result out MSB first. A 25th pulse
//! forces DOUT high until the next conversion.
//!
//! Samples pass through a three-sample median to reject single spikes.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use granum_core::traits::{SensorError, WeightSensor};

const DATA_BITS: u8 = 24;
const CLOCK_HALF_PERIOD_US: u32 = 1;
const MEDIAN_WINDOW: usize = 3;

/// Linear counts-to-grams conversion
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaleCalibration {
    /// Raw counts at zero load
    pub offset: i32,
    pub grams_per_count: f32,
}

impl Default for ScaleCalibration {
    fn default() -> Self {
        Self {
            offset: 0,
            grams_per_count: 1.0 / 6200.0,
        }
    }
}

impl ScaleCalibration {
    pub fn to_grams(&self, counts: i32) -> f32 {
        (counts - self.offset) as f32 * self.grams_per_count
    }
}

/// ADS1232 driver
pub struct Ads1232<DOUT, SCLK, D> {
    dout: DOUT,
    sclk: SCLK,
    delay: D,
    calibration: ScaleCalibration,
    window: [i32; MEDIAN_WINDOW],
    filled: usize,
    next: usize,
    tare_pending: bool,
}

impl<DOUT, SCLK, D> Ads1232<DOUT, SCLK, D>
where
    DOUT: InputPin,
    SCLK: OutputPin,
    D: DelayNs,
{
    pub fn new(dout: DOUT, sclk: SCLK, delay: D, calibration: ScaleCalibration) -> Self {
        Self {
            dout,
            sclk,
            delay,
            calibration,
            window: [0; MEDIAN_WINDOW],
            filled: 0,
            next: 0,
            tare_pending: false,
        }
    }

    pub fn calibration(&self) -> ScaleCalibration {
        self.calibration
    }

    pub fn set_calibration(&mut self, calibration: ScaleCalibration) {
        self.calibration = calibration;
    }

    /// Read one raw conversion if DRDY is asserted
    pub fn read_raw(&mut self) -> Result<Option<i32>, SensorError> {
        if self.dout.is_high().map_err(|_| SensorError::ConversionError)? {
            return Ok(None);
        }

        let mut value: u32 = 0;
        for _ in 0..DATA_BITS {
            self.clock_high()?;
            let bit = self.dout.is_high().map_err(|_| SensorError::ConversionError)?;
            value = (value << 1) | bit as u32;
            self.clock_low()?;
        }
        // 25th pulse parks DOUT high
        self.clock_high()?;
        self.clock_low()?;

        // Sign-extend 24 -> 32 bits
        Ok(Some(((value << 8) as i32) >> 8))
    }

    fn clock_high(&mut self) -> Result<(), SensorError> {
        self.sclk.set_high().map_err(|_| SensorError::ConversionError)?;
        self.delay.delay_us(CLOCK_HALF_PERIOD_US);
        Ok(())
    }

    fn clock_low(&mut self) -> Result<(), SensorError> {
        self.sclk.set_low().map_err(|_| SensorError::ConversionError)?;
        self.delay.delay_us(CLOCK_HALF_PERIOD_US);
        Ok(())
    }

    fn push(&mut self, counts: i32) -> i32 {
        self.window[self.next] = counts;
        self.next = (self.next + 1) % MEDIAN_WINDOW;
        self.filled = (self.filled + 1).min(MEDIAN_WINDOW);
        if self.filled < MEDIAN_WINDOW {
            return counts;
        }
        median3(self.window)
    }
}

fn median3([a, b, c]: [i32; 3]) -> i32 {
    a.max(b).min(a.min(b).max(c))
}

impl<DOUT, SCLK, D> WeightSensor for Ads1232<DOUT, SCLK, D>
where
    DOUT: InputPin,
    SCLK: OutputPin,
    D: DelayNs,
{
    fn poll_grams(&mut self) -> Result<Option<f32>, SensorError> {
        let Some(raw) = self.read_raw()? else {
            return Ok(None);
        };
        let counts = self.push(raw);

        if self.tare_pending {
            self.tare_pending = false;
            self.calibration.offset = counts;
        }
        Ok(Some(self.calibration.to_grams(counts)))
    }

    /// Zero on the next ready sample
    fn tare(&mut self) -> Result<(), SensorError> {
        self.tare_pending = true;
        Ok(())
    }
}
