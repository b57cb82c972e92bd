//! MCU internal temperature sensor
//!
//! Single-point calibration against the factory value TS_CAL1, measured at
//! 30 °C with VDDA = 3.0 V. The conversion uses the typical slope of
//! 1.61 mV/°C and assigns 15 °C to the calibration point.

use granum_core::traits::{SensorError, TemperatureSensor};

/// Temperature assigned to the calibration point
pub const CAL_POINT_C: f32 = 15.0;
/// Sensor slope in V/°C
pub const AVG_SLOPE_V: f32 = 0.00161;
/// VDDA during factory calibration
pub const CAL_VDDA: f32 = 3.0;

const ADC_MAX: f32 = 4095.0;

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read ADC value (12-bit, 0-4095)
    #[allow(clippy::result_unit_err)]
    fn read(&mut self) -> Result<u16, ()>;
}

/// Factory calibration word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TempCalibration {
    pub ts_cal1: u16,
}

impl TempCalibration {
    /// Erased or zero words mean the part carries no calibration
    pub fn is_valid(&self) -> bool {
        self.ts_cal1 != 0 && self.ts_cal1 != 0xFFFF
    }
}

/// Convert a raw conversion to °C
pub fn raw_to_celsius(raw: u16, cal: TempCalibration) -> Result<f32, SensorError> {
    if !cal.is_valid() {
        return Err(SensorError::Uncalibrated);
    }
    if raw == 0 {
        return Err(SensorError::ConversionError);
    }

    let v_cal = CAL_VDDA * cal.ts_cal1 as f32 / ADC_MAX;
    let v_sense = CAL_VDDA * raw as f32 / ADC_MAX;
    Ok((v_sense - v_cal) / AVG_SLOPE_V + CAL_POINT_C)
}

/// Internal sensor behind an ADC channel
pub struct InternalTemperature<ADC> {
    adc: ADC,
    cal: TempCalibration,
}

impl<ADC: AdcReader> InternalTemperature<ADC> {
    pub fn new(adc: ADC, cal: TempCalibration) -> Self {
        Self { adc, cal }
    }

    /// Sample and convert in °C
    pub fn read(&mut self) -> Result<f32, SensorError> {
        let raw = self.adc.read().map_err(|_| SensorError::ConversionError)?;
        raw_to_celsius(raw, self.cal)
    }
}

impl<ADC: AdcReader> TemperatureSensor for InternalTemperature<ADC> {
    fn read_celsius_x10(&mut self) -> Result<i16, SensorError> {
        let x10 = self.read()? * 10.0;
        if !(i16::MIN as f32..=i16::MAX as f32).contains(&x10) {
            return Err(SensorError::OutOfRange);
        }
        let rounded = if x10 < 0.0 { x10 - 0.5 } else { x10 + 0.5 };
        Ok(rounded as i16)
    }
}

/// Dummy ADC for testing (returns a fixed value)
#[cfg(test)]
pub struct DummyAdc(pub Result<u16, ()>);

#[cfg(test)]
impl AdcReader for DummyAdc {
    fn read(&mut self) -> Result<u16, ()> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAL: TempCalibration = TempCalibration { ts_cal1: 1000 };

    #[test]
    fn test_calibration_point() {
        let t = raw_to_celsius(1000, CAL).unwrap();
        assert!((t - CAL_POINT_C).abs() < 1e-4);
    }

    #[test]
    fn test_slope() {
        // 22 counts ≈ 16.1 mV ≈ 10 °C
        let t = raw_to_celsius(1022, CAL).unwrap();
        assert!((t - 25.0).abs() < 0.1);
    }

    #[test]
    fn test_missing_calibration() {
        let cal = TempCalibration { ts_cal1: 0xFFFF };
        assert_eq!(raw_to_celsius(1000, cal), Err(SensorError::Uncalibrated));
    }

    #[test]
    fn test_zero_reading_is_error() {
        assert_eq!(raw_to_celsius(0, CAL), Err(SensorError::ConversionError));
    }

    #[test]
    fn test_trait_reading() {
        let mut sensor = InternalTemperature::new(DummyAdc(Ok(1000)), CAL);
        assert_eq!(sensor.read_celsius_x10(), Ok(150));
        assert_eq!(sensor.read_celsius(), Ok(15));

        let mut broken = InternalTemperature::new(DummyAdc(Err(())), CAL);
        assert_eq!(broken.read_celsius_x10(), Err(SensorError::ConversionError));
    }
}
