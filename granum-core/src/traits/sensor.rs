//! Measurement sensor traits

/// Errors that can occur while sampling a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Sensor not responding (no data-ready edge, no conversion)
    NotReady,
    /// Reading out of expected range
    OutOfRange,
    /// ADC conversion error
    ConversionError,
    /// Factory calibration data missing or implausible
    Uncalibrated,
}

/// Trait for temperature sensors
///
/// Implemented by the MCU's internal sensor.
pub trait TemperatureSensor {
    /// Read the current temperature in degrees Celsius
    ///
    /// Returns a fixed-point value with 0.1°C resolution.
    /// For example, 23.5°C is returned as 235.
    ///
    /// Takes `&mut self` because ADC reads typically require mutable access.
    fn read_celsius_x10(&mut self) -> Result<i16, SensorError>;

    /// Read the current temperature in whole degrees Celsius
    fn read_celsius(&mut self) -> Result<i16, SensorError> {
        self.read_celsius_x10().map(|t| t / 10)
    }
}

/// Load cell front-end
pub trait WeightSensor {
    /// Return a calibrated sample in grams if a conversion is ready
    ///
    /// Never blocks waiting for the ADC; `Ok(None)` means "not yet".
    fn poll_grams(&mut self) -> Result<Option<f32>, SensorError>;

    /// Take the current load as the zero point
    fn tare(&mut self) -> Result<(), SensorError>;
}

/// Edge counter attached to the capacitance oscillator
pub trait FrequencyCounter {
    /// Return the pulses counted since the previous call and restart counting
    fn take_pulse_count(&mut self) -> u32;
}
