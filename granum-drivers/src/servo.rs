//! Hobby servo on a PWM channel
//!
//! The channel runs at 50 Hz. The pulse width maps linearly from
//! `min_pulse_us` at 0° to `max_pulse_us` at 180°.

use embedded_hal::pwm::SetDutyCycle;
use granum_core::traits::{Servo, ServoError};

/// PWM period at 50 Hz
pub const PERIOD_US: u16 = 20_000;

/// Pulse widths at the two ends of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoCalibration {
    pub min_pulse_us: u16,
    pub max_pulse_us: u16,
}

impl Default for ServoCalibration {
    fn default() -> Self {
        Self {
            min_pulse_us: 500,
            max_pulse_us: 2500,
        }
    }
}

impl ServoCalibration {
    /// Pulse width for `degrees`, clamped to 0..=180
    pub fn pulse_us(&self, degrees: f32) -> u16 {
        // NaN parks at 0°
        let degrees = if !(degrees > 0.0) {
            0.0
        } else if degrees > 180.0 {
            180.0
        } else {
            degrees
        };
        let span = self.max_pulse_us.saturating_sub(self.min_pulse_us) as f32;
        self.min_pulse_us + (degrees / 180.0 * span) as u16
    }
}

pub struct PwmServo<P> {
    pwm: P,
    cal: ServoCalibration,
}

impl<P: SetDutyCycle> PwmServo<P> {
    pub fn new(pwm: P, cal: ServoCalibration) -> Self {
        Self { pwm, cal }
    }
}

impl<P: SetDutyCycle> Servo for PwmServo<P> {
    fn set_angle(&mut self, degrees: f32) -> Result<(), ServoError> {
        let pulse = self.cal.pulse_us(degrees);
        self.pwm
            .set_duty_cycle_fraction(pulse, PERIOD_US)
            .map_err(|_| ServoError::Pwm)
    }
}
