//! Positional servo trait

/// Errors from driving a servo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoError {
    /// The PWM channel rejected the duty cycle
    Pwm,
}

/// Hobby servo positioned by angle
pub trait Servo {
    /// Move to `degrees`, clamped to 0..=180
    fn set_angle(&mut self, degrees: f32) -> Result<(), ServoError>;
}
