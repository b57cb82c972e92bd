//! Servo PWM timing
//!
//! Both sample servos share TIM3 (CH1 on PA6, CH2 on PA7) at the standard
//! 50 Hz hobby-servo frame.

use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;

/// Servo frame rate
pub const SERVO_FRAME: Hertz = Hertz(50);

/// Pulse starts at the beginning of each frame
pub const SERVO_COUNTING: CountingMode = CountingMode::EdgeAlignedUp;
