//! Periodic sampling and display refresh
//!
//! - frequency: every 1 s, read-and-reset the pulse count, derive scale A
//! - display: every 1 s on the monitor and adjust pages, publish frequency
//!   and scale A; every fifth cycle also sample and publish the instrument
//!   temperature
//! - clock: every 1 s on the main page, publish time and date text
//! - weight: whenever the load cell has a conversion ready

use core::fmt::Write as _;

use granum_protocol::FrameError;

use crate::traits::{
    DisplayError, DisplaySink, FrequencyCounter, SensorError, TemperatureSensor, WallClock,
    WeightSensor,
};
use crate::ui::{page, vp};

use super::periodic::Periodic;

pub const FREQUENCY_INTERVAL_MS: u32 = 1000;
pub const DISPLAY_INTERVAL_MS: u32 = 1000;
pub const CLOCK_INTERVAL_MS: u32 = 1000;

/// Display cycles between instrument temperature samples
pub const TEMP_EVERY_CYCLES: u8 = 5;

/// Reported instrument temperature when the sensor fails
pub const TEMP_FAULT_C: f32 = -273.0;

/// Weight change below which consecutive samples count as stable
const STABILITY_THRESHOLD_G: f32 = 0.05;
const STABLE_SAMPLES: u8 = 3;

/// Latest derived values, copied out by value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurements {
    /// Pulses counted during the last second
    pub frequency: f32,
    pub scale_a: f32,
    pub weight_g: f32,
    pub instrument_temp: f32,
}

/// Scale A from a one-second pulse count and the stored calibration
pub fn scale_a(pulses: u32, gain: f32, zero: f32) -> f32 {
    let raw = -0.00014955 * pulses as f32 + 396.85;
    raw * gain + zero
}

/// Owner of the periodic measurement tasks
#[derive(Debug, Clone)]
pub struct MeasurementScheduler {
    frequency_timer: Periodic,
    display_timer: Periodic,
    clock_timer: Periodic,
    temp_cycles: u8,
    stable_ref: f32,
    stable_count: u8,
    data: Measurements,
}

impl Default for MeasurementScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementScheduler {
    pub const fn new() -> Self {
        Self {
            frequency_timer: Periodic::new(FREQUENCY_INTERVAL_MS),
            display_timer: Periodic::new(DISPLAY_INTERVAL_MS),
            clock_timer: Periodic::new(CLOCK_INTERVAL_MS),
            temp_cycles: 0,
            stable_ref: 0.0,
            stable_count: 0,
            data: Measurements {
                frequency: 0.0,
                scale_a: 0.0,
                weight_g: 0.0,
                instrument_temp: 0.0,
            },
        }
    }

    /// Copy of the latest values
    pub fn measurements(&self) -> Measurements {
        self.data
    }

    /// Sample the frequency counter once per second
    ///
    /// Returns true when a new value was taken.
    pub fn update_frequency<F: FrequencyCounter>(
        &mut self,
        now_ms: u32,
        counter: &mut F,
        calibration: (f32, f32),
    ) -> bool {
        if !self.frequency_timer.due(now_ms) {
            return false;
        }

        let pulses = counter.take_pulse_count();
        let (gain, zero) = calibration;
        self.data.frequency = pulses as f32;
        self.data.scale_a = scale_a(pulses, gain, zero);
        true
    }

    /// Consume a ready load-cell sample
    ///
    /// Returns true when a new weight was stored.
    pub fn update_weight<W: WeightSensor>(&mut self, scale: &mut W) -> Result<bool, SensorError> {
        let Some(grams) = scale.poll_grams()? else {
            return Ok(false);
        };

        self.data.weight_g = grams;
        let delta = grams - self.stable_ref;
        if delta > -STABILITY_THRESHOLD_G && delta < STABILITY_THRESHOLD_G {
            self.stable_count = (self.stable_count + 1).min(STABLE_SAMPLES);
        } else {
            self.stable_count = 0;
            self.stable_ref = grams;
        }
        Ok(true)
    }

    /// True after several consecutive samples within the stability band
    pub fn is_weight_stable(&self) -> bool {
        self.stable_count >= STABLE_SAMPLES
    }

    /// Refresh monitor values on the display
    ///
    /// The cycle is skipped, not deferred, while the display is still
    /// transmitting.
    pub fn update_display<D: DisplaySink, T: TemperatureSensor>(
        &mut self,
        now_ms: u32,
        current_page: u16,
        display: &mut D,
        thermometer: &mut T,
    ) -> Result<(), DisplayError> {
        if !self.display_timer.due(now_ms) || display.is_busy() {
            return Ok(());
        }

        if current_page != page::MONITOR && current_page != page::ADJUST_CAPACITANCE {
            self.temp_cycles = 0;
            return Ok(());
        }

        let frequency = (self.data.frequency / 1000.0 * 10.0) as i32;
        display.write_i32(vp::FREQUENCY, frequency)?;
        display.write_i32(vp::SCALE_A, (self.data.scale_a * 10.0) as i32)?;

        self.temp_cycles += 1;
        if self.temp_cycles >= TEMP_EVERY_CYCLES {
            self.temp_cycles = 0;
            let celsius = match thermometer.read_celsius_x10() {
                Ok(x10) => x10 as f32 / 10.0,
                Err(_) => TEMP_FAULT_C,
            };
            self.data.instrument_temp = celsius;
            display.write_i16(vp::INSTRUMENT_TEMP, (celsius * 10.0) as i16)?;
        }
        Ok(())
    }

    /// Refresh the clock text on the main page
    pub fn update_clock<D: DisplaySink, K: WallClock>(
        &mut self,
        now_ms: u32,
        current_page: u16,
        display: &mut D,
        clock: &K,
    ) -> Result<(), DisplayError> {
        if !self.clock_timer.due(now_ms) || current_page != page::MAIN {
            return Ok(());
        }

        let now = clock.now();
        let mut text: heapless::String<8> = heapless::String::new();
        write!(text, "{}", now.time).map_err(|_| FrameError::PayloadTooLarge)?;
        display.write_text(vp::CLOCK_TIME, &text, vp::CLOCK_WIDTH)?;

        text.clear();
        write!(text, "{}", now.date).map_err(|_| FrameError::PayloadTooLarge)?;
        display.write_text(vp::CLOCK_DATE, &text, vp::CLOCK_WIDTH)
    }

    /// Record a fresh instrument temperature outside the display cycle
    pub fn set_instrument_temp(&mut self, celsius: f32) {
        self.data.instrument_temp = celsius;
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use crate::traits::{
        ClockError, Date, DateTime, DisplayError, DisplaySink, SensorError, TemperatureSensor, Time,
        WallClock,
    };
    use std::string::String;
    use std::vec::Vec;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Write {
        Text(u16, String, u8),
        I16(u16, i16),
        I32(u16, i32),
        Page(u16),
        Bytes(Vec<u8>),
    }

    /// Display that records writes
    #[derive(Default)]
    pub struct MockDisplay {
        pub busy: bool,
        pub writes: Vec<Write>,
    }

    impl DisplaySink for MockDisplay {
        fn is_busy(&self) -> bool {
            self.busy
        }

        fn write_text(&mut self, vp: u16, text: &str, width: u8) -> Result<(), DisplayError> {
            self.writes.push(Write::Text(vp, text.into(), width));
            Ok(())
        }

        fn write_i16(&mut self, vp: u16, value: i16) -> Result<(), DisplayError> {
            self.writes.push(Write::I16(vp, value));
            Ok(())
        }

        fn write_i32(&mut self, vp: u16, value: i32) -> Result<(), DisplayError> {
            self.writes.push(Write::I32(vp, value));
            Ok(())
        }

        fn set_page(&mut self, page: u16) -> Result<(), DisplayError> {
            self.writes.push(Write::Page(page));
            Ok(())
        }

        fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
            self.writes.push(Write::Bytes(bytes.to_vec()));
            Ok(())
        }
    }

    pub struct FixedTemp(pub Result<i16, SensorError>);

    impl TemperatureSensor for FixedTemp {
        fn read_celsius_x10(&mut self) -> Result<i16, SensorError> {
            self.0
        }
    }

    pub struct FixedClock(pub DateTime);

    impl WallClock for FixedClock {
        fn now(&self) -> DateTime {
            self.0
        }

        fn set_time(&mut self, time: Time) -> Result<(), ClockError> {
            self.0.time = time;
            Ok(())
        }

        fn set_date(&mut self, date: Date) -> Result<(), ClockError> {
            self.0.date = date;
            Ok(())
        }
    }
}
