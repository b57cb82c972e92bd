//! Sample handling servo sequence
//!
//! Two servos move the grain sample: the gate drops it from the hopper
//! into the measuring cell, the scraper levels it and then sweeps it out.
//! The sequence runs from the superloop without blocking; each step sets
//! both servos and holds for a fixed time.

use crate::traits::{Servo, ServoError};

pub const GATE_CLOSED_DEG: f32 = 0.0;
pub const GATE_OPEN_DEG: f32 = 90.0;
pub const SCRAPER_HOME_DEG: f32 = 0.0;
pub const SCRAPER_LEVEL_DEG: f32 = 60.0;
pub const SCRAPER_SWEEP_DEG: f32 = 180.0;

/// Sequence steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleStep {
    Idle,
    /// Gate open, grain falls into the cell
    Dispensing,
    /// Gate closed, grain settles
    Settling,
    /// Scraper strikes off the excess
    Leveling,
    /// Scraper sweeps the cell empty
    Emptying,
    /// Scraper back home
    Returning,
}

impl SampleStep {
    /// Gate and scraper angles held during the step
    pub fn angles(self) -> (f32, f32) {
        match self {
            SampleStep::Dispensing => (GATE_OPEN_DEG, SCRAPER_HOME_DEG),
            SampleStep::Leveling => (GATE_CLOSED_DEG, SCRAPER_LEVEL_DEG),
            SampleStep::Emptying => (GATE_CLOSED_DEG, SCRAPER_SWEEP_DEG),
            SampleStep::Idle | SampleStep::Settling | SampleStep::Returning => {
                (GATE_CLOSED_DEG, SCRAPER_HOME_DEG)
            }
        }
    }

    pub fn hold_ms(self) -> u32 {
        match self {
            SampleStep::Idle => 0,
            SampleStep::Dispensing => 1500,
            SampleStep::Settling => 500,
            SampleStep::Leveling => 800,
            SampleStep::Emptying => 1000,
            SampleStep::Returning => 1000,
        }
    }

    fn next(self) -> Self {
        match self {
            SampleStep::Idle => SampleStep::Dispensing,
            SampleStep::Dispensing => SampleStep::Settling,
            SampleStep::Settling => SampleStep::Leveling,
            SampleStep::Leveling => SampleStep::Emptying,
            SampleStep::Emptying => SampleStep::Returning,
            SampleStep::Returning => SampleStep::Idle,
        }
    }
}

/// Reported by [`SampleSequence::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleEvent {
    None,
    /// Servos were moved for a new step
    Step(SampleStep),
    /// Last step elapsed; servos are parked
    Finished,
}

/// Non-blocking gate and scraper sequence
#[derive(Debug, Clone)]
pub struct SampleSequence {
    step: SampleStep,
    step_ms: u32,
    start_requested: bool,
}

impl Default for SampleSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSequence {
    pub const fn new() -> Self {
        Self {
            step: SampleStep::Idle,
            step_ms: 0,
            start_requested: false,
        }
    }

    pub fn step(&self) -> SampleStep {
        self.step
    }

    pub fn is_running(&self) -> bool {
        self.step != SampleStep::Idle || self.start_requested
    }

    /// Ask for a run on the next poll
    ///
    /// Returns false, and changes nothing, while a run is in progress.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.start_requested = true;
        true
    }

    /// Move both servos to their rest positions
    pub fn park<G: Servo, S: Servo>(gate: &mut G, scraper: &mut S) -> Result<(), ServoError> {
        gate.set_angle(GATE_CLOSED_DEG)?;
        scraper.set_angle(SCRAPER_HOME_DEG)
    }

    /// Advance the sequence
    ///
    /// A servo error abandons the run and leaves the sequence idle.
    pub fn poll<G: Servo, S: Servo>(
        &mut self,
        now_ms: u32,
        gate: &mut G,
        scraper: &mut S,
    ) -> Result<SampleEvent, ServoError> {
        if self.start_requested {
            self.start_requested = false;
            return self.enter(SampleStep::Dispensing, now_ms, gate, scraper);
        }
        if self.step == SampleStep::Idle
            || now_ms.wrapping_sub(self.step_ms) < self.step.hold_ms()
        {
            return Ok(SampleEvent::None);
        }
        match self.step.next() {
            SampleStep::Idle => {
                self.step = SampleStep::Idle;
                Ok(SampleEvent::Finished)
            }
            next => self.enter(next, now_ms, gate, scraper),
        }
    }

    fn enter<G: Servo, S: Servo>(
        &mut self,
        step: SampleStep,
        now_ms: u32,
        gate: &mut G,
        scraper: &mut S,
    ) -> Result<SampleEvent, ServoError> {
        let (gate_deg, scraper_deg) = step.angles();
        let moved = gate
            .set_angle(gate_deg)
            .and_then(|()| scraper.set_angle(scraper_deg));
        if let Err(e) = moved {
            self.step = SampleStep::Idle;
            return Err(e);
        }
        self.step = step;
        self.step_ms = now_ms;
        Ok(SampleEvent::Step(step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[derive(Debug, Default)]
    struct Recorder {
        angles: Vec<f32>,
        fail: bool,
    }

    impl Servo for Recorder {
        fn set_angle(&mut self, degrees: f32) -> Result<(), ServoError> {
            if self.fail {
                return Err(ServoError::Pwm);
            }
            self.angles.push(degrees);
            Ok(())
        }
    }

    fn run_from(start_ms: u32) -> (Vec<(u32, SampleEvent)>, Recorder, Recorder) {
        let mut seq = SampleSequence::new();
        let mut gate = Recorder::default();
        let mut scraper = Recorder::default();
        assert!(seq.start());

        let mut events = Vec::new();
        for offset in 0..6000u32 {
            let now = start_ms.wrapping_add(offset);
            let event = seq.poll(now, &mut gate, &mut scraper).unwrap();
            if event != SampleEvent::None {
                events.push((offset, event));
            }
        }
        (events, gate, scraper)
    }

    #[test]
    fn test_idle_does_nothing() {
        let mut seq = SampleSequence::new();
        let mut gate = Recorder::default();
        let mut scraper = Recorder::default();
        assert_eq!(
            seq.poll(100, &mut gate, &mut scraper),
            Ok(SampleEvent::None)
        );
        assert!(gate.angles.is_empty());
        assert!(!seq.is_running());
    }

    #[test]
    fn test_steps_follow_hold_times() {
        let (events, gate, scraper) = run_from(0);
        assert_eq!(
            events,
            [
                (0, SampleEvent::Step(SampleStep::Dispensing)),
                (1500, SampleEvent::Step(SampleStep::Settling)),
                (2000, SampleEvent::Step(SampleStep::Leveling)),
                (2800, SampleEvent::Step(SampleStep::Emptying)),
                (3800, SampleEvent::Step(SampleStep::Returning)),
                (4800, SampleEvent::Finished),
            ]
        );
        assert_eq!(gate.angles, [90.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(scraper.angles, [0.0, 0.0, 60.0, 180.0, 0.0]);
    }

    #[test]
    fn test_tick_wraparound() {
        let (wrapped, _, _) = run_from(u32::MAX - 1700);
        let (plain, _, _) = run_from(0);
        assert_eq!(wrapped, plain);
    }

    #[test]
    fn test_start_ignored_while_running() {
        let mut seq = SampleSequence::new();
        let mut gate = Recorder::default();
        let mut scraper = Recorder::default();
        assert!(seq.start());
        assert!(!seq.start());
        seq.poll(0, &mut gate, &mut scraper).unwrap();
        assert!(!seq.start());
        assert_eq!(seq.step(), SampleStep::Dispensing);

        for now in 1..=4800 {
            seq.poll(now, &mut gate, &mut scraper).unwrap();
        }
        assert!(!seq.is_running());
        assert!(seq.start());
    }

    #[test]
    fn test_servo_error_abandons_run() {
        let mut seq = SampleSequence::new();
        let mut gate = Recorder::default();
        let mut scraper = Recorder::default();
        seq.start();
        seq.poll(0, &mut gate, &mut scraper).unwrap();

        scraper.fail = true;
        assert_eq!(
            seq.poll(1500, &mut gate, &mut scraper),
            Err(ServoError::Pwm)
        );
        assert_eq!(seq.step(), SampleStep::Idle);
        assert_eq!(
            seq.poll(3000, &mut gate, &mut scraper),
            Ok(SampleEvent::None)
        );
    }

    #[test]
    fn test_park() {
        let mut gate = Recorder::default();
        let mut scraper = Recorder::default();
        SampleSequence::park(&mut gate, &mut scraper).unwrap();
        assert_eq!(gate.angles, [GATE_CLOSED_DEG]);
        assert_eq!(scraper.angles, [SCRAPER_HOME_DEG]);
    }
}
