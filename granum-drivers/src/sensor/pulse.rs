//! Capacitance oscillator pulse counter
//!
//! The oscillator clocks a free-running hardware timer. A task reads the
//! timer at a fixed rate and feeds the difference through a
//! [`CounterLatch`] into the shared [`PulseCounter`]; the measurement task
//! takes the count once per second.

use granum_core::traits::FrequencyCounter;
use portable_atomic::{AtomicU32, Ordering};

/// Edge total shared between the latch task and superloop
#[derive(Debug, Default)]
pub struct PulseCounter {
    count: AtomicU32,
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Count edges latched from the hardware timer
    pub fn add(&self, edges: u32) {
        self.count.fetch_add(edges, Ordering::Relaxed);
    }

    /// Return the count and restart from zero
    pub fn take(&self) -> u32 {
        self.count.swap(0, Ordering::Relaxed)
    }
}

impl FrequencyCounter for &PulseCounter {
    fn take_pulse_count(&mut self) -> u32 {
        self.take()
    }
}

/// Turns raw readings of a free-running 32-bit counter into edge deltas
///
/// The counter may wrap any number of times as long as fewer than 2^32
/// edges arrive between two readings.
#[derive(Debug, Clone, Copy)]
pub struct CounterLatch {
    last: u32,
}

impl CounterLatch {
    /// Start from the counter's current value
    pub const fn new(raw: u32) -> Self {
        Self { last: raw }
    }

    /// Add the edges since the previous reading to `counter`
    pub fn latch(&mut self, raw: u32, counter: &PulseCounter) -> u32 {
        let edges = raw.wrapping_sub(self.last);
        self.last = raw;
        counter.add(edges);
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_take_resets() {
        let counter = PulseCounter::new();
        counter.add(5);
        counter.add(10);

        let mut handle = &counter;
        assert_eq!(handle.take_pulse_count(), 15);
        assert_eq!(handle.take_pulse_count(), 0);
    }

    #[test]
    fn test_shared_static() {
        static COUNTER: PulseCounter = PulseCounter::new();
        COUNTER.add(3);
        assert_eq!(COUNTER.take(), 3);
    }

    #[test]
    fn test_latch_accumulates_deltas() {
        let counter = PulseCounter::new();
        let mut latch = CounterLatch::new(1_000);
        assert_eq!(latch.latch(27_500, &counter), 26_500);
        assert_eq!(latch.latch(27_500, &counter), 0);
        assert_eq!(latch.latch(54_000, &counter), 26_500);
        assert_eq!(counter.take(), 53_000);
    }

    #[test]
    fn test_latch_across_counter_wrap() {
        let counter = PulseCounter::new();
        let mut latch = CounterLatch::new(u32::MAX - 99);
        assert_eq!(latch.latch(150, &counter), 250);
        assert_eq!(counter.take(), 250);
    }

    proptest! {
        #[test]
        fn prop_latched_total_matches_edges(
            start in any::<u32>(),
            steps in proptest::collection::vec(0u32..3_000_000, 1..20),
        ) {
            let counter = PulseCounter::new();
            let mut latch = CounterLatch::new(start);
            let mut raw = start;
            let mut total = 0u32;
            for step in steps {
                raw = raw.wrapping_add(step);
                latch.latch(raw, &counter);
                total = total.wrapping_add(step);
            }
            prop_assert_eq!(counter.take(), total);
        }
    }
}
