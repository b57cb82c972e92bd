//! Millisecond interval timer

/// Fires once per interval when polled
#[derive(Debug, Clone, Copy)]
pub struct Periodic {
    interval_ms: u32,
    last_ms: u32,
}

impl Periodic {
    /// First expiry is one interval after tick 0
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_ms: 0,
        }
    }

    /// True when the interval has elapsed; re-arms from `now_ms`
    pub fn due(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_ms) >= self.interval_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Restart the interval at `now_ms`
    pub fn reset(&mut self, now_ms: u32) {
        self.last_ms = now_ms;
    }
}
