//! Sleep and wake-confirmation state machine

/// Time allowed to confirm a wake before going back to sleep
pub const WAKE_CONFIRM_MS: u32 = 5000;

const COUNTDOWN_STEP_MS: u32 = 1000;

/// Power states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Normal operation
    Active,
    /// Halted until the touch line fires
    Stopped,
    /// Woken, waiting for the user to confirm on the display
    ConfirmWakeup,
}

/// Events that drive power transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerEvent {
    /// User or host asked to sleep
    Sleep,
    /// Touch interrupt fired while stopped
    Wakeup,
    /// Wake confirmed on the display
    Confirm,
    /// Confirmation window elapsed
    Timeout,
}

/// What the firmware must do after a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerAction {
    None,
    /// Drain both transmit pumps, power the display down and halt
    EnterStop,
    /// Show the seconds left to confirm
    Countdown(u8),
    /// Run self-diagnostics and return to the main page
    Resume,
}

impl PowerState {
    /// Process an event and return the next state
    pub fn transition(self, event: PowerEvent) -> Self {
        use PowerEvent::*;
        use PowerState::*;

        match (self, event) {
            (Active, Sleep) => Stopped,
            (Stopped, Wakeup) => ConfirmWakeup,
            (ConfirmWakeup, Confirm) => Active,
            (ConfirmWakeup, Timeout) => Stopped,
            (state, _) => state,
        }
    }
}

/// Tracks sleep requests and the wake confirmation window
#[derive(Debug, Clone)]
pub struct PowerManager {
    state: PowerState,
    sleep_requested: bool,
    wake_ms: u32,
    countdown_ms: u32,
}

impl Default for PowerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerManager {
    pub const fn new() -> Self {
        Self {
            state: PowerState::Active,
            sleep_requested: false,
            wake_ms: 0,
            countdown_ms: 0,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Ask to sleep on the next poll; ignored unless active
    pub fn request_sleep(&mut self) {
        if self.state == PowerState::Active {
            self.sleep_requested = true;
        }
    }

    /// Touch line fired; opens the confirmation window
    ///
    /// Returns false if the instrument was not stopped.
    pub fn on_wakeup(&mut self, now_ms: u32) -> bool {
        if self.state != PowerState::Stopped {
            return false;
        }
        self.state = self.state.transition(PowerEvent::Wakeup);
        self.wake_ms = now_ms;
        // First countdown value goes out on the next poll
        self.countdown_ms = now_ms.wrapping_sub(COUNTDOWN_STEP_MS);
        true
    }

    /// Wake confirmed on the display
    pub fn confirm(&mut self) -> PowerAction {
        if self.state != PowerState::ConfirmWakeup {
            return PowerAction::None;
        }
        self.state = self.state.transition(PowerEvent::Confirm);
        PowerAction::Resume
    }

    /// Advance timers and report the next action
    pub fn poll(&mut self, now_ms: u32) -> PowerAction {
        match self.state {
            PowerState::Active if self.sleep_requested => {
                self.sleep_requested = false;
                self.state = self.state.transition(PowerEvent::Sleep);
                PowerAction::EnterStop
            }
            PowerState::ConfirmWakeup => {
                let elapsed = now_ms.wrapping_sub(self.wake_ms);
                if elapsed >= WAKE_CONFIRM_MS {
                    self.state = self.state.transition(PowerEvent::Timeout);
                    return PowerAction::EnterStop;
                }
                if now_ms.wrapping_sub(self.countdown_ms) >= COUNTDOWN_STEP_MS {
                    self.countdown_ms = now_ms;
                    let remaining = (WAKE_CONFIRM_MS - elapsed) / COUNTDOWN_STEP_MS;
                    return PowerAction::Countdown(remaining.max(1) as u8);
                }
                PowerAction::None
            }
            _ => PowerAction::None,
        }
    }
}
