//! Per-question countdown driven by explicit one-second ticks.
//!
//! The countdown never reads the wall clock. Whoever owns it calls [`Countdown::tick`]
//! once per elapsed second: a tokio interval in the app, a loop in tests.

/// Remaining seconds at or below which presentation shows the timer as urgent.
pub const URGENCY_THRESHOLD_SECS: u32 = 5;

/// Returns true when the remaining time should be rendered as urgent.
#[must_use]
pub fn is_urgent(seconds_remaining: u32) -> bool {
    seconds_remaining <= URGENCY_THRESHOLD_SECS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// One second elapsed; `remaining` is still above zero.
    Tick { remaining: u32 },
    /// Remaining time reached zero. Emitted once per start.
    Expired,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    running: bool,
    generation: u64,
}

impl Countdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `duration_secs`, replacing any running countdown.
    ///
    /// Returns the initial readout so callers can display it before the first tick.
    pub fn start(&mut self, duration_secs: u32) -> u32 {
        self.remaining = duration_secs;
        self.running = true;
        self.generation = self.generation.wrapping_add(1);
        self.remaining
    }

    /// Stop ticking. Safe to call when already stopped.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance by one second.
    ///
    /// Returns `None` when the countdown is not running, so ticks that arrive
    /// after `stop` or after expiry have no effect.
    pub fn tick(&mut self) -> Option<CountdownEvent> {
        if !self.running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            return Some(CountdownEvent::Expired);
        }
        Some(CountdownEvent::Tick {
            remaining: self.remaining,
        })
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Incremented on every `start`; lets real-time drivers realign their timer.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
