//! The trigger state machine.
//!
//! ```text
//! Idle --window full--> Evaluating --R < threshold--> Armed
//!   ^                        ^                          |
//!   |                        |                     next sample
//!  reset()                   +---cooldown expired--- Cooldown
//! ```

use std::time::{Duration, Instant};

/// Clock used to measure the cooldown after a reset command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CooldownClock {
    /// Sum of the `dt` of the samples accepted since the command. Replays of
    /// recorded data behave the same as live streams.
    #[default]
    SampleTime,
    /// Wall time since the command.
    WallClock,
}

/// Observable state of a [`crate::ResetMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// The window is not full yet.
    Idle,
    /// The window is full and every update may trigger a reset.
    Evaluating,
    /// A reset command was emitted by the last update.
    Armed,
    /// Re-triggering is suppressed until the cooldown expires.
    Cooldown,
}

/// Drives [`TriggerState`] transitions and keeps the cooldown bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct Trigger {
    state: TriggerState,
    cooldown: Duration,
    clock: CooldownClock,
    armed_at: Option<Instant>,
    sample_time: Duration,
}

impl Trigger {
    pub(crate) fn new(cooldown: Duration, clock: CooldownClock) -> Self {
        Self {
            state: TriggerState::Idle,
            cooldown,
            clock,
            armed_at: None,
            sample_time: Duration::ZERO,
        }
    }

    pub(crate) fn state(&self) -> TriggerState {
        self.state
    }

    /// Advances the state for a newly accepted sample covering `dt`.
    pub(crate) fn advance(&mut self, dt: Duration, window_full: bool) {
        match self.state {
            TriggerState::Idle => {
                if window_full {
                    self.state = TriggerState::Evaluating;
                }
            }
            TriggerState::Evaluating => {}
            TriggerState::Armed => {
                self.sample_time += dt;
                self.state = TriggerState::Cooldown;
                tracing::debug!(cooldown = ?self.cooldown, "entering cooldown");
                self.expire_cooldown();
            }
            TriggerState::Cooldown => {
                self.sample_time += dt;
                self.expire_cooldown();
            }
        }
    }

    /// Records an emitted command.
    pub(crate) fn arm(&mut self) {
        self.state = TriggerState::Armed;
        self.armed_at = Some(Instant::now());
        self.sample_time = Duration::ZERO;
    }

    pub(crate) fn reset(&mut self) {
        self.state = TriggerState::Idle;
        self.armed_at = None;
        self.sample_time = Duration::ZERO;
    }

    fn elapsed(&self) -> Duration {
        match self.clock {
            CooldownClock::SampleTime => self.sample_time,
            CooldownClock::WallClock => self
                .armed_at
                .map_or(Duration::MAX, |armed_at| armed_at.elapsed()),
        }
    }

    fn expire_cooldown(&mut self) {
        if self.elapsed() >= self.cooldown {
            tracing::debug!(elapsed = ?self.elapsed(), "cooldown expired");
            self.state = TriggerState::Evaluating;
            self.armed_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(100);

    #[test]
    fn idle_until_window_full() {
        let mut trigger = Trigger::new(Duration::from_secs(1), CooldownClock::SampleTime);
        trigger.advance(STEP, false);
        assert_eq!(trigger.state(), TriggerState::Idle);

        trigger.advance(STEP, true);
        assert_eq!(trigger.state(), TriggerState::Evaluating);
    }

    #[test]
    fn sample_time_cooldown() {
        let mut trigger = Trigger::new(Duration::from_millis(300), CooldownClock::SampleTime);
        trigger.advance(STEP, true);
        trigger.arm();
        assert_eq!(trigger.state(), TriggerState::Armed);

        trigger.advance(STEP, true);
        assert_eq!(trigger.state(), TriggerState::Cooldown);
        trigger.advance(STEP, true);
        assert_eq!(trigger.state(), TriggerState::Cooldown);
        trigger.advance(STEP, true);
        assert_eq!(trigger.state(), TriggerState::Evaluating);
    }

    #[test]
    fn zero_cooldown_expires_immediately() {
        let mut trigger = Trigger::new(Duration::ZERO, CooldownClock::SampleTime);
        trigger.advance(STEP, true);
        trigger.arm();

        trigger.advance(Duration::ZERO, true);
        assert_eq!(trigger.state(), TriggerState::Evaluating);
    }

    #[test]
    fn wall_clock_cooldown_ignores_sample_time() {
        let mut trigger = Trigger::new(Duration::from_secs(3600), CooldownClock::WallClock);
        trigger.advance(STEP, true);
        trigger.arm();

        for _ in 0..100 {
            trigger.advance(Duration::from_secs(60), true);
        }
        assert_eq!(trigger.state(), TriggerState::Cooldown);
    }

    #[test]
    fn wall_clock_cooldown_expires() {
        let mut trigger = Trigger::new(Duration::from_millis(1), CooldownClock::WallClock);
        trigger.advance(STEP, true);
        trigger.arm();

        std::thread::sleep(Duration::from_millis(5));
        trigger.advance(Duration::ZERO, true);
        assert_eq!(trigger.state(), TriggerState::Evaluating);
    }

    #[test]
    fn zero_wall_clock_cooldown_expires_on_next_sample() {
        let mut trigger = Trigger::new(Duration::ZERO, CooldownClock::WallClock);
        trigger.advance(STEP, true);
        trigger.arm();
        assert_eq!(trigger.state(), TriggerState::Armed);

        trigger.advance(Duration::ZERO, true);
        assert_eq!(trigger.state(), TriggerState::Evaluating);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut trigger = Trigger::new(Duration::from_secs(1), CooldownClock::SampleTime);
        trigger.advance(STEP, true);
        trigger.arm();

        trigger.reset();
        assert_eq!(trigger.state(), TriggerState::Idle);
    }
}
