//! Resetability estimation for sequences of small rotations.
//!
//! A sequence of rotation increments is *resettable* when replaying it with
//! every angle scaled by a common factor $\lambda$, twice in a row, brings the
//! body back to where it started. [`ResetMonitor`] keeps a sliding window over
//! incoming increments, evaluates that metric on every update and emits a
//! [`ResetCommand`] when the window becomes resettable enough.
//!
//! # Example
//!
//! ```
//! use nalgebra::Vector3;
//! use so3_reset::{ResetMonitor, ResetParameters, RotationSample, TriggerState};
//!
//! let mut monitor = ResetMonitor::new(ResetParameters {
//!     window_capacity: 2,
//!     reset_threshold: 0.1,
//!     ..Default::default()
//! })?;
//!
//! monitor.update(RotationSample::new(Vector3::x(), 0.3, 0.01))?;
//! let update = monitor.update(RotationSample::new(Vector3::y(), 0.3, 0.01))?;
//!
//! assert!(update.report.resetability < 0.1);
//! assert!(update.command.is_some());
//! assert_eq!(monitor.state(), TriggerState::Armed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod command;
pub mod compose;
#[cfg(feature = "config")]
pub mod config;
pub mod error;
pub mod estimator;
pub mod monte_carlo;
mod sample;
pub mod telemetry;
mod trigger;
pub mod window;
pub mod worker;

use std::{num::NonZeroUsize, time::Duration};

use nalgebra::UnitQuaternion;

pub use command::ResetCommand;
pub use error::{ConfigError, SampleError};
pub use estimator::{ResetBenefit, ResetReport};
pub use sample::RotationSample;
pub use trigger::{CooldownClock, TriggerState};
use trigger::Trigger;
use window::SlidingWindow;

/// Parameters for the [`ResetMonitor`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResetParameters {
    /// Number of samples $W$ in the sliding window.
    ///
    /// Nothing is triggered before the window is full.
    pub window_capacity: usize,
    /// A reset command is emitted when $R$ drops below this value. Must lie
    /// in $[0, 1]$.
    pub reset_threshold: f64,
    /// Number of micro-steps $K$ each scaled increment is split into.
    pub micro_steps: usize,
    /// Time during which no new command is emitted after one was.
    pub cooldown: Duration,
    /// How [`Self::cooldown`] is measured.
    pub cooldown_clock: CooldownClock,
    /// Minimum net rotation, in radians, for a window to trigger.
    ///
    /// Off (`0.0`) by default. A window without any net rotation has $R = 0$,
    /// so a small positive value keeps a still body from triggering commands
    /// that do nothing.
    pub min_net_rotation: f64,
}

impl Default for ResetParameters {
    fn default() -> Self {
        Self {
            window_capacity: 50,
            reset_threshold: 0.05,
            micro_steps: 10,
            cooldown: Duration::from_secs(1),
            cooldown_clock: CooldownClock::SampleTime,
            min_net_rotation: 0.0,
        }
    }
}

impl ResetParameters {
    /// Checks that the parameters describe a usable monitor.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the window capacity or micro-step count is
    /// zero, the threshold is outside $[0, 1]$, or the minimum net rotation
    /// is negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_capacity == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if !(0.0..=1.0).contains(&self.reset_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.reset_threshold));
        }
        if self.micro_steps == 0 {
            return Err(ConfigError::ZeroMicroSteps);
        }
        if !self.min_net_rotation.is_finite() || self.min_net_rotation < 0.0 {
            return Err(ConfigError::InvalidMinNetRotation(self.min_net_rotation));
        }
        Ok(())
    }
}

/// Outcome of one [`ResetMonitor::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResetUpdate {
    /// Report over the window after the new sample was added.
    pub report: ResetReport,
    /// The reset command, if this update triggered one.
    pub command: Option<ResetCommand>,
    /// Trigger state after the update.
    pub state: TriggerState,
}

/// Sliding-window resetability monitor.
///
/// Owns the window exclusively; samples are pushed through
/// [`Self::update`] from a single ingestion path.
#[derive(Debug, Clone)]
pub struct ResetMonitor {
    parameters: ResetParameters,
    micro_steps: NonZeroUsize,
    window: SlidingWindow,
    trigger: Trigger,
    dropped_samples: u64,
    commands_emitted: u64,
}

impl ResetMonitor {
    /// Create a new monitor with the given parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the parameters do not pass
    /// [`ResetParameters::validate`].
    pub fn new(parameters: ResetParameters) -> Result<Self, ConfigError> {
        parameters.validate()?;
        let micro_steps =
            NonZeroUsize::new(parameters.micro_steps).ok_or(ConfigError::ZeroMicroSteps)?;

        Ok(Self {
            micro_steps,
            window: SlidingWindow::new(parameters.window_capacity),
            trigger: Trigger::new(parameters.cooldown, parameters.cooldown_clock),
            parameters,
            dropped_samples: 0,
            commands_emitted: 0,
        })
    }

    /// Feeds one sample into the window and re-evaluates it.
    ///
    /// Accepted samples are stored in [`RotationSample::canonical`] form.
    ///
    /// # Errors
    ///
    /// A malformed sample (see [`RotationSample::validate`]) is dropped and
    /// its [`SampleError`] returned. The monitor is left untouched apart from
    /// [`Self::dropped_samples`], so callers can log the error and carry on.
    pub fn update(&mut self, sample: RotationSample) -> Result<ResetUpdate, SampleError> {
        if let Err(error) = sample.validate() {
            self.dropped_samples += 1;
            tracing::warn!(%error, dropped = self.dropped_samples, "dropping malformed sample");
            return Err(error);
        }

        let sample = sample.canonical();
        self.window.push(sample);
        let dt = Duration::try_from_secs_f64(sample.dt).unwrap_or(Duration::MAX);
        self.trigger.advance(dt, self.window.is_full());

        let report = estimator::estimate(&self.window);
        tracing::trace!(
            lambda = report.lambda,
            resetability = report.resetability,
            theta_net = report.theta_net,
            samples = report.sample_count,
            "evaluated window"
        );

        let command = if self.should_trigger(&report) {
            Some(self.emit(&report))
        } else {
            None
        };

        Ok(ResetUpdate {
            report,
            command,
            state: self.trigger.state(),
        })
    }

    fn should_trigger(&self, report: &ResetReport) -> bool {
        self.trigger.state() == TriggerState::Evaluating
            && report.resetability < self.parameters.reset_threshold
            && report.theta_net >= self.parameters.min_net_rotation
    }

    fn emit(&mut self, report: &ResetReport) -> ResetCommand {
        let command = ResetCommand::build(&self.window, report.lambda, self.micro_steps);
        self.trigger.arm();
        self.commands_emitted += 1;

        tracing::info!(
            lambda = report.lambda,
            resetability = report.resetability,
            theta_net = report.theta_net,
            window = ?self.window.total_duration(),
            steps = command.steps.len(),
            "reset command emitted"
        );
        command
    }

    /// Evaluates the current window without changing any state.
    #[must_use]
    pub fn report(&self) -> ResetReport {
        estimator::estimate(&self.window)
    }

    /// Predicts the effect of a reset of the current window, starting from
    /// the `current` orientation.
    #[must_use]
    pub fn predict_benefit(&self, current: &UnitQuaternion<f64>) -> ResetBenefit {
        estimator::predict_reset_benefit(&self.window, current)
    }

    /// Clears the window and returns to [`TriggerState::Idle`].
    pub fn reset(&mut self) {
        self.window.clear();
        self.trigger.reset();
        tracing::debug!("monitor reset");
    }

    /// Current trigger state.
    #[must_use]
    pub fn state(&self) -> TriggerState {
        self.trigger.state()
    }

    /// The sliding window.
    #[must_use]
    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }

    /// The parameters this monitor was created with.
    #[must_use]
    pub fn parameters(&self) -> &ResetParameters {
        &self.parameters
    }

    /// Number of malformed samples dropped so far.
    #[must_use]
    pub fn dropped_samples(&self) -> u64 {
        self.dropped_samples
    }

    /// Number of reset commands emitted so far.
    #[must_use]
    pub fn commands_emitted(&self) -> u64 {
        self.commands_emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn sample(axis: Vector3<f64>, angle: f64) -> RotationSample {
        RotationSample::new(axis, angle, 0.1)
    }

    fn monitor(window_capacity: usize, cooldown: Duration) -> ResetMonitor {
        ResetMonitor::new(ResetParameters {
            window_capacity,
            reset_threshold: 0.1,
            micro_steps: 4,
            cooldown,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn rejects_invalid_parameters() {
        let invalid = [
            ResetParameters {
                window_capacity: 0,
                ..Default::default()
            },
            ResetParameters {
                reset_threshold: 1.5,
                ..Default::default()
            },
            ResetParameters {
                reset_threshold: f64::NAN,
                ..Default::default()
            },
            ResetParameters {
                micro_steps: 0,
                ..Default::default()
            },
            ResetParameters {
                min_net_rotation: -0.1,
                ..Default::default()
            },
        ];

        for parameters in invalid {
            assert!(ResetMonitor::new(parameters).is_err());
        }
        assert!(ResetParameters::default().validate().is_ok());
    }

    #[test]
    fn idle_until_window_is_full() {
        let mut monitor = monitor(3, Duration::from_secs(1));

        let update = monitor.update(sample(Vector3::x(), 0.3)).unwrap();
        assert_eq!(update.state, TriggerState::Idle);
        assert_eq!(update.report.sample_count, 1);

        // R = 0 for a single increment, but the window is not full yet
        assert!(update.command.is_none());
        monitor.update(sample(Vector3::y(), 0.3)).unwrap();
        assert_eq!(monitor.state(), TriggerState::Idle);
    }

    #[test]
    fn low_resetability_triggers_command() {
        let mut monitor = monitor(2, Duration::from_secs(1));

        monitor.update(sample(Vector3::x(), 0.3)).unwrap();
        let update = monitor.update(sample(Vector3::y(), 0.3)).unwrap();

        assert_relative_eq!(update.report.resetability, 0.0764, epsilon = 1e-3);
        assert_eq!(update.state, TriggerState::Armed);

        let command = update.command.unwrap();
        assert_eq!(command.steps.len(), 8);
        assert_relative_eq!(command.lambda, update.report.lambda);
        assert_eq!(monitor.commands_emitted(), 1);

        let update = monitor.update(sample(Vector3::x(), 0.3)).unwrap();
        assert_eq!(update.state, TriggerState::Cooldown);
        assert!(update.command.is_none());
    }

    #[test]
    fn high_resetability_does_not_trigger() {
        let mut monitor = monitor(3, Duration::from_secs(1));

        monitor.update(sample(Vector3::x(), 1.05)).unwrap();
        monitor.update(sample(Vector3::y(), 1.05)).unwrap();
        let update = monitor.update(sample(Vector3::z(), 1.05)).unwrap();

        assert_relative_eq!(update.report.resetability, 0.5257, epsilon = 1e-3);
        assert_eq!(update.state, TriggerState::Evaluating);
        assert!(update.command.is_none());
    }

    #[test]
    fn default_parameters_trigger_on_threshold_alone() {
        let mut monitor = ResetMonitor::new(ResetParameters {
            window_capacity: 2,
            reset_threshold: 0.1,
            ..Default::default()
        })
        .unwrap();

        monitor.update(sample(Vector3::x(), 0.003)).unwrap();
        let update = monitor.update(sample(Vector3::y(), 0.003)).unwrap();

        assert!(update.report.resetability < 0.1);
        assert!(update.report.theta_net < 1_f64.to_radians());
        assert!(update.command.is_some());
        assert_eq!(update.state, TriggerState::Armed);
    }

    #[test]
    fn still_window_does_not_trigger_with_rotation_gate() {
        let mut monitor = ResetMonitor::new(ResetParameters {
            window_capacity: 2,
            reset_threshold: 0.1,
            min_net_rotation: 1_f64.to_radians(),
            ..Default::default()
        })
        .unwrap();

        monitor.update(sample(Vector3::x(), 0.0)).unwrap();
        let update = monitor.update(sample(Vector3::zeros(), 0.2)).unwrap();

        assert_eq!(update.report, ResetReport::at_rest(2));
        assert!(update.command.is_none());
        assert_eq!(update.state, TriggerState::Evaluating);
    }

    #[test]
    fn command_steps_are_canonical() {
        let mut monitor = ResetMonitor::new(ResetParameters {
            window_capacity: 3,
            reset_threshold: 0.5,
            micro_steps: 1,
            ..Default::default()
        })
        .unwrap();

        monitor
            .update(RotationSample::new(Vector3::new(3.0, 0.0, 4.0), 0.3, 0.1))
            .unwrap();
        monitor
            .update(RotationSample::new(Vector3::zeros(), 0.9, 0.1))
            .unwrap();
        let update = monitor.update(sample(Vector3::y(), 0.3)).unwrap();

        assert!(monitor.window().iter().all(|s| {
            s.axis == Vector3::zeros() || (s.axis.norm() - 1.0).abs() < 1e-12
        }));

        let command = update.command.unwrap();
        assert_eq!(command.steps.len(), 3);
        assert_relative_eq!(command.steps[0].axis, Vector3::new(0.6, 0.0, 0.8), epsilon = 1e-12);
        assert_eq!(command.steps[1].axis, Vector3::zeros());
        assert_eq!(command.steps[1].angle, 0.0);
        assert_relative_eq!(command.steps[2].axis.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn triggers_again_after_cooldown() {
        let mut monitor = monitor(2, Duration::from_millis(500));
        let axes = [Vector3::x(), Vector3::y()];

        let triggered: Vec<_> = (0..12)
            .map(|i| {
                monitor
                    .update(sample(axes[i % 2], 0.3))
                    .unwrap()
                    .command
                    .is_some()
            })
            .collect();

        let emitted: Vec<_> = triggered
            .iter()
            .enumerate()
            .filter_map(|(i, &t)| t.then_some(i))
            .collect();
        assert_eq!(emitted, vec![1, 6, 11]);
    }

    #[test]
    fn malformed_samples_are_dropped() {
        let mut monitor = monitor(2, Duration::from_secs(1));
        monitor.update(sample(Vector3::x(), 0.3)).unwrap();

        let error = monitor
            .update(RotationSample::new(Vector3::y(), f64::NAN, 0.1))
            .unwrap_err();
        assert!(matches!(error, SampleError::NonFiniteAngle(_)));
        assert_eq!(monitor.dropped_samples(), 1);
        assert_eq!(monitor.window().len(), 1);
        assert_eq!(monitor.state(), TriggerState::Idle);

        let update = monitor.update(sample(Vector3::y(), 0.3)).unwrap();
        assert!(update.command.is_some());
    }

    #[test]
    fn reset_clears_window() {
        let mut monitor = monitor(2, Duration::from_secs(1));
        monitor.update(sample(Vector3::x(), 0.3)).unwrap();
        monitor.update(sample(Vector3::y(), 0.3)).unwrap();

        monitor.reset();
        assert!(monitor.window().is_empty());
        assert_eq!(monitor.state(), TriggerState::Idle);
        assert_eq!(monitor.report(), ResetReport::at_rest(0));
    }

    #[test]
    fn predicted_benefit_uses_window() {
        let mut monitor = monitor(4, Duration::from_secs(1));
        for _ in 0..3 {
            monitor.update(sample(Vector3::z(), 0.2)).unwrap();
        }

        let benefit = monitor.predict_benefit(&UnitQuaternion::identity());
        assert_eq!(benefit.report.sample_count, 3);
        assert_relative_eq!(benefit.residual_without_reset, 0.6, epsilon = 1e-9);
        assert!(benefit.residual_with_reset < 1e-6);
    }
}
