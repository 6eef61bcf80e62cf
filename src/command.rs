//! Corrective micro-step sequences handed to an actuator.

use std::{borrow::Borrow, num::NonZeroUsize};

use nalgebra::UnitQuaternion;

use crate::{compose::compose, RotationSample};

/// Number of times the actuator must execute [`ResetCommand::steps`].
pub const REPLAY_COUNT: usize = 2;

/// A reset command: the $\lambda$-scaled window split into micro-steps.
///
/// The actuator is expected to execute [`Self::steps`] [`REPLAY_COUNT`]
/// times in a row, see [`Self::execution`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResetCommand {
    /// Scale that was applied to every increment.
    pub lambda: f64,
    /// Micro-steps per original increment.
    pub micro_steps: usize,
    /// One replay of the scaled sequence, oldest increment first.
    pub steps: Vec<RotationSample>,
}

impl ResetCommand {
    /// Scales every sample by `lambda` and splits it into `micro_steps`
    /// equal parts, each covering `angle * lambda / micro_steps` radians over
    /// `dt / micro_steps` seconds about the original axis.
    ///
    /// Samples are brought into [`RotationSample::canonical`] form first, so
    /// every step has a unit axis or is a zero rotation.
    #[must_use]
    pub fn build<I>(samples: I, lambda: f64, micro_steps: NonZeroUsize) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<RotationSample>,
    {
        let count = micro_steps.get();
        #[allow(clippy::cast_precision_loss)]
        let divisor = count as f64;

        let steps = samples
            .into_iter()
            .flat_map(|sample| {
                let sample = sample.borrow().canonical();
                let step = RotationSample::new(
                    sample.axis,
                    sample.angle * lambda / divisor,
                    sample.dt / divisor,
                );
                std::iter::repeat(step).take(count)
            })
            .collect();

        Self {
            lambda,
            micro_steps: count,
            steps,
        }
    }

    /// Every micro-step in execution order, i.e. [`Self::steps`] repeated
    /// [`REPLAY_COUNT`] times.
    pub fn execution(&self) -> impl Iterator<Item = &RotationSample> + Clone + '_ {
        std::iter::repeat(self.steps.iter())
            .take(REPLAY_COUNT)
            .flatten()
    }

    /// Orientation reached after executing the whole command from identity.
    #[must_use]
    pub fn final_orientation(&self) -> UnitQuaternion<f64> {
        compose(self.execution())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::apply_scaled_twice;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn micro_steps(count: usize) -> NonZeroUsize {
        NonZeroUsize::new(count).unwrap()
    }

    #[test]
    fn splits_every_increment() {
        let samples = [
            RotationSample::new(Vector3::x(), 0.3, 0.1),
            RotationSample::new(Vector3::y(), -0.6, 0.2),
        ];
        let command = ResetCommand::build(&samples, 2.0, micro_steps(3));

        assert_eq!(command.steps.len(), 6);
        assert_eq!(command.micro_steps, 3);

        for step in &command.steps[..3] {
            assert_eq!(step.axis, Vector3::x());
            assert_relative_eq!(step.angle, 0.2, epsilon = 1e-12);
            assert_relative_eq!(step.dt, 0.1 / 3.0, epsilon = 1e-12);
        }
        for step in &command.steps[3..] {
            assert_eq!(step.axis, Vector3::y());
            assert_relative_eq!(step.angle, -0.4, epsilon = 1e-12);
        }
    }

    #[test]
    fn steps_have_unit_or_zero_axes() {
        let samples = [
            RotationSample::new(Vector3::new(3.0, 0.0, 4.0), 0.3, 0.1),
            RotationSample::new(Vector3::zeros(), 0.9, 0.1),
        ];
        let command = ResetCommand::build(&samples, 2.0, micro_steps(1));

        assert_relative_eq!(command.steps[0].axis, Vector3::new(0.6, 0.0, 0.8), epsilon = 1e-12);
        assert_relative_eq!(command.steps[0].angle, 0.6, epsilon = 1e-12);
        assert_eq!(command.steps[1].axis, Vector3::zeros());
        assert_eq!(command.steps[1].angle, 0.0);
    }

    #[test]
    fn execution_replays_twice() {
        let samples = [RotationSample::new(Vector3::z(), 0.5, 0.1)];
        let command = ResetCommand::build(&samples, 1.0, micro_steps(4));

        assert_eq!(command.execution().count(), 8);
    }

    #[test]
    fn final_orientation_matches_double_replay() {
        let samples = [
            RotationSample::new(Vector3::x(), 0.2, 0.1),
            RotationSample::new(Vector3::new(1.0, 1.0, 0.0), 0.4, 0.1),
            RotationSample::new(Vector3::z(), -0.1, 0.1),
        ];
        let command = ResetCommand::build(&samples, 3.0, micro_steps(5));

        assert_relative_eq!(
            command.final_orientation(),
            apply_scaled_twice(&samples, 3.0),
            epsilon = 1e-9
        );
    }
}
