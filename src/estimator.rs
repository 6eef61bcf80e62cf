//! The resetability estimator.
//!
//! Given an ordered sequence of increments with net rotation angle
//! $\theta_{net}$, the estimator looks for the uniform angle scale
//! $\lambda = \pi / \theta_{net}$ that turns the net rotation into a half-turn,
//! and checks how close applying the scaled sequence twice comes to the
//! identity:
//!
//! $$q_1 = \mathrm{compose}(\lambda \cdot seq), \quad q_{reset} = q_1 \circ q_1,
//! \quad R = 1 - |w(q_{reset})|$$
//!
//! For rotations about a single axis the scaled replay is an exact half-turn
//! and $R = 0$. The more the increments fail to commute, the further
//! $q_{reset}$ is from the identity and the larger $R$ becomes.

use std::{borrow::Borrow, f64::consts::PI};

use nalgebra::UnitQuaternion;

use crate::{
    codec::{rotation_angle, ANGLE_EPSILON},
    compose::{compose, compose_scaled},
    RotationSample,
};

/// Result of one evaluation of the estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResetReport {
    /// Angle scale applied to every increment of the replay. `1.0` when there
    /// is no net rotation.
    pub lambda: f64,
    /// Residual distance from identity after the scaled double replay, in
    /// $[0, 1]$.
    ///
    /// # Note
    ///
    /// Despite the name, this behaves like an error: `0` means the sequence
    /// is perfectly resettable and `1` means the double replay ends a
    /// half-turn away from the start.
    #[cfg_attr(feature = "serde", serde(rename = "R"))]
    pub resetability: f64,
    /// Net rotation angle of the sequence, in $[0, \pi]$ radians.
    pub theta_net: f64,
    /// Number of increments evaluated.
    #[cfg_attr(feature = "serde", serde(rename = "N"))]
    pub sample_count: usize,
}

impl ResetReport {
    /// The report for a sequence without any net rotation.
    #[must_use]
    pub fn at_rest(sample_count: usize) -> Self {
        Self {
            lambda: 1.0,
            resetability: 0.0,
            theta_net: 0.0,
            sample_count,
        }
    }
}

/// Angle scale that turns a net rotation of `theta_net` into a half-turn.
///
/// Returns `1.0` when `theta_net` is below [`ANGLE_EPSILON`], as there is
/// nothing to scale.
#[inline]
#[must_use]
pub fn reset_scale(theta_net: f64) -> f64 {
    if theta_net > ANGLE_EPSILON {
        PI / theta_net
    } else {
        1.0
    }
}

/// Net rotation angle of `samples`, in $[0, \pi]$.
#[must_use]
pub fn net_rotation_angle<I>(samples: I) -> f64
where
    I: IntoIterator,
    I::Item: Borrow<RotationSample>,
{
    rotation_angle(&compose(samples))
}

/// Applies `samples` scaled by `lambda` twice and returns the resulting
/// orientation, $q_1 \circ q_1$ with $q_1 = \mathrm{compose}(\lambda \cdot
/// seq)$.
///
/// This is the replay check behind [`estimate`], exposed so other scale hypotheses
/// can be tested without re-deriving `lambda`. It is pure.
///
/// # Example
///
/// ```
/// use nalgebra::{UnitQuaternion, Vector3};
/// use so3_reset::{estimator::apply_scaled_twice, RotationSample};
///
/// // a quarter-turn scaled by 2 and applied twice is a full turn
/// let samples = [RotationSample::new(Vector3::z(), std::f64::consts::FRAC_PI_2, 0.1)];
/// let q = apply_scaled_twice(&samples, 2.0);
/// assert!(q.angle() < 1e-9);
/// ```
#[must_use]
pub fn apply_scaled_twice<I>(samples: I, lambda: f64) -> UnitQuaternion<f64>
where
    I: IntoIterator,
    I::Item: Borrow<RotationSample>,
{
    let once = compose_scaled(samples, lambda);
    let mut twice = once * once;
    twice.renormalize();
    twice
}

/// The resetability residual of a reset orientation,
/// $1 - |\mathrm{clamp}(w, -1, 1)|$.
///
/// Both $q$ and $-q$ close to the identity give a residual close to `0`.
#[inline]
#[must_use]
pub fn resetability(q_reset: &UnitQuaternion<f64>) -> f64 {
    1.0 - q_reset.w.clamp(-1.0, 1.0).abs()
}

/// Evaluates the resetability of `samples`.
///
/// An empty sequence, or one without net rotation, reports
/// $\lambda = 1$, $R = 0$ and $\theta_{net} = 0$.
///
/// # Example
///
/// ```
/// use nalgebra::Vector3;
/// use so3_reset::{estimator::estimate, RotationSample};
///
/// let samples = vec![
///     RotationSample::new(Vector3::x(), 0.3, 0.01),
///     RotationSample::new(Vector3::y(), 0.3, 0.01),
/// ];
/// let report = estimate(&samples);
///
/// assert_eq!(report.sample_count, 2);
/// assert!(report.resetability > 0.0 && report.resetability < 0.1);
/// ```
#[must_use]
pub fn estimate<'a, I>(samples: I) -> ResetReport
where
    I: IntoIterator<Item = &'a RotationSample>,
    I::IntoIter: Clone,
{
    let samples = samples.into_iter();
    let sample_count = samples.clone().count();

    let theta_net = net_rotation_angle(samples.clone());
    if theta_net <= ANGLE_EPSILON {
        return ResetReport::at_rest(sample_count);
    }

    let lambda = reset_scale(theta_net);
    let q_reset = apply_scaled_twice(samples, lambda);

    ResetReport {
        lambda,
        resetability: resetability(&q_reset),
        theta_net,
        sample_count,
    }
}

/// Predicted effect of a reset on the attitude error relative to a current
/// orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResetBenefit {
    /// The report of the evaluated sequence.
    pub report: ResetReport,
    /// Residual angle in radians if the motion simply continues.
    pub residual_without_reset: f64,
    /// Residual angle in radians if the scaled sequence is applied twice.
    pub residual_with_reset: f64,
}

impl ResetBenefit {
    /// Reduction of the residual angle in radians. Negative when the reset
    /// would make things worse.
    #[must_use]
    pub fn benefit(&self) -> f64 {
        self.residual_without_reset - self.residual_with_reset
    }

    /// [`Self::benefit`] in degrees.
    #[must_use]
    pub fn benefit_degrees(&self) -> f64 {
        self.benefit().to_degrees()
    }
}

/// Predicts how much a $\lambda$-scaled double replay of `samples` would
/// reduce the residual rotation, starting from `current`.
///
/// Without a reset the sequence is applied once on top of `current`; with a
/// reset the scaled sequence is applied twice instead. The residual in both
/// cases is the rotation angle of the resulting orientation.
#[must_use]
pub fn predict_reset_benefit<'a, I>(samples: I, current: &UnitQuaternion<f64>) -> ResetBenefit
where
    I: IntoIterator<Item = &'a RotationSample>,
    I::IntoIter: Clone,
{
    let samples = samples.into_iter();
    let report = estimate(samples.clone());
    if report.sample_count == 0 {
        return ResetBenefit {
            report,
            residual_without_reset: 0.0,
            residual_with_reset: 0.0,
        };
    }

    let without_reset = compose(samples.clone()) * current;
    let with_reset = apply_scaled_twice(samples, report.lambda) * current;

    ResetBenefit {
        report,
        residual_without_reset: rotation_angle(&without_reset),
        residual_with_reset: rotation_angle(&with_reset),
    }
}
