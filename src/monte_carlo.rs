//! Monte Carlo evaluation of random rotation sequences.
//!
//! Generates random increment sequences with Gaussian step sizes and
//! collects the resetability and predicted reset benefit of each, so the
//! metric can be characterized for a given noise level.

use nalgebra::{UnitQuaternion, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Normal, StandardNormal};

use crate::{
    error::ConfigError,
    estimator::{predict_reset_benefit, ResetBenefit},
    telemetry::CANDIDATE_MAX_RESETABILITY,
    RotationSample,
};

/// Parameters of a Monte Carlo run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarloConfig {
    /// Number of random sequences.
    pub runs: usize,
    /// Number of increments per sequence.
    pub steps: usize,
    /// Mean step angle in radians.
    pub step_mean: f64,
    /// Standard deviation of the step angle in radians.
    pub step_std: f64,
    /// Time step of every increment in seconds.
    pub dt: f64,
    /// Seed of the random number generator.
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            runs: 500,
            steps: 100,
            step_mean: 0.02,
            step_std: 0.01,
            dt: 0.01,
            seed: 0,
        }
    }
}

/// Outcome of a single random sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarloRun {
    /// Report and predicted benefit, relative to [`nominal_orientation`].
    pub benefit: ResetBenefit,
}

/// Aggregate statistics over a set of [`MonteCarloRun`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonteCarloSummary {
    /// Mean resetability residual.
    pub mean_resetability: f64,
    /// Population standard deviation of the resetability residual.
    pub std_resetability: f64,
    /// Mean net rotation in radians.
    pub mean_theta_net: f64,
    /// Mean predicted benefit in radians.
    pub mean_benefit: f64,
    /// Number of runs below [`CANDIDATE_MAX_RESETABILITY`].
    pub reset_opportunities: usize,
}

/// The orientation every run starts from: 0.05 rad about +z.
#[must_use]
pub fn nominal_orientation() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.05)
}

/// Draws `steps` increments with uniformly distributed axes and step angles
/// of $|\mathcal{N}(\mu, \sigma)|$.
pub fn random_rotation_sequence<R: Rng + ?Sized>(
    rng: &mut R,
    steps: usize,
    step: &Normal<f64>,
    dt: f64,
) -> Vec<RotationSample> {
    (0..steps)
        .map(|_| {
            // an isotropic Gaussian vector has a uniformly distributed direction
            let axis: Vector3<f64> = Vector3::from_fn(|_, _| rng.sample(StandardNormal));
            let angle: f64 = rng.sample(step);
            RotationSample::new(axis, angle.abs(), dt)
        })
        .collect()
}

/// Runs the simulation described by `config`.
///
/// # Errors
///
/// Returns [`ConfigError::StepDistribution`] if the step standard deviation
/// is negative or not finite.
pub fn run(config: &MonteCarloConfig) -> Result<Vec<MonteCarloRun>, ConfigError> {
    let step = Normal::new(config.step_mean, config.step_std)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let nominal = nominal_orientation();

    tracing::debug!(
        runs = config.runs,
        steps = config.steps,
        seed = config.seed,
        "starting monte carlo"
    );
    let runs = (0..config.runs)
        .map(|_| {
            let samples = random_rotation_sequence(&mut rng, config.steps, &step, config.dt);
            MonteCarloRun {
                benefit: predict_reset_benefit(&samples, &nominal),
            }
        })
        .collect();

    Ok(runs)
}

/// Summarizes `runs`. Returns `None` if there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(runs: &[MonteCarloRun]) -> Option<MonteCarloSummary> {
    if runs.is_empty() {
        return None;
    }
    let count = runs.len() as f64;
    let mean = |value: fn(&MonteCarloRun) -> f64| runs.iter().map(value).sum::<f64>() / count;

    let mean_resetability = mean(|run| run.benefit.report.resetability);
    let variance = runs
        .iter()
        .map(|run| (run.benefit.report.resetability - mean_resetability).powi(2))
        .sum::<f64>()
        / count;

    Some(MonteCarloSummary {
        mean_resetability,
        std_resetability: variance.sqrt(),
        mean_theta_net: mean(|run| run.benefit.report.theta_net),
        mean_benefit: mean(|run| run.benefit.benefit()),
        reset_opportunities: runs
            .iter()
            .filter(|run| run.benefit.report.resetability < CANDIDATE_MAX_RESETABILITY)
            .count(),
    })
}
