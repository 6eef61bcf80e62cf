//! Error types.
//!
//! Only configuration problems and malformed upstream samples are errors. The
//! math itself is total: degenerate axes and rounding drift are absorbed by
//! [`crate::codec`] and [`crate::compose`].

use thiserror::Error;

/// Rejected configuration for a [`crate::ResetMonitor`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The window must hold at least one sample.
    #[error("window capacity must be at least 1")]
    ZeroWindow,
    /// The trigger threshold is compared against `R`, which lives in `[0, 1]`.
    #[error("reset threshold {0} is outside [0, 1]")]
    ThresholdOutOfRange(f64),
    /// Every increment must be split into at least one micro-step.
    #[error("micro-step count must be at least 1")]
    ZeroMicroSteps,
    /// The minimum net rotation gate must be a finite, non-negative angle.
    #[error("minimum net rotation {0} rad must be finite and non-negative")]
    InvalidMinNetRotation(f64),
    /// The cooldown must be a finite, non-negative number of seconds.
    #[error("cooldown of {0} s must be finite and non-negative")]
    InvalidCooldown(f64),
    /// The Monte Carlo step distribution cannot be built.
    #[error("invalid step distribution: {0}")]
    StepDistribution(#[from] rand_distr::NormalError),
    /// The profile file could not be read.
    #[cfg(feature = "config")]
    #[error("failed to read profile file: {0}")]
    Io(#[from] std::io::Error),
    /// The profile file is not valid TOML for the profile schema.
    #[cfg(feature = "config")]
    #[error("failed to parse profile file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The requested profile is not defined in the profile file.
    #[cfg(feature = "config")]
    #[error("profile not found: {0}")]
    UnknownProfile(String),
}

/// A malformed [`crate::RotationSample`] coming from the ingestion side.
///
/// These are never fatal: the monitor drops the sample and keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SampleError {
    /// At least one axis component is NaN or infinite.
    #[error("axis has non-finite components")]
    NonFiniteAxis,
    /// The rotation angle is NaN or infinite.
    #[error("angle {0} is not finite")]
    NonFiniteAngle(f64),
    /// The time step is NaN, infinite or negative.
    #[error("time step {0} must be finite and non-negative")]
    InvalidDt(f64),
}
