//! Resetability analysis over absolute orientation telemetry.
//!
//! Recorded or streamed attitude data usually comes as timestamped
//! orientation quaternions rather than increments. This module turns such a
//! stream into increments, evaluates a sliding window over them and flags the
//! points where a reset would have been worthwhile.

use nalgebra::UnitQuaternion;

use crate::{
    estimator::{predict_reset_benefit, ResetBenefit},
    ResetReport, RotationSample,
};

/// Points with a resetability residual below this value are reset
/// candidates.
pub const CANDIDATE_MAX_RESETABILITY: f64 = 0.05;

/// Points must have rotated at least this much, in degrees, to be reset
/// candidates.
pub const CANDIDATE_MIN_NET_ROTATION_DEG: f64 = 1.0;

/// An absolute orientation at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrientationRecord {
    /// Time of the measurement in seconds.
    pub timestamp: f64,
    /// Measured orientation.
    pub orientation: UnitQuaternion<f64>,
}

impl OrientationRecord {
    /// Timestamps untimed orientations assuming a constant `rate_hz`.
    ///
    /// A rate below 1 Hz is treated as 1 Hz.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn at_rate(orientations: &[UnitQuaternion<f64>], rate_hz: f64) -> Vec<Self> {
        let rate_hz = rate_hz.max(1.0);
        orientations
            .iter()
            .enumerate()
            .map(|(i, orientation)| Self {
                timestamp: i as f64 / rate_hz,
                orientation: *orientation,
            })
            .collect()
    }
}

/// One evaluated point of a telemetry stream.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryPoint {
    /// Timestamp of the orientation the window ends at.
    pub timestamp: f64,
    /// The report and predicted benefit of the window.
    pub benefit: ResetBenefit,
}

impl TelemetryPoint {
    /// The resetability report of the window.
    #[must_use]
    pub fn report(&self) -> &ResetReport {
        &self.benefit.report
    }

    /// Whether resetting at this point would have been worthwhile: low
    /// residual, some actual rotation, and a positive predicted benefit.
    #[must_use]
    pub fn is_reset_candidate(&self) -> bool {
        self.benefit.report.resetability < CANDIDATE_MAX_RESETABILITY
            && self.benefit.report.theta_net.to_degrees() > CANDIDATE_MIN_NET_ROTATION_DEG
            && self.benefit.benefit() > 0.0
    }
}

/// Relative increments between consecutive records.
///
/// Each increment rotates one orientation into the next; its `dt` is the
/// timestamp difference, clamped at zero for out-of-order records.
#[must_use]
pub fn increments(records: &[OrientationRecord]) -> Vec<RotationSample> {
    records
        .windows(2)
        .map(|pair| {
            let dt = (pair[1].timestamp - pair[0].timestamp).max(0.0);
            RotationSample::between(&pair[0].orientation, &pair[1].orientation, dt)
        })
        .collect()
}

/// Evaluates a sliding window of `window` increments along `records`.
///
/// For each index `i` from `window` up to (excluding) the last record, the
/// increments between records `i - window` and `i` are evaluated, and the
/// reset benefit is predicted from the orientation at `i`. Returns nothing
/// if `window` is zero or there are not enough records.
#[must_use]
pub fn analyze(records: &[OrientationRecord], window: usize) -> Vec<TelemetryPoint> {
    let end = records.len().saturating_sub(1);
    if window == 0 || end <= window {
        return Vec::new();
    }

    let increments = increments(records);
    (window..end)
        .map(|i| TelemetryPoint {
            timestamp: records[i].timestamp,
            benefit: predict_reset_benefit(&increments[i - window..i], &records[i].orientation),
        })
        .collect()
}

/// The points of `points` that are reset candidates.
pub fn reset_candidates(points: &[TelemetryPoint]) -> impl Iterator<Item = &TelemetryPoint> {
    points.iter().filter(|point| point.is_reset_candidate())
}
