//! The rotation increment fed into the engine.

use nalgebra::{UnitQuaternion, Vector3};

use crate::{
    codec::{axis_angle_to_quaternion, quaternion_to_axis_angle, AXIS_EPSILON},
    error::SampleError,
};

/// A single body-frame rotation increment.
///
/// The axis does not have to be normalized. A zero axis is degenerate and is
/// treated as "no rotation" whatever the angle. [`Self::canonical`] brings a
/// sample into that normal form.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RotationSample {
    /// Rotation axis.
    pub axis: Vector3<f64>,
    /// Rotation angle in radians.
    pub angle: f64,
    /// Time covered by this increment, in seconds.
    pub dt: f64,
}

impl RotationSample {
    /// Creates a new sample.
    #[must_use]
    pub fn new(axis: Vector3<f64>, angle: f64, dt: f64) -> Self {
        Self { axis, angle, dt }
    }

    /// Builds the increment that rotates `from` into `to`, i.e.
    /// $\Delta q = q_{to} \circ q_{from}^{-1}$.
    ///
    /// This is how absolute orientation telemetry is turned into increments.
    #[must_use]
    pub fn between(from: &UnitQuaternion<f64>, to: &UnitQuaternion<f64>, dt: f64) -> Self {
        let delta = to * from.conjugate();
        let (axis, angle) = quaternion_to_axis_angle(delta.quaternion());
        Self { axis, angle, dt }
    }

    /// Checks that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns a [`SampleError`] if the axis or angle is NaN or infinite, or if
    /// `dt` is NaN, infinite or negative.
    pub fn validate(&self) -> Result<(), SampleError> {
        if !self.axis.iter().all(|c| c.is_finite()) {
            return Err(SampleError::NonFiniteAxis);
        }
        if !self.angle.is_finite() {
            return Err(SampleError::NonFiniteAngle(self.angle));
        }
        if !self.dt.is_finite() || self.dt < 0.0 {
            return Err(SampleError::InvalidDt(self.dt));
        }
        Ok(())
    }

    /// Returns the same rotation with a unit axis, or with a zero axis and a
    /// zero angle if the axis is degenerate.
    #[must_use]
    pub fn canonical(&self) -> Self {
        let norm = self.axis.norm();
        if norm < AXIS_EPSILON {
            Self {
                axis: Vector3::zeros(),
                angle: 0.0,
                dt: self.dt,
            }
        } else {
            Self {
                axis: self.axis / norm,
                ..*self
            }
        }
    }

    /// Returns a copy with the angle multiplied by `lambda`. Axis and `dt` are
    /// kept.
    #[inline]
    #[must_use]
    pub fn scaled(&self, lambda: f64) -> Self {
        Self {
            angle: self.angle * lambda,
            ..*self
        }
    }

    /// The unit quaternion of this increment.
    #[inline]
    #[must_use]
    pub fn to_quaternion(&self) -> UnitQuaternion<f64> {
        axis_angle_to_quaternion(&self.axis, self.angle)
    }
}
