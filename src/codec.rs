//! Conversion between axis-angle rotations and unit quaternions.
//!
//! Both conversions are total over finite input. Degenerate input (a zero
//! axis, a zero quaternion, a vanishing angle) resolves to the identity or to
//! a fixed sentinel instead of failing.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Axes with a norm below this value are treated as degenerate.
pub const AXIS_EPSILON: f64 = 1e-12;

/// Rotation angles below this value (in radians) are treated as zero.
pub const ANGLE_EPSILON: f64 = 1e-12;

/// Axis returned by [`quaternion_to_axis_angle`] when the angle is zero.
#[must_use]
pub fn sentinel_axis() -> Vector3<f64> {
    Vector3::x()
}

/// Converts a rotation of `angle` radians about `axis` into a unit quaternion.
///
/// The axis does not need to be normalized. An axis with a norm below
/// [`AXIS_EPSILON`] yields the identity, whatever the angle.
///
/// $$q = \left(\cos\frac{\theta}{2},\ \sin\frac{\theta}{2}\,\hat{n}\right)$$
///
/// # Example
///
/// ```
/// use nalgebra::Vector3;
/// use so3_reset::codec::axis_angle_to_quaternion;
///
/// let q = axis_angle_to_quaternion(&Vector3::new(0.0, 0.0, 2.0), std::f64::consts::PI);
/// assert!(q.w.abs() < 1e-12);
/// assert!((q.k - 1.0).abs() < 1e-12);
///
/// let degenerate = axis_angle_to_quaternion(&Vector3::zeros(), 1.0);
/// assert_eq!(degenerate, nalgebra::UnitQuaternion::identity());
/// ```
#[inline]
#[must_use]
pub fn axis_angle_to_quaternion(axis: &Vector3<f64>, angle: f64) -> UnitQuaternion<f64> {
    let norm = axis.norm();
    if norm < AXIS_EPSILON {
        return UnitQuaternion::identity();
    }

    let half = angle / 2.0;
    let axis = axis / norm;
    let (sine, cosine) = half.sin_cos();

    UnitQuaternion::new_unchecked(Quaternion::new(
        cosine,
        sine * axis.x,
        sine * axis.y,
        sine * axis.z,
    ))
}

/// Extracts the axis and angle of the rotation represented by `q`.
///
/// The quaternion is normalized first and then flipped onto the `w >= 0`
/// hemisphere, since `q` and `-q` are the same rotation. The returned angle
/// therefore always lies in $[0, \pi]$:
///
/// $$\theta = 2 \arccos(\mathrm{clamp}(|w|, -1, 1))$$
///
/// A full turn folds back to the identity, so net rotations beyond $\pi$
/// come back as the complementary rotation about the opposite axis.
///
/// If the angle is below [`ANGLE_EPSILON`], or `q` has no usable norm, the
/// [`sentinel_axis`] and an angle of `0` are returned.
///
/// # Example
///
/// ```
/// use nalgebra::{Quaternion, Vector3};
/// use so3_reset::codec::{axis_angle_to_quaternion, quaternion_to_axis_angle};
///
/// let q = axis_angle_to_quaternion(&Vector3::y(), 1.2);
/// let (axis, angle) = quaternion_to_axis_angle(q.quaternion());
/// assert!((angle - 1.2).abs() < 1e-12);
/// assert!((axis - Vector3::y()).norm() < 1e-12);
///
/// // 3/2 turn about +z is reported as a half-turn about -z.
/// let q = axis_angle_to_quaternion(&Vector3::z(), 1.5 * std::f64::consts::PI);
/// let (axis, angle) = quaternion_to_axis_angle(q.quaternion());
/// assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// assert!((axis + Vector3::z()).norm() < 1e-12);
/// ```
#[must_use]
pub fn quaternion_to_axis_angle(q: &Quaternion<f64>) -> (Vector3<f64>, f64) {
    let norm = q.norm();
    if norm < AXIS_EPSILON {
        return (sentinel_axis(), 0.0);
    }

    let mut q = *q / norm;
    if q.w < 0.0 {
        q = -q;
    }

    let w = q.w.clamp(-1.0, 1.0);
    let angle = 2.0 * w.acos();
    if angle < ANGLE_EPSILON {
        return (sentinel_axis(), 0.0);
    }

    // for a unit quaternion |v| = sin(angle / 2), dividing by the norm keeps
    // the axis unit length when `w` was rounded by the clamp
    let vector = q.imag();
    let vector_norm = vector.norm();
    if vector_norm < AXIS_EPSILON {
        return (sentinel_axis(), 0.0);
    }

    (vector / vector_norm, angle)
}

/// Returns the rotation angle of `q` in $[0, \pi]$.
///
/// Shorthand for the angle part of [`quaternion_to_axis_angle`].
#[inline]
#[must_use]
pub fn rotation_angle(q: &UnitQuaternion<f64>) -> f64 {
    quaternion_to_axis_angle(q.quaternion()).1
}
