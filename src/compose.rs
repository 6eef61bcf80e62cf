//! Composition of an ordered sequence of rotation increments.

use std::borrow::Borrow;

use nalgebra::UnitQuaternion;

use crate::RotationSample;

/// Folds `samples` into the net orientation they produce, in arrival order.
///
/// Every increment is pre-multiplied onto the running orientation,
/// $q \leftarrow \Delta q_k \circ q$, starting from the identity, so the
/// result of `[a, b]` is $\Delta q_b \circ \Delta q_a$. The running quaternion
/// is renormalized after each multiplication to keep $|q| = 1$ on long
/// sequences.
///
/// Accepts anything that yields samples by value or by reference, so a
/// window can be composed without copying it.
///
/// # Example
///
/// ```
/// use nalgebra::{UnitQuaternion, Vector3};
/// use so3_reset::{compose::compose, RotationSample};
///
/// assert_eq!(compose(Vec::<RotationSample>::new()), UnitQuaternion::identity());
///
/// let a = RotationSample::new(Vector3::x(), 0.5, 0.01);
/// let b = RotationSample::new(Vector3::y(), 0.5, 0.01);
/// assert_ne!(compose([a, b]), compose([b, a]));
/// ```
#[must_use]
pub fn compose<I>(samples: I) -> UnitQuaternion<f64>
where
    I: IntoIterator,
    I::Item: Borrow<RotationSample>,
{
    samples
        .into_iter()
        .fold(UnitQuaternion::identity(), |q, sample| {
            let mut q = sample.borrow().to_quaternion() * q;
            q.renormalize();
            q
        })
}

/// Like [`compose`], but with every angle multiplied by `lambda` on the fly.
#[must_use]
pub fn compose_scaled<I>(samples: I, lambda: f64) -> UnitQuaternion<f64>
where
    I: IntoIterator,
    I::Item: Borrow<RotationSample>,
{
    compose(samples.into_iter().map(|sample| sample.borrow().scaled(lambda)))
}
