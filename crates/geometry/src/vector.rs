use std::{
    fmt::Debug,
    ops::{Add, Neg, Sub},
};

use glam::{DVec3, Vec3};
use num_traits::{Float, One};

/// A three component vector the bounding volume builders can work over.
///
/// Implemented for [`Vec3`] and [`DVec3`] so the same algorithms run in single or double
/// precision. Literals the algorithms depend on live here as associated constants so each
/// precision gets its own reading of them.
pub trait Vector:
    Copy
    + PartialEq
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
{
    type Scalar: Float + Debug;

    const ZERO: Self;
    const X: Self;
    const Y: Self;
    const Z: Self;

    /// Squared lengths below this are treated as zero by degeneracy checks.
    const EPSILON: Self::Scalar;

    fn new(x: Self::Scalar, y: Self::Scalar, z: Self::Scalar) -> Self;

    fn splat(value: Self::Scalar) -> Self {
        Self::new(value, value, value)
    }

    fn to_array(self) -> [Self::Scalar; 3];

    #[must_use]
    fn scale(self, factor: Self::Scalar) -> Self;

    fn dot(self, rhs: Self) -> Self::Scalar;

    fn cross(self, rhs: Self) -> Self;

    fn length_squared(self) -> Self::Scalar {
        self.dot(self)
    }

    /// `None` when the vector is zero, not finite, or too short to normalize.
    fn try_normalize(self) -> Option<Self>;

    #[must_use]
    fn component_min(self, rhs: Self) -> Self;

    #[must_use]
    fn component_max(self, rhs: Self) -> Self;

    #[must_use]
    fn abs(self) -> Self;
}

macro_rules! impl_vector {
    ($vec:ty, $scalar:ty) => {
        impl Vector for $vec {
            type Scalar = $scalar;

            const EPSILON: $scalar = 1e-6;
            const X: Self = <$vec>::X;
            const Y: Self = <$vec>::Y;
            const Z: Self = <$vec>::Z;
            const ZERO: Self = <$vec>::ZERO;

            fn new(x: $scalar, y: $scalar, z: $scalar) -> Self {
                <$vec>::new(x, y, z)
            }

            fn to_array(self) -> [$scalar; 3] {
                <$vec>::to_array(&self)
            }

            fn scale(self, factor: $scalar) -> Self {
                self * factor
            }

            fn dot(self, rhs: Self) -> $scalar {
                <$vec>::dot(self, rhs)
            }

            fn cross(self, rhs: Self) -> Self {
                <$vec>::cross(self, rhs)
            }

            fn try_normalize(self) -> Option<Self> {
                <$vec>::try_normalize(self)
            }

            fn component_min(self, rhs: Self) -> Self {
                <$vec>::min(self, rhs)
            }

            fn component_max(self, rhs: Self) -> Self {
                <$vec>::max(self, rhs)
            }

            fn abs(self) -> Self {
                <$vec>::abs(self)
            }
        }
    };
}

impl_vector!(Vec3, f32);
impl_vector!(DVec3, f64);

/// `0.5` at the vector's precision.
pub(crate) fn half<V: Vector>() -> V::Scalar {
    let one = V::Scalar::one();
    one / (one + one)
}
