use std::fmt::{Debug, Display};

use glam::Vec3;
use num_traits::{Float, One};
use serde::{Deserialize, Serialize};

use crate::vector::{Vector, half};

#[derive(Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aabb<V = Vec3> {
    pub min: V,
    pub max: V,
}

impl<V: Vector> Default for Aabb<V> {
    fn default() -> Self {
        Self::null()
    }
}

impl<V: Vector> FromIterator<V> for Aabb<V> {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        let mut aabb = Self::null();
        for point in iter {
            aabb.expand_to_point(point);
        }
        aabb
    }
}

impl<V: Vector> Debug for Aabb<V>
where
    V::Scalar: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl<V: Vector> Display for Aabb<V>
where
    V::Scalar: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // write [0.00, 0.00, 0.00] -> [1.00, 1.00, 1.00]
        let [min_x, min_y, min_z] = self.min.to_array();
        let [max_x, max_y, max_z] = self.max.to_array();
        write!(
            f,
            "[{min_x:.2}, {min_y:.2}, {min_z:.2}] -> [{max_x:.2}, {max_y:.2}, {max_z:.2}]"
        )
    }
}

impl<V: Vector> Aabb<V> {
    #[must_use]
    pub const fn new(min: V, max: V) -> Self {
        Self { min, max }
    }

    /// The empty box: `min` at +inf and `max` at -inf, so any point expands it.
    #[must_use]
    pub fn null() -> Self {
        Self {
            min: V::splat(V::Scalar::infinity()),
            max: V::splat(V::Scalar::neg_infinity()),
        }
    }

    #[must_use]
    pub fn containing(points: &[V]) -> Self {
        points.iter().copied().collect()
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        let min = self.min.to_array();
        let max = self.max.to_array();
        min.iter().zip(max).any(|(lo, hi)| *lo > hi)
    }

    pub fn expand_to_point(&mut self, point: V) {
        self.min = self.min.component_min(point);
        self.max = self.max.component_max(point);
    }

    pub fn expand_to_fit(&mut self, other: &Self) {
        self.min = self.min.component_min(other.min);
        self.max = self.max.component_max(other.max);
    }

    #[must_use]
    pub fn contains_point(&self, point: V) -> bool {
        let point = point.to_array();
        let min = self.min.to_array();
        let max = self.max.to_array();
        (0..3).all(|i| min[i] <= point[i] && point[i] <= max[i])
    }

    #[must_use]
    pub fn mid(&self) -> V {
        (self.min + self.max).scale(half::<V>())
    }

    #[must_use]
    pub fn lens(&self) -> V {
        self.max - self.min
    }

    /// Half the surface area: the tightness measure the OBB builder minimizes.
    #[must_use]
    pub fn quality(&self) -> V::Scalar {
        quality::<V>(self.lens())
    }

    #[must_use]
    pub fn surface_area(&self) -> V::Scalar {
        let two = V::Scalar::one() + V::Scalar::one();
        two * self.quality()
    }

    #[must_use]
    pub fn volume(&self) -> V::Scalar {
        let [x, y, z] = self.lens().to_array();
        x * y * z
    }
}

/// `x*y + x*z + y*z` for the given edge lengths.
pub(crate) fn quality<V: Vector>(lens: V) -> V::Scalar {
    let [x, y, z] = lens.to_array();
    x.mul_add(y, x.mul_add(z, y * z))
}
