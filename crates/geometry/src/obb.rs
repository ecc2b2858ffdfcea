use glam::Vec3;
use num_traits::{Float, One};
use serde::{Deserialize, Serialize};

use crate::{
    aabb::{Aabb, quality},
    vector::{Vector, half},
};

/// An oriented bounding box.
///
/// `axes` are unit length and mutually orthogonal; `half_extents[i]` is the distance from
/// `center` to the box face along `axes[i]` and is never negative.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obb<V = Vec3> {
    pub center: V,
    pub axes: [V; 3],
    pub half_extents: V,
}

impl<V: Vector> Default for Obb<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V: Vector> From<Aabb<V>> for Obb<V> {
    fn from(aabb: Aabb<V>) -> Self {
        Self::from_aabb(&aabb)
    }
}

impl<V: Vector> Obb<V> {
    /// Zero sized box at the origin aligned to the standard basis.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            center: V::ZERO,
            axes: [V::X, V::Y, V::Z],
            half_extents: V::ZERO,
        }
    }

    #[must_use]
    pub fn from_aabb(aabb: &Aabb<V>) -> Self {
        Self {
            center: aabb.mid(),
            axes: [V::X, V::Y, V::Z],
            half_extents: aabb.lens().scale(half::<V>()),
        }
    }

    /// Builds the box on `axes` from per-axis projection bounds.
    pub(crate) fn from_projections(axes: [V; 3], min: V, max: V) -> Self {
        let mid = (min + max).scale(half::<V>()).to_array();
        let center = axes[0].scale(mid[0]) + axes[1].scale(mid[1]) + axes[2].scale(mid[2]);

        Self {
            center,
            axes,
            half_extents: (max - min).scale(half::<V>()),
        }
    }

    /// Full edge lengths along each axis.
    #[must_use]
    pub fn lens(&self) -> V {
        let two = V::Scalar::one() + V::Scalar::one();
        self.half_extents.scale(two)
    }

    /// Half the surface area, the measure the builder compares candidate boxes by.
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

    /// Coordinates of `point` in the box frame, relative to the center.
    #[must_use]
    pub fn local_coordinates(&self, point: V) -> V {
        let offset = point - self.center;
        V::new(
            offset.dot(self.axes[0]),
            offset.dot(self.axes[1]),
            offset.dot(self.axes[2]),
        )
    }

    /// Whether `point` lies inside the box grown by `tolerance` on every side.
    #[must_use]
    pub fn contains_point(&self, point: V, tolerance: V::Scalar) -> bool {
        let local = self.local_coordinates(point).to_array();
        let half_extents = self.half_extents.to_array();
        local
            .iter()
            .zip(half_extents)
            .all(|(coord, extent)| coord.abs() <= extent + tolerance)
    }

    #[must_use]
    pub fn corners(&self) -> [V; 8] {
        let [hx, hy, hz] = self.half_extents.to_array();
        let x = self.axes[0].scale(hx);
        let y = self.axes[1].scale(hy);
        let z = self.axes[2].scale(hz);

        let c = self.center;
        [
            c - x - y - z,
            c + x - y - z,
            c - x + y - z,
            c + x + y - z,
            c - x - y + z,
            c + x - y + z,
            c - x + y + z,
            c + x + y + z,
        ]
    }

    /// The smallest axis-aligned box containing this one.
    #[must_use]
    pub fn aabb(&self) -> Aabb<V> {
        let [hx, hy, hz] = self.half_extents.to_array();
        let extent =
            self.axes[0].scale(hx).abs() + self.axes[1].scale(hy).abs() + self.axes[2].scale(hz).abs();

        Aabb::new(self.center - extent, self.center + extent)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_1_SQRT_2;

    use approx::assert_relative_eq;
    use glam::Vec3;

    use crate::{aabb::Aabb, obb::Obb};

    fn rotated_square() -> Obb {
        // unit square in the xy plane turned 45 degrees about z
        Obb {
            center: Vec3::new(1.0, 0.0, 0.0),
            axes: [
                Vec3::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0),
                Vec3::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0),
                Vec3::Z,
            ],
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        }
    }

    #[test]
    fn empty_is_identity_at_origin() {
        let obb = Obb::<Vec3>::empty();

        assert_eq!(obb.center, Vec3::ZERO);
        assert_eq!(obb.axes, [Vec3::X, Vec3::Y, Vec3::Z]);
        assert_eq!(obb.half_extents, Vec3::ZERO);
        assert_eq!(obb, Obb::default());
    }

    #[test]
    fn from_aabb_keeps_extents() {
        let aabb = Aabb::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 2.0, 4.0));
        let obb = Obb::from(aabb);

        assert_eq!(obb.center, Vec3::new(1.0, 1.0, 3.0));
        assert_eq!(obb.half_extents, Vec3::new(2.0, 1.0, 1.0));
        assert_relative_eq!(obb.quality(), aabb.quality());
        assert_relative_eq!(obb.volume(), aabb.volume());
    }

    #[test]
    fn contains_point_uses_box_frame() {
        let obb = rotated_square();

        assert!(obb.contains_point(Vec3::new(1.0, 0.0, 0.0), 0.0));
        // on the rotated x axis, just inside the face
        assert!(obb.contains_point(Vec3::new(1.0 + 0.35, 0.35, 0.0), 0.0));
        // inside the enclosing aabb but outside the rotated box
        assert!(obb.aabb().contains_point(Vec3::new(1.5, 0.5, 0.0)));
        assert!(!obb.contains_point(Vec3::new(1.5, 0.5, 0.0), 0.0));
    }

    #[test]
    fn corners_lie_on_box_boundary() {
        let obb = rotated_square();

        for corner in obb.corners() {
            let local = obb.local_coordinates(corner);
            assert!(local.abs().abs_diff_eq(Vec3::splat(0.5), 1e-6), "{local}");
        }
    }

    #[test]
    fn aabb_encloses_corners() {
        let obb = rotated_square();
        let aabb = obb.aabb();

        let grown = Aabb::new(aabb.min - Vec3::splat(1e-5), aabb.max + Vec3::splat(1e-5));
        assert!(obb.corners().iter().all(|corner| grown.contains_point(*corner)));
        assert_relative_eq!(aabb.lens().x, 2.0 * FRAC_1_SQRT_2, epsilon = 1e-6);
    }
}
