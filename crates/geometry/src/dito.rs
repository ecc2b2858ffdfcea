//! Tight oriented bounding boxes with the DiTO-14 algorithm.
//!
//! Larsson and Källberg, "Fast Computation of Tight-Fitting Oriented Bounding Boxes".
//!
//! The builder scans 7 fixed slab directions for extremal points, grows a large triangle and
//! two tetrahedra out of those points and evaluates the box orientations their edges and
//! normals suggest. The best orientation found is then fitted to the full input. Every input
//! produces a box; degenerate inputs fall back to axis or line aligned boxes.

use arrayvec::ArrayVec;
use num_traits::{Float, One};
use tracing::trace;

use crate::{
    aabb::{Aabb, quality},
    obb::Obb,
    vector::Vector,
};

const DIRECTIONS: usize = 7;

/// With more points than this only the extremal points take part in the axis search.
const CANDIDATE_LIMIT: usize = DIRECTIONS * 2;

/// The three coordinate axes followed by the four cube diagonals. The coordinate axes must come
/// first: their slabs double as the initial AABB.
fn slab_normals<V: Vector>() -> [V; DIRECTIONS] {
    let one = V::Scalar::one();
    [
        V::X,
        V::Y,
        V::Z,
        V::new(one, one, one),
        V::new(one, one, -one),
        V::new(one, -one, one),
        V::new(one, -one, -one),
    ]
}

/// Min and max projection of a point set along one direction.
#[derive(Copy, Clone, Debug)]
struct Slab<S> {
    min: S,
    max: S,
}

impl<S: Float> Slab<S> {
    fn len(self) -> S {
        self.max - self.min
    }
}

fn project<V: Vector>(direction: V, points: &[V]) -> Slab<V::Scalar> {
    let mut slab = Slab {
        min: V::Scalar::infinity(),
        max: V::Scalar::neg_infinity(),
    };

    for point in points {
        let proj = point.dot(direction);
        if proj < slab.min {
            slab.min = proj;
        }
        if proj > slab.max {
            slab.max = proj;
        }
    }

    slab
}

/// Extremal points of a non-empty point set along one direction. Ties keep the first point.
#[derive(Copy, Clone, Debug)]
struct Extremes<V: Vector> {
    slab: Slab<V::Scalar>,
    min_point: V,
    max_point: V,
}

fn extremes<V: Vector>(direction: V, first: V, rest: &[V]) -> Extremes<V> {
    let proj = first.dot(direction);
    let mut extremes = Extremes {
        slab: Slab {
            min: proj,
            max: proj,
        },
        min_point: first,
        max_point: first,
    };

    for &point in rest {
        let proj = point.dot(direction);
        if proj < extremes.slab.min {
            extremes.slab.min = proj;
            extremes.min_point = point;
        }
        if proj > extremes.slab.max {
            extremes.slab.max = proj;
            extremes.max_point = point;
        }
    }

    extremes
}

/// Running best orientation of the axis search.
#[derive(Copy, Clone, Debug)]
struct Best<V: Vector> {
    axes: [V; 3],
    quality: V::Scalar,
}

impl<V: Vector> Best<V> {
    /// Evaluates the box spanned by `edge`, `normal` and their cross product over `points`.
    ///
    /// `edge` and `normal` are unit vectors that are orthogonal up to rounding; the triple is
    /// re-orthonormalized before it is measured so a kept candidate is exactly what gets
    /// returned.
    fn consider(&mut self, points: &[V], edge: V, normal: V) {
        let Some(m) = edge.cross(normal).try_normalize() else {
            return;
        };
        let normal = m.cross(edge);

        let lens = V::new(
            project(edge, points).len(),
            project(normal, points).len(),
            project(m, points).len(),
        );

        let quality = quality::<V>(lens);
        if quality < self.quality {
            self.quality = quality;
            self.axes = [edge, normal, m];
        }
    }

    /// Tries the three orientations a triangle with unit normal `normal` and unit edge
    /// directions `edges` suggests.
    fn consider_triangle(&mut self, points: &[V], normal: V, edges: [V; 3]) {
        for edge in edges {
            self.consider(points, edge, normal);
        }
    }
}

/// Result of the search seeded by the base triangle.
enum Search<V: Vector> {
    /// Every extremal pair is within epsilon: the points coincide.
    Coincident,
    /// The candidates lie on the line through the base edge.
    Colinear(V),
    Found(Best<V>),
}

/// Squared distance from `point` to the infinite line through `origin` along unit `direction`.
fn distance_to_line_squared<V: Vector>(point: V, origin: V, direction: V) -> V::Scalar {
    let offset = point - origin;
    let along = offset.dot(direction);
    offset.length_squared() - along * along / direction.length_squared()
}

fn search_axes<V: Vector>(
    extremal: &[Extremes<V>; DIRECTIONS],
    candidates: &[V],
    initial: Best<V>,
) -> Search<V> {
    let mut furthest = &extremal[0];
    let mut furthest_dist = (extremal[0].max_point - extremal[0].min_point).length_squared();
    for pair in &extremal[1..] {
        let dist = (pair.max_point - pair.min_point).length_squared();
        if dist > furthest_dist {
            furthest_dist = dist;
            furthest = pair;
        }
    }

    if furthest_dist < V::EPSILON {
        return Search::Coincident;
    }

    let p0 = furthest.min_point;
    let p1 = furthest.max_point;
    let Some(e0) = (p0 - p1).try_normalize() else {
        return Search::Coincident;
    };

    let mut p2 = candidates[0];
    let mut p2_dist = distance_to_line_squared(p2, p0, e0);
    for &point in &candidates[1..] {
        let dist = distance_to_line_squared(point, p0, e0);
        if dist > p2_dist {
            p2_dist = dist;
            p2 = point;
        }
    }

    if p2_dist < V::EPSILON {
        return Search::Colinear(e0);
    }

    let (Some(e1), Some(e2)) = ((p1 - p2).try_normalize(), (p2 - p0).try_normalize()) else {
        return Search::Colinear(e0);
    };
    let Some(n) = e1.cross(e0).try_normalize() else {
        return Search::Colinear(e0);
    };

    let mut best = initial;
    best.consider_triangle(candidates, n, [e0, e1, e2]);

    // raise a tetrahedron on each side of the base triangle
    let plane = p0.dot(n);
    let Some((first, rest)) = candidates.split_first() else {
        return Search::Found(best);
    };
    let apexes = extremes(n, *first, rest);

    if apexes.slab.min < plane - V::EPSILON {
        consider_tetrahedron(&mut best, candidates, apexes.min_point, [p0, p1, p2], [e0, e1, e2]);
    }
    if apexes.slab.max > plane + V::EPSILON {
        consider_tetrahedron(&mut best, candidates, apexes.max_point, [p0, p1, p2], [e0, e1, e2]);
    }

    Search::Found(best)
}

/// Evaluates the three side triangles joining `apex` to the edges of the base triangle.
fn consider_tetrahedron<V: Vector>(
    best: &mut Best<V>,
    candidates: &[V],
    apex: V,
    [p0, p1, p2]: [V; 3],
    [e0, e1, e2]: [V; 3],
) {
    let (Some(f0), Some(f1), Some(f2)) = (
        (apex - p0).try_normalize(),
        (apex - p1).try_normalize(),
        (apex - p2).try_normalize(),
    ) else {
        return;
    };

    let sides = [(f1, e0, f0), (f2, e1, f1), (f0, e2, f2)];
    for (f, e, g) in sides {
        if let Some(normal) = f.cross(e).try_normalize() {
            best.consider_triangle(candidates, normal, [e, f, g]);
        }
    }
}

/// An orthonormal basis whose first axis is `direction`.
fn basis_from_direction<V: Vector>(direction: V) -> [V; 3] {
    let [x, y, z] = direction.abs().to_array();
    let seed = if x <= y && x <= z {
        V::X
    } else if y <= z {
        V::Y
    } else {
        V::Z
    };

    let u1 = (seed - direction.scale(seed.dot(direction)))
        .try_normalize()
        .unwrap_or(seed);
    let u2 = direction.cross(u1);

    [direction, u1, u2]
}

/// Fits a box on `axes` to all of `points`.
fn fit<V: Vector>(axes: [V; 3], points: &[V]) -> Obb<V> {
    let [a, b, c] = axes.map(|axis| project(axis, points));
    Obb::from_projections(
        axes,
        V::new(a.min, b.min, c.min),
        V::new(a.max, b.max, c.max),
    )
}

/// Keeps `obb` only if it is strictly tighter than the axis-aligned box.
fn prefer_tighter<V: Vector>(obb: Obb<V>, aabb: &Aabb<V>) -> Obb<V> {
    if obb.quality() < aabb.quality() {
        obb
    } else {
        trace!("oriented box is no tighter than the aabb, using the aabb");
        Obb::from_aabb(aabb)
    }
}

impl<V: Vector> Obb<V> {
    /// Computes a tight oriented bounding box around `points`.
    ///
    /// Never fails. An empty input gives [`Obb::empty`], coincident points give a zero sized
    /// axis-aligned box and colinear points give a box aligned to their line. The result is
    /// never looser than the axis-aligned bounding box of the same points.
    #[tracing::instrument(skip_all, fields(points = points.len()))]
    pub fn from_points(points: &[V]) -> Self {
        let Some((&first, rest)) = points.split_first() else {
            trace!("no points, using the empty box");
            return Self::empty();
        };

        let extremal = slab_normals::<V>().map(|normal| extremes(normal, first, rest));

        let aabb = Aabb::new(
            V::new(extremal[0].slab.min, extremal[1].slab.min, extremal[2].slab.min),
            V::new(extremal[0].slab.max, extremal[1].slab.max, extremal[2].slab.max),
        );

        let selected: ArrayVec<V, CANDIDATE_LIMIT> = extremal
            .iter()
            .map(|pair| pair.min_point)
            .chain(extremal.iter().map(|pair| pair.max_point))
            .collect();

        let candidates = if points.len() > CANDIDATE_LIMIT {
            selected.as_slice()
        } else {
            points
        };

        let initial = Best {
            axes: [V::X, V::Y, V::Z],
            quality: aabb.quality(),
        };

        match search_axes(&extremal, candidates, initial) {
            Search::Coincident => {
                trace!("points coincide, using the aabb");
                Self::from_aabb(&aabb)
            }
            Search::Colinear(direction) => {
                trace!("points are colinear, aligning to their line");
                let obb = fit(basis_from_direction(direction), points);
                if aabb.quality() < obb.quality() {
                    Self::from_aabb(&aabb)
                } else {
                    obb
                }
            }
            Search::Found(best) => prefer_tighter(fit(best.axes, points), &aabb),
        }
    }
}

/// Free function form of [`Obb::from_points`].
pub fn build_obb<V: Vector>(points: &[V]) -> Obb<V> {
    Obb::from_points(points)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{DVec3, Vec3};

    use super::{basis_from_direction, distance_to_line_squared};
    use crate::{aabb::Aabb, dito::build_obb, obb::Obb};

    fn assert_orthonormal(axes: [Vec3; 3]) {
        for (i, a) in axes.iter().enumerate() {
            assert_relative_eq!(a.length(), 1.0, epsilon = 1e-5);
            for b in &axes[i + 1..] {
                assert_relative_eq!(a.dot(*b), 0.0, epsilon = 1e-5);
            }
        }
    }

    fn assert_contains(obb: &Obb, points: &[Vec3]) {
        for point in points {
            assert!(obb.contains_point(*point, 1e-4), "{point} outside {obb:?}");
        }
    }

    #[test]
    fn empty_input_gives_identity_box() {
        let obb = Obb::<Vec3>::from_points(&[]);

        assert_eq!(obb.center, Vec3::ZERO);
        assert_eq!(obb.half_extents, Vec3::ZERO);
        assert_eq!(obb.axes, [Vec3::X, Vec3::Y, Vec3::Z]);
    }

    #[test]
    fn single_point_gives_zero_sized_box() {
        let point = Vec3::new(3.0, -2.0, 7.5);
        let obb = Obb::from_points(&[point]);

        assert_eq!(obb.center, point);
        assert_eq!(obb.half_extents, Vec3::ZERO);
        assert_eq!(obb.axes, [Vec3::X, Vec3::Y, Vec3::Z]);
    }

    #[test]
    fn coincident_points_give_zero_sized_box() {
        let points = vec![Vec3::new(1.0, 1.0, 1.0); 40];
        let obb = Obb::from_points(&points);

        assert_eq!(obb.center, Vec3::ONE);
        assert_eq!(obb.half_extents, Vec3::ZERO);
    }

    #[test]
    fn octahedron_is_enclosed_no_looser_than_aabb() {
        let points = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
        ];

        let obb = Obb::from_points(&points);

        assert_orthonormal(obb.axes);
        assert_contains(&obb, &points);
        assert!(obb.quality() <= 12.0 + 1e-4);
        assert!(obb.volume() <= 8.0 + 1e-4);
    }

    #[test]
    fn diagonal_line_is_line_aligned() {
        let direction = Vec3::new(1.0, 2.0, 3.0).normalize();
        let points: Vec<Vec3> = (0..30).map(|i| direction * i as f32).collect();

        let obb = Obb::from_points(&points);

        assert_orthonormal(obb.axes);
        assert_contains(&obb, &points);
        assert_relative_eq!(obb.axes[0].dot(direction).abs(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(obb.half_extents.x, 14.5, epsilon = 1e-3);
        assert!(obb.half_extents.y < 1e-3);
        assert!(obb.half_extents.z < 1e-3);
    }

    #[test]
    fn rotated_box_corners_recover_rotation() {
        // a 4 x 2 x 1 box turned 30 degrees about z
        let (sin, cos) = 30f32.to_radians().sin_cos();
        let x = Vec3::new(cos, sin, 0.0) * 2.0;
        let y = Vec3::new(-sin, cos, 0.0);
        let z = Vec3::Z * 0.5;

        let mut points = Vec::new();
        for sx in [-1.0, 1.0] {
            for sy in [-1.0, 1.0] {
                for sz in [-1.0, 1.0] {
                    points.push(x * sx + y * sy + z * sz);
                }
            }
        }

        let obb = Obb::from_points(&points);
        let aabb = Aabb::containing(&points);

        assert_orthonormal(obb.axes);
        assert_contains(&obb, &points);
        assert!(obb.quality() < aabb.quality());
        assert_relative_eq!(obb.volume(), 8.0, epsilon = 1e-3);
    }

    #[test]
    fn double_precision_matches_structure() {
        let points = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(4.0, 1.0, 0.0),
            DVec3::new(1.0, 3.0, 0.5),
            DVec3::new(2.0, 2.0, 2.0),
            DVec3::new(-1.0, 0.5, 1.0),
        ];

        let obb = build_obb(&points);

        for point in points {
            assert!(obb.contains_point(point, 1e-9));
        }
        assert!(obb.quality() <= Aabb::containing(&points).quality());
    }

    #[test]
    fn basis_from_direction_is_orthonormal() {
        for direction in [Vec3::X, Vec3::Y, Vec3::Z, Vec3::new(1.0, -2.0, 0.5).normalize()] {
            let axes = basis_from_direction(direction);
            assert_eq!(axes[0], direction);
            assert_orthonormal(axes);
        }
    }

    #[test]
    fn line_distance_ignores_position_along_line() {
        let origin = Vec3::new(1.0, 1.0, 0.0);
        let dist = distance_to_line_squared(Vec3::new(5.0, 3.0, 0.0), origin, Vec3::X);
        assert_relative_eq!(dist, 4.0);
    }
}
