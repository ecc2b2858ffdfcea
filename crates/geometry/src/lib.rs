//! Bounding volume geometry: axis-aligned boxes and tight oriented boxes for point clouds.
//!
//! ```
//! use geometry::obb::Obb;
//! use glam::Vec3;
//!
//! let points = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 0.0, 1.0)];
//! let obb = Obb::from_points(&points);
//! assert!(points.iter().all(|p| obb.contains_point(*p, 1e-4)));
//! ```

pub mod aabb;
pub mod dito;
pub mod obb;
pub mod vector;

pub use dito::build_obb;
pub use obb::Obb;
pub use vector::Vector;
