//! Per-entity component storage keyed by unsigned entity handles.
//!
//! Two layouts share the [`EntityStore`] contract:
//!
//! - [`DenseSet`] keeps each value at `key - base` and leaves a hole on removal.
//! - [`SparseSet`] packs values into one gap-free array and looks them up through a position
//!   table, compacting on removal.
//!
//! [`AnyStore`] picks one at runtime from a [`StoreConfig`].
//!
//! ```
//! use entity_store::{EntityStore, Keyed, SparseSet};
//!
//! #[derive(Clone)]
//! struct Position {
//!     entity: u32,
//!     x: f32,
//! }
//!
//! impl Keyed for Position {
//!     type Key = u32;
//!
//!     fn key(&self) -> u32 {
//!         self.entity
//!     }
//! }
//!
//! let mut positions = SparseSet::new();
//! positions.insert(Position { entity: 5, x: 1.0 }).unwrap();
//! positions.insert(Position { entity: 6, x: 2.0 }).unwrap();
//! positions.remove_ranges([5..=5]).unwrap();
//!
//! assert_eq!(positions.len(), 1);
//! assert_eq!(positions[6].x, 2.0);
//! ```

mod any;
mod dense;
mod error;
mod key;
mod span;
mod sparse;
mod store;

pub use any::{AnyStore, StorageKind, StoreConfig};
pub use dense::DenseSet;
pub use error::StoreError;
pub use key::{EntityKey, Keyed};
pub use span::{KeySpan, SpanIter, SpanIterMut};
pub use sparse::{SparseIter, SparseIterMut, SparseRange, SparseSet};
pub use store::{EntityStore, StoreResult};
