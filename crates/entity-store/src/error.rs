use thiserror::Error;

use crate::key::EntityKey;

/// A broken precondition of an entity store call. The store is left unchanged.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreError<K: EntityKey> {
    #[error("entity {0} is not in the store")]
    Missing(K),
    #[error("entity {0} is already in the store")]
    Occupied(K),
    #[error("no live entity in {low}..={high}")]
    RangeNotLive { low: K, high: K },
    #[error("range start {low} is past its end {high}")]
    InvertedRange { low: K, high: K },
    #[error("entity {key} shifted by {offset} does not fit the key type")]
    KeyOverflow { key: K, offset: K },
}
