use std::ops::{Index, RangeInclusive};

use itertools::Either;
use serde::{Deserialize, Serialize};

use crate::{
    dense::DenseSet,
    key::Keyed,
    span::{SpanIter, SpanIterMut},
    sparse::{SparseIter, SparseIterMut, SparseRange, SparseSet},
    store::{EntityStore, StoreResult},
};

/// Which layout an [`AnyStore`] uses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Values in place at `key - base`. Best when most keys in the span are live.
    #[default]
    Dense,
    /// Values packed together behind a position table. Best when iteration dominates and the
    /// live keys are scattered.
    Sparse,
}

/// How to build a store, typically read from a config file:
///
/// ```toml
/// kind = "sparse"
/// capacity = 1024
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StorageKind,
    /// Entries to allocate up front.
    pub capacity: usize,
}

/// A store whose layout is picked at runtime.
#[derive(Clone, Debug)]
pub enum AnyStore<T: Keyed> {
    Dense(DenseSet<T>),
    Sparse(SparseSet<T>),
}

impl<T: Keyed> Default for AnyStore<T> {
    fn default() -> Self {
        Self::with_config(StoreConfig::default())
    }
}

impl<T: Keyed> From<DenseSet<T>> for AnyStore<T> {
    fn from(store: DenseSet<T>) -> Self {
        Self::Dense(store)
    }
}

impl<T: Keyed> From<SparseSet<T>> for AnyStore<T> {
    fn from(store: SparseSet<T>) -> Self {
        Self::Sparse(store)
    }
}

impl<T: Keyed> AnyStore<T> {
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        match config.kind {
            StorageKind::Dense => Self::Dense(DenseSet::with_capacity(config.capacity)),
            StorageKind::Sparse => Self::Sparse(SparseSet::with_capacity(config.capacity)),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> StorageKind {
        match self {
            Self::Dense(_) => StorageKind::Dense,
            Self::Sparse(_) => StorageKind::Sparse,
        }
    }
}

impl<T: Keyed> EntityStore<T> for AnyStore<T> {
    type Iter<'a>
        = Either<SpanIter<'a, T::Key, T>, SparseIter<'a, T>>
    where
        T: 'a;
    type IterMut<'a>
        = Either<SpanIterMut<'a, T::Key, T>, SparseIterMut<'a, T>>
    where
        T: 'a;
    type Range<'a>
        = Either<SpanIter<'a, T::Key, T>, SparseRange<'a, T>>
    where
        T: 'a;

    fn len(&self) -> usize {
        match self {
            Self::Dense(store) => store.len(),
            Self::Sparse(store) => store.len(),
        }
    }

    fn contains(&self, key: T::Key) -> bool {
        match self {
            Self::Dense(store) => store.contains(key),
            Self::Sparse(store) => store.contains(key),
        }
    }

    fn get(&self, key: T::Key) -> StoreResult<&T, T::Key> {
        match self {
            Self::Dense(store) => store.get(key),
            Self::Sparse(store) => store.get(key),
        }
    }

    fn get_mut(&mut self, key: T::Key) -> StoreResult<&mut T, T::Key> {
        match self {
            Self::Dense(store) => store.get_mut(key),
            Self::Sparse(store) => store.get_mut(key),
        }
    }

    fn insert_at(&mut self, key: T::Key, value: T) -> StoreResult<(), T::Key> {
        match self {
            Self::Dense(store) => store.insert_at(key, value),
            Self::Sparse(store) => store.insert_at(key, value),
        }
    }

    fn reserve_keys(&mut self, keys: RangeInclusive<T::Key>, additional: usize) {
        match self {
            Self::Dense(store) => store.reserve_keys(keys, additional),
            Self::Sparse(store) => store.reserve_keys(keys, additional),
        }
    }

    fn remove_ranges<R>(&mut self, ranges: R) -> StoreResult<(), T::Key>
    where
        R: IntoIterator<Item = RangeInclusive<T::Key>>,
    {
        match self {
            Self::Dense(store) => store.remove_ranges(ranges),
            Self::Sparse(store) => store.remove_ranges(ranges),
        }
    }

    fn clear(&mut self) {
        match self {
            Self::Dense(store) => store.clear(),
            Self::Sparse(store) => store.clear(),
        }
    }

    fn iter(&self) -> Self::Iter<'_> {
        match self {
            Self::Dense(store) => Either::Left(store.iter()),
            Self::Sparse(store) => Either::Right(store.iter()),
        }
    }

    fn iter_mut(&mut self) -> Self::IterMut<'_> {
        match self {
            Self::Dense(store) => Either::Left(store.iter_mut()),
            Self::Sparse(store) => Either::Right(store.iter_mut()),
        }
    }

    fn range(&self, keys: RangeInclusive<T::Key>) -> Self::Range<'_> {
        match self {
            Self::Dense(store) => Either::Left(store.range(keys)),
            Self::Sparse(store) => Either::Right(store.range(keys)),
        }
    }

    fn span(&self) -> Option<RangeInclusive<T::Key>> {
        match self {
            Self::Dense(store) => store.span(),
            Self::Sparse(store) => store.span(),
        }
    }
}

impl<T: Keyed> Index<T::Key> for AnyStore<T> {
    type Output = T;

    fn index(&self, key: T::Key) -> &Self::Output {
        match self {
            Self::Dense(store) => &store[key],
            Self::Sparse(store) => &store[key],
        }
    }
}
