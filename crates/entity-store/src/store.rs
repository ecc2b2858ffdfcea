use std::ops::RangeInclusive;

use crate::{
    error::StoreError,
    key::{EntityKey, Keyed},
};

pub type StoreResult<T, K> = Result<T, StoreError<K>>;

/// The contract shared by [`DenseSet`](crate::DenseSet), [`SparseSet`](crate::SparseSet) and
/// [`AnyStore`](crate::AnyStore): at most one value per entity key, O(1) lookup, batch
/// insertion with a key offset and batch removal of inclusive key ranges.
///
/// Calls that break a precondition return a [`StoreError`] and leave the store untouched.
pub trait EntityStore<T: Keyed> {
    type Iter<'a>: Iterator<Item = (T::Key, &'a T)>
    where
        Self: 'a,
        T: 'a;

    type IterMut<'a>: Iterator<Item = (T::Key, &'a mut T)>
    where
        Self: 'a,
        T: 'a;

    type Range<'a>: Iterator<Item = (T::Key, &'a T)>
    where
        Self: 'a,
        T: 'a;

    /// Number of live entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, key: T::Key) -> bool;

    fn get(&self, key: T::Key) -> StoreResult<&T, T::Key>;

    fn get_mut(&mut self, key: T::Key) -> StoreResult<&mut T, T::Key>;

    /// Stores `value` under `key`, whatever key the value itself names.
    fn insert_at(&mut self, key: T::Key, value: T) -> StoreResult<(), T::Key>;

    /// Makes room for the keys in `keys` and for `additional` more entries in one step.
    fn reserve_keys(&mut self, keys: RangeInclusive<T::Key>, additional: usize);

    /// Removes every live entry whose key falls in one of `ranges`.
    ///
    /// Keys inside a range that hold nothing are skipped, but each range must hold at least one
    /// live entry that no earlier range in the same batch already covers: removing a range twice,
    /// in one call or across calls, is an error.
    fn remove_ranges<R>(&mut self, ranges: R) -> StoreResult<(), T::Key>
    where
        R: IntoIterator<Item = RangeInclusive<T::Key>>;

    /// Returns the store to its freshly constructed state.
    fn clear(&mut self);

    /// Live entries. Empty slots are never yielded.
    fn iter(&self) -> Self::Iter<'_>;

    fn iter_mut(&mut self) -> Self::IterMut<'_>;

    /// Live entries with keys in `keys`, in key order.
    fn range(&self, keys: RangeInclusive<T::Key>) -> Self::Range<'_>;

    /// Lowest and highest key the store can address without growing.
    fn span(&self) -> Option<RangeInclusive<T::Key>>;

    fn insert(&mut self, value: T) -> StoreResult<(), T::Key> {
        self.insert_at(value.key(), value)
    }

    /// Stores `value` under its own key shifted by `offset`.
    fn insert_with_offset(&mut self, value: T, offset: T::Key) -> StoreResult<(), T::Key> {
        let key = value.key();
        let shifted = key
            .checked_offset(offset)
            .ok_or(StoreError::KeyOverflow { key, offset })?;
        self.insert_at(shifted, value)
    }

    /// Inserts values one at a time, stopping at the first error.
    fn try_extend<I>(&mut self, values: I) -> StoreResult<(), T::Key>
    where
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.insert(value)?;
        }
        Ok(())
    }

    /// Copies every live entry of `other` into this store with its key shifted by `offset`.
    fn extend_from_store<'a>(&mut self, other: &'a Self, offset: T::Key) -> StoreResult<(), T::Key>
    where
        Self: 'a,
        T: Clone + 'a,
    {
        self.extend_from_stores([(other, offset)])
    }

    /// Copies the live entries of several stores at once, each shifted by its own offset.
    ///
    /// The combined key range is reserved once before any value is copied. Nothing is inserted
    /// if any shifted key collides with a live key or with another incoming key.
    fn extend_from_stores<'a, I>(&mut self, stores: I) -> StoreResult<(), T::Key>
    where
        I: IntoIterator<Item = (&'a Self, T::Key)>,
        Self: 'a,
        T: Clone + 'a,
    {
        let mut incoming = Vec::new();
        for (store, offset) in stores {
            for (key, value) in store.iter() {
                let shifted = key
                    .checked_offset(offset)
                    .ok_or(StoreError::KeyOverflow { key, offset })?;
                if self.contains(shifted) {
                    return Err(StoreError::Occupied(shifted));
                }
                incoming.push((shifted, value));
            }
        }

        incoming.sort_unstable_by_key(|(key, _)| *key);
        if let Some(pair) = incoming.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(StoreError::Occupied(pair[0].0));
        }

        let (Some(&(low, _)), Some(&(high, _))) = (incoming.first(), incoming.last()) else {
            return Ok(());
        };
        self.reserve_keys(low..=high, incoming.len());

        for (key, value) in incoming {
            self.insert_at(key, value.clone())?;
        }

        Ok(())
    }
}

/// Checks a batch of removal ranges for inverted bounds and flattens them to pairs.
pub(crate) fn validate_ranges<K, R>(ranges: R) -> StoreResult<Vec<(K, K)>, K>
where
    K: EntityKey,
    R: IntoIterator<Item = RangeInclusive<K>>,
{
    ranges
        .into_iter()
        .map(|range| {
            let (low, high) = range.into_inner();
            if low > high {
                Err(StoreError::InvertedRange { low, high })
            } else {
                Ok((low, high))
            }
        })
        .collect()
}
