use std::{
    iter::{Copied, FusedIterator, Zip},
    ops::{Index, RangeInclusive},
    slice,
};

use tracing::trace;

use crate::{
    error::StoreError,
    key::Keyed,
    span::{KeySpan, SpanIter},
    store::{EntityStore, StoreResult, validate_ranges},
};

/// Values packed into one gap-free array, found through a sparse table of positions.
///
/// `sparse` maps `key - base` to a position in `dense`; `keys[i]` is the key of `dense[i]`.
/// Removal compacts `dense` and repoints the table for every value that moved, so iteration
/// never meets a hole. Removal costs O(len) in exchange.
#[derive(Clone, Debug)]
pub struct SparseSet<T: Keyed> {
    sparse: KeySpan<T::Key, usize>,
    dense: Vec<T>,
    keys: Vec<T::Key>,
}

impl<T: Keyed> Default for SparseSet<T> {
    fn default() -> Self {
        Self {
            sparse: KeySpan::default(),
            dense: Vec::new(),
            keys: Vec::new(),
        }
    }
}

impl<T: Keyed> SparseSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: KeySpan::default(),
            dense: Vec::with_capacity(capacity),
            keys: Vec::with_capacity(capacity),
        }
    }

    /// The packed values, in storage order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.dense
    }

    /// Keys of [`Self::as_slice`], position for position.
    #[must_use]
    pub fn keys(&self) -> &[T::Key] {
        &self.keys
    }

    /// Where `key` currently sits in [`Self::as_slice`].
    #[must_use]
    pub fn position(&self, key: T::Key) -> Option<usize> {
        self.sparse.get(key).copied()
    }

    /// Marks the dense positions of the live keys in each range. Every range must mark at least
    /// one position that no earlier range marked.
    fn mark(&self, ranges: &[(T::Key, T::Key)]) -> StoreResult<Vec<bool>, T::Key> {
        let mut doomed = vec![false; self.dense.len()];

        for &(low, high) in ranges {
            let mut found = false;
            for (_, &position) in self.sparse.range(low, high) {
                found |= !doomed[position];
                doomed[position] = true;
            }
            if !found {
                return Err(StoreError::RangeNotLive { low, high });
            }
        }

        Ok(doomed)
    }
}

/// Entries of a [`SparseSet`] in storage order.
pub type SparseIter<'a, T> = Zip<Copied<slice::Iter<'a, <T as Keyed>::Key>>, slice::Iter<'a, T>>;

pub type SparseIterMut<'a, T> =
    Zip<Copied<slice::Iter<'a, <T as Keyed>::Key>>, slice::IterMut<'a, T>>;

impl<T: Keyed> EntityStore<T> for SparseSet<T> {
    type Iter<'a>
        = SparseIter<'a, T>
    where
        T: 'a;
    type IterMut<'a>
        = SparseIterMut<'a, T>
    where
        T: 'a;
    type Range<'a>
        = SparseRange<'a, T>
    where
        T: 'a;

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn contains(&self, key: T::Key) -> bool {
        self.sparse.get(key).is_some()
    }

    fn get(&self, key: T::Key) -> StoreResult<&T, T::Key> {
        let position = self.position(key).ok_or(StoreError::Missing(key))?;
        Ok(&self.dense[position])
    }

    fn get_mut(&mut self, key: T::Key) -> StoreResult<&mut T, T::Key> {
        let position = self.position(key).ok_or(StoreError::Missing(key))?;
        Ok(&mut self.dense[position])
    }

    fn insert_at(&mut self, key: T::Key, value: T) -> StoreResult<(), T::Key> {
        if self.contains(key) {
            return Err(StoreError::Occupied(key));
        }

        self.sparse.cover(key, key);
        if let Some(slot) = self.sparse.slot_mut(key) {
            *slot = Some(self.dense.len());
            self.dense.push(value);
            self.keys.push(key);
        }

        Ok(())
    }

    fn reserve_keys(&mut self, keys: RangeInclusive<T::Key>, additional: usize) {
        let (low, high) = keys.into_inner();
        self.sparse.cover(low, high);
        self.dense.reserve(additional);
        self.keys.reserve(additional);
    }

    fn remove_ranges<R>(&mut self, ranges: R) -> StoreResult<(), T::Key>
    where
        R: IntoIterator<Item = RangeInclusive<T::Key>>,
    {
        let ranges = validate_ranges(ranges)?;
        let doomed = self.mark(&ranges)?;

        let Some(first) = doomed.iter().position(|&doomed| doomed) else {
            return Ok(());
        };

        for (&key, _) in self.keys.iter().zip(&doomed).filter(|(_, doomed)| **doomed) {
            if let Some(slot) = self.sparse.slot_mut(key) {
                *slot = None;
            }
        }

        // stable partition: survivors keep their relative order
        let mut flags = doomed.iter();
        self.dense.retain(|_| flags.next() == Some(&false));
        let mut flags = doomed.iter();
        self.keys.retain(|_| flags.next() == Some(&false));

        for (position, &key) in self.keys.iter().enumerate().skip(first) {
            if let Some(slot) = self.sparse.slot_mut(key) {
                *slot = Some(position);
            }
        }

        trace!(
            removed = doomed.len() - self.dense.len(),
            remaining = self.dense.len(),
            "compacted sparse entries"
        );

        Ok(())
    }

    fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.keys.clear();
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.keys.iter().copied().zip(self.dense.iter())
    }

    fn iter_mut(&mut self) -> Self::IterMut<'_> {
        self.keys.iter().copied().zip(self.dense.iter_mut())
    }

    fn range(&self, keys: RangeInclusive<T::Key>) -> Self::Range<'_> {
        let (low, high) = keys.into_inner();
        SparseRange {
            positions: self.sparse.range(low, high),
            dense: &self.dense,
        }
    }

    fn span(&self) -> Option<RangeInclusive<T::Key>> {
        let (low, high) = self.sparse.bounds()?;
        Some(low..=high)
    }
}

/// Live entries of a key range of a [`SparseSet`], in key order.
#[must_use]
pub struct SparseRange<'a, T: Keyed> {
    positions: SpanIter<'a, T::Key, usize>,
    dense: &'a [T],
}

impl<'a, T: Keyed> Iterator for SparseRange<'a, T> {
    type Item = (T::Key, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let (key, &position) = self.positions.next()?;
        Some((key, &self.dense[position]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.positions.size_hint()
    }
}

impl<T: Keyed> FusedIterator for SparseRange<'_, T> {}

impl<T: Keyed> Index<T::Key> for SparseSet<T> {
    type Output = T;

    fn index(&self, key: T::Key) -> &Self::Output {
        self.get(key).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl<'a, T: Keyed> IntoIterator for &'a SparseSet<T> {
    type IntoIter = SparseIter<'a, T>;
    type Item = (T::Key, &'a T);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::SparseSet;
    use crate::{error::StoreError, key::Keyed, store::EntityStore};

    #[derive(Clone, Debug, PartialEq)]
    struct Name {
        entity: u64,
        name: String,
    }

    impl Keyed for Name {
        type Key = u64;

        fn key(&self) -> u64 {
            self.entity
        }
    }

    fn name(entity: u64) -> Name {
        Name {
            entity,
            name: format!("entity-{entity}"),
        }
    }

    fn assert_compact(set: &SparseSet<Name>) {
        assert_eq!(set.as_slice().len(), set.len());
        assert_eq!(set.keys().len(), set.len());
        for (position, key) in set.keys().iter().enumerate() {
            assert_eq!(set.position(*key), Some(position));
            assert_eq!(set.as_slice()[position].entity, *key);
        }
    }

    #[test]
    fn removal_compacts_and_keeps_order() {
        let mut set = SparseSet::new();
        set.try_extend((0..10).map(name)).unwrap();

        set.remove_ranges([2..=3, 7..=7]).unwrap();

        assert_eq!(set.len(), 7);
        assert_eq!(set.keys(), &[0, 1, 4, 5, 6, 8, 9]);
        assert_compact(&set);
        assert_eq!(set.get(3), Err(StoreError::Missing(3)));
        assert_eq!(set[8], name(8));
    }

    #[test]
    fn ranges_may_span_absent_keys() {
        let mut set = SparseSet::new();
        set.try_extend([1, 5, 9].map(name)).unwrap();

        set.remove_ranges([0..=6]).unwrap();

        assert_eq!(set.keys(), &[9]);
        assert_compact(&set);
        assert_eq!(
            set.remove_ranges([0..=6]),
            Err(StoreError::RangeNotLive { low: 0, high: 6 })
        );
    }

    #[test]
    fn overlapping_ranges_in_one_batch() {
        let mut set = SparseSet::new();
        set.try_extend((0..6).map(name)).unwrap();

        set.remove_ranges([1..=3, 2..=4]).unwrap();

        assert_eq!(set.keys(), &[0, 5]);
        assert_compact(&set);
    }

    #[test]
    fn repeated_range_in_one_batch_is_rejected() {
        let mut set = SparseSet::new();
        set.try_extend([5, 6, 7].map(name)).unwrap();

        assert_eq!(
            set.remove_ranges([6..=6, 6..=6]),
            Err(StoreError::RangeNotLive { low: 6, high: 6 })
        );
        assert_eq!(set.keys(), &[5, 6, 7]);
        assert_compact(&set);
    }

    #[test]
    fn range_reads_through_sparse_table() {
        let mut set = SparseSet::new();
        // inserted out of key order, so dense order differs from key order
        set.try_extend([7, 3, 5, 1].map(name)).unwrap();

        let keys: Vec<u64> = set.range(2..=7).map(|(key, _)| key).collect();
        assert_eq!(keys, vec![3, 5, 7]);

        let iterated: Vec<u64> = set.iter().map(|(key, _)| key).collect();
        assert_eq!(iterated, vec![7, 3, 5, 1]);
    }

    #[test]
    fn removing_everything_leaves_empty_set() {
        let mut set = SparseSet::new();
        set.try_extend((20..25).map(name)).unwrap();

        set.remove_ranges([20..=24]).unwrap();

        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
        // the sparse table keeps its span until cleared
        assert_eq!(set.span(), Some(20..=24));
        set.clear();
        assert_eq!(set.span(), None);
    }
}
