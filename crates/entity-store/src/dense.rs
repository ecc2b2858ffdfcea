use std::ops::{Index, Range, RangeInclusive};

use tracing::trace;

use crate::{
    error::StoreError,
    key::Keyed,
    span::{KeySpan, SpanIter, SpanIterMut},
    store::{EntityStore, StoreResult, validate_ranges},
};

/// Values stored in place at `key - base`.
///
/// Removal leaves an empty slot behind rather than compacting, so lookups stay a single offset
/// computation and keys never move. Iteration walks the whole span and skips empty slots, which
/// makes this the better fit when most keys in the span are live.
#[derive(Clone, Debug)]
pub struct DenseSet<T: Keyed> {
    span: KeySpan<T::Key, T>,
    len: usize,
}

impl<T: Keyed> Default for DenseSet<T> {
    fn default() -> Self {
        Self {
            span: KeySpan::default(),
            len: 0,
        }
    }
}

impl<T: Keyed> DenseSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocates room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            span: KeySpan::with_capacity(capacity),
            len: 0,
        }
    }

    /// Number of slots between the lowest and highest key ever covered, live or not.
    #[must_use]
    pub fn extent(&self) -> usize {
        self.span.extent()
    }
}

impl<T: Keyed> EntityStore<T> for DenseSet<T> {
    type Iter<'a>
        = SpanIter<'a, T::Key, T>
    where
        T: 'a;
    type IterMut<'a>
        = SpanIterMut<'a, T::Key, T>
    where
        T: 'a;
    type Range<'a>
        = SpanIter<'a, T::Key, T>
    where
        T: 'a;

    fn len(&self) -> usize {
        self.len
    }

    fn contains(&self, key: T::Key) -> bool {
        self.span.get(key).is_some()
    }

    fn get(&self, key: T::Key) -> StoreResult<&T, T::Key> {
        self.span.get(key).ok_or(StoreError::Missing(key))
    }

    fn get_mut(&mut self, key: T::Key) -> StoreResult<&mut T, T::Key> {
        self.span.get_mut(key).ok_or(StoreError::Missing(key))
    }

    fn insert_at(&mut self, key: T::Key, value: T) -> StoreResult<(), T::Key> {
        if self.contains(key) {
            return Err(StoreError::Occupied(key));
        }

        self.span.cover(key, key);
        if let Some(slot) = self.span.slot_mut(key) {
            *slot = Some(value);
            self.len += 1;
        }

        Ok(())
    }

    fn reserve_keys(&mut self, keys: RangeInclusive<T::Key>, _additional: usize) {
        let (low, high) = keys.into_inner();
        self.span.cover(low, high);
    }

    fn remove_ranges<R>(&mut self, ranges: R) -> StoreResult<(), T::Key>
    where
        R: IntoIterator<Item = RangeInclusive<T::Key>>,
    {
        let ranges = validate_ranges(ranges)?;

        let mut clipped: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
        for (low, high) in ranges {
            // a range only counts if it holds a live slot no earlier range in the batch claimed
            let live = self
                .span
                .clip(low, high)
                .filter(|slots| {
                    let start = slots.start;
                    self.span.slots(slots.clone()).iter().enumerate().any(|(offset, slot)| {
                        let index = start + offset;
                        slot.is_some() && !clipped.iter().any(|earlier| earlier.contains(&index))
                    })
                })
                .ok_or(StoreError::RangeNotLive { low, high })?;
            clipped.push(live);
        }

        let mut removed = 0;
        for slots in clipped {
            for slot in self.span.slots_mut(slots) {
                // the dropped value is released here rather than kept behind the tombstone
                if slot.take().is_some() {
                    removed += 1;
                }
            }
        }

        self.len -= removed;
        trace!(removed, remaining = self.len, "removed dense entries");

        Ok(())
    }

    fn clear(&mut self) {
        self.span.clear();
        self.len = 0;
    }

    fn iter(&self) -> Self::Iter<'_> {
        self.span.iter()
    }

    fn iter_mut(&mut self) -> Self::IterMut<'_> {
        self.span.iter_mut()
    }

    fn range(&self, keys: RangeInclusive<T::Key>) -> Self::Range<'_> {
        let (low, high) = keys.into_inner();
        self.span.range(low, high)
    }

    fn span(&self) -> Option<RangeInclusive<T::Key>> {
        let (low, high) = self.span.bounds()?;
        Some(low..=high)
    }
}

impl<T: Keyed> Index<T::Key> for DenseSet<T> {
    type Output = T;

    fn index(&self, key: T::Key) -> &Self::Output {
        self.get(key).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl<'a, T: Keyed> IntoIterator for &'a DenseSet<T> {
    type IntoIter = SpanIter<'a, T::Key, T>;
    type Item = (T::Key, &'a T);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::DenseSet;
    use crate::{error::StoreError, key::Keyed, store::EntityStore};

    #[derive(Clone, Debug, PartialEq)]
    struct Health {
        entity: u32,
        hp: i64,
    }

    impl Keyed for Health {
        type Key = u32;

        fn key(&self) -> u32 {
            self.entity
        }
    }

    fn health(entity: u32) -> Health {
        Health {
            entity,
            hp: i64::from(entity) * 10,
        }
    }

    fn keys(set: &DenseSet<Health>) -> Vec<u32> {
        set.iter().map(|(key, _)| key).collect()
    }

    #[test]
    fn insert_and_lookup() {
        let mut set = DenseSet::new();
        for entity in [5, 6, 7] {
            set.insert(health(entity)).unwrap();
        }

        assert_eq!(set.get(6), Ok(&health(6)));
        assert_eq!(set[7], health(7));
        assert_eq!(set.len(), 3);
        assert_eq!(set.span(), Some(5..=7));
    }

    #[test]
    fn remove_leaves_hole() {
        let mut set = DenseSet::new();
        set.try_extend([5, 6, 7].map(health)).unwrap();

        set.remove_ranges([6..=6]).unwrap();

        assert!(!set.contains(6));
        assert!(set.contains(5));
        assert!(set.contains(7));
        assert_eq!(set.len(), 2);
        assert_eq!(keys(&set), vec![5, 7]);
        // holes keep the span
        assert_eq!(set.extent(), 3);
        assert_eq!(set.get(6), Err(StoreError::Missing(6)));
    }

    #[test]
    fn double_insert_is_rejected() {
        let mut set = DenseSet::new();
        set.insert(health(1)).unwrap();

        assert_eq!(set.insert(health(1)), Err(StoreError::Occupied(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn double_remove_is_rejected() {
        let mut set = DenseSet::new();
        set.try_extend((0..4).map(health)).unwrap();
        set.remove_ranges([1..=2]).unwrap();

        assert_eq!(
            set.remove_ranges([1..=2]),
            Err(StoreError::RangeNotLive { low: 1, high: 2 })
        );
        assert_eq!(
            set.remove_ranges([40..=50]),
            Err(StoreError::RangeNotLive { low: 40, high: 50 })
        );
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn repeated_range_in_one_batch_is_rejected() {
        let mut set = DenseSet::new();
        set.try_extend([5, 6, 7].map(health)).unwrap();

        assert_eq!(
            set.remove_ranges([6..=6, 6..=6]),
            Err(StoreError::RangeNotLive { low: 6, high: 6 })
        );
        assert_eq!(
            set.remove_ranges([5..=7, 6..=7]),
            Err(StoreError::RangeNotLive { low: 6, high: 7 })
        );
        assert_eq!(set.len(), 3);

        // overlapping is fine while each range still claims a live key of its own
        set.remove_ranges([5..=6, 6..=7]).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn failed_batch_removes_nothing() {
        let mut set = DenseSet::new();
        set.try_extend((0..4).map(health)).unwrap();

        let result = set.remove_ranges([0..=1, 3..=2]);

        assert_eq!(result, Err(StoreError::InvertedRange { low: 3, high: 2 }));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn insert_below_base_shifts() {
        let mut set = DenseSet::new();
        set.insert(health(100)).unwrap();
        set.insert(health(3)).unwrap();

        assert_eq!(set.span(), Some(3..=100));
        assert_eq!(set[100], health(100));
        assert_eq!(keys(&set), vec![3, 100]);
    }

    #[test]
    fn iter_mut_updates_in_place() {
        let mut set = DenseSet::new();
        set.try_extend((0..3).map(health)).unwrap();

        for (_, value) in set.iter_mut() {
            value.hp += 1;
        }

        assert_eq!(set[2].hp, 21);
    }

    #[test]
    fn clear_resets_span() {
        let mut set = DenseSet::new();
        set.try_extend((10..20).map(health)).unwrap();

        set.clear();

        assert!(set.is_empty());
        assert_eq!(set.span(), None);
        set.insert(health(2)).unwrap();
        assert_eq!(set.span(), Some(2..=2));
    }
}
