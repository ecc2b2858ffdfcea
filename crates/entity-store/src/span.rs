use std::{iter::FusedIterator, ops::Range};

use tracing::debug;

use crate::key::EntityKey;

/// One contiguous array of optional slots addressed by `key - base`.
///
/// `base` is unset until the first key is covered. Growth above the span is a resize; growth
/// below it reallocates and shifts every existing slot, which is O(n) but rare since keys are
/// normally handed out in increasing order.
#[derive(Clone, Debug)]
pub struct KeySpan<K, S> {
    base: Option<K>,
    slots: Vec<Option<S>>,
}

impl<K, S> Default for KeySpan<K, S> {
    fn default() -> Self {
        Self {
            base: None,
            slots: Vec::new(),
        }
    }
}

impl<K: EntityKey, S> KeySpan<K, S> {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            base: None,
            slots: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub const fn base(&self) -> Option<K> {
        self.base
    }

    /// Number of addressable slots, live or not.
    #[must_use]
    pub fn extent(&self) -> usize {
        self.slots.len()
    }

    /// Lowest and highest addressable key.
    #[must_use]
    pub fn bounds(&self) -> Option<(K, K)> {
        let base = self.base?;
        let last = self.slots.len().checked_sub(1)?;
        Some((base, base.checked_step(last)?))
    }

    fn index(&self, key: K) -> Option<usize> {
        let base = self.base?;
        if key < base {
            return None;
        }
        let index = key.distance_from(base);
        (index < self.slots.len()).then_some(index)
    }

    #[must_use]
    pub fn get(&self, key: K) -> Option<&S> {
        let index = self.index(key)?;
        self.slots[index].as_ref()
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut S> {
        let index = self.index(key)?;
        self.slots[index].as_mut()
    }

    /// The slot for `key`, `None` if `key` is outside the span.
    pub fn slot_mut(&mut self, key: K) -> Option<&mut Option<S>> {
        let index = self.index(key)?;
        Some(&mut self.slots[index])
    }

    /// Grows the span so every key in `low..=high` is addressable.
    pub fn cover(&mut self, low: K, high: K) {
        debug_assert!(low <= high);

        let base = match self.base {
            None => {
                self.base = Some(low);
                low
            }
            Some(base) if low < base => {
                let shift = base.distance_from(low);
                debug!(shift, existing = self.slots.len(), "growing key span below its base");

                let mut slots = Vec::with_capacity(shift + self.slots.len());
                slots.resize_with(shift, || None);
                slots.append(&mut self.slots);

                self.slots = slots;
                self.base = Some(low);
                low
            }
            Some(base) => base,
        };

        let needed = high.distance_from(base).saturating_add(1);
        if needed > self.slots.len() {
            self.slots.resize_with(needed, || None);
        }
    }

    /// Slot indices of the keys in `low..=high` that fall inside the span.
    pub(crate) fn clip(&self, low: K, high: K) -> Option<Range<usize>> {
        let base = self.base?;
        if high < base {
            return None;
        }

        let start = if low < base { 0 } else { low.distance_from(base) };
        let end = high.distance_from(base).saturating_add(1).min(self.slots.len());

        (start < end).then_some(start..end)
    }

    pub(crate) fn slots(&self, range: Range<usize>) -> &[Option<S>] {
        &self.slots[range]
    }

    pub(crate) fn slots_mut(&mut self, range: Range<usize>) -> &mut [Option<S>] {
        &mut self.slots[range]
    }

    /// Drops every slot and unsets the base.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.base = None;
    }

    pub fn iter(&self) -> SpanIter<'_, K, S> {
        SpanIter {
            next_key: self.base,
            slots: self.slots.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> SpanIterMut<'_, K, S> {
        SpanIterMut {
            next_key: self.base,
            slots: self.slots.iter_mut(),
        }
    }

    /// Occupied slots with keys in `low..=high`.
    pub fn range(&self, low: K, high: K) -> SpanIter<'_, K, S> {
        let Some(range) = self.clip(low, high) else {
            return SpanIter {
                next_key: None,
                slots: self.slots[..0].iter(),
            };
        };

        SpanIter {
            next_key: self.base.and_then(|base| base.checked_step(range.start)),
            slots: self.slots[range].iter(),
        }
    }
}

/// Occupied slots of a [`KeySpan`] in key order.
#[must_use]
pub struct SpanIter<'a, K, S> {
    next_key: Option<K>,
    slots: std::slice::Iter<'a, Option<S>>,
}

impl<'a, K: EntityKey, S> Iterator for SpanIter<'a, K, S> {
    type Item = (K, &'a S);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let slot = self.slots.next()?;
            let key = self.next_key?;
            self.next_key = key.checked_step(1);

            if let Some(value) = slot {
                return Some((key, value));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.slots.len()))
    }
}

impl<K: EntityKey, S> FusedIterator for SpanIter<'_, K, S> {}

#[must_use]
pub struct SpanIterMut<'a, K, S> {
    next_key: Option<K>,
    slots: std::slice::IterMut<'a, Option<S>>,
}

impl<'a, K: EntityKey, S> Iterator for SpanIterMut<'a, K, S> {
    type Item = (K, &'a mut S);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let slot = self.slots.next()?;
            let key = self.next_key?;
            self.next_key = key.checked_step(1);

            if let Some(value) = slot {
                return Some((key, value));
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.slots.len()))
    }
}

impl<K: EntityKey, S> FusedIterator for SpanIterMut<'_, K, S> {}
