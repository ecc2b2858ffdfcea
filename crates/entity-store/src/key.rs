use std::{
    fmt::{Debug, Display},
    hash::Hash,
};

/// An unsigned integer entity handle.
pub trait EntityKey: Copy + Ord + Hash + Debug + Display + Send + Sync + 'static {
    /// Number of keys from `base` up to `self`. Requires `base <= self`.
    fn distance_from(self, base: Self) -> usize;

    /// The key `distance` places above `self`, if it fits.
    fn checked_step(self, distance: usize) -> Option<Self>;

    fn checked_offset(self, offset: Self) -> Option<Self>;
}

macro_rules! impl_entity_key {
    ($($ty:ty),*) => {
        $(
            impl EntityKey for $ty {
                #[allow(clippy::cast_possible_truncation, clippy::unnecessary_cast)]
                fn distance_from(self, base: Self) -> usize {
                    debug_assert!(base <= self, "{self} is below base {base}");
                    (self - base) as usize
                }

                fn checked_step(self, distance: usize) -> Option<Self> {
                    Self::try_from(distance).ok().and_then(|distance| self.checked_add(distance))
                }

                fn checked_offset(self, offset: Self) -> Option<Self> {
                    self.checked_add(offset)
                }
            }
        )*
    };
}

impl_entity_key!(u16, u32, u64, usize);

/// A value that names the entity it belongs to.
pub trait Keyed {
    type Key: EntityKey;

    fn key(&self) -> Self::Key;
}
