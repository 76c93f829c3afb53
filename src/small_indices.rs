//! Small, dense index newtypes used throughout the incidence store and
//! reduction data structures, plus the hash map/set aliases built on top of
//! them.

use rustc_hash::{FxHashMap, FxHashSet};

pub type IdxHashMap<K, V> = FxHashMap<K, V>;
pub type IdxHashSet<K> = FxHashSet<K>;

/// Common interface implemented by all index newtypes created with
/// [`create_idx_struct`]. Lets the set-trie and segment tree data structures
/// stay generic over which kind of index they store.
pub trait SmallIdx:
    Copy
    + Clone
    + Eq
    + Ord
    + std::hash::Hash
    + std::fmt::Display
    + Default
    + From<usize>
    + From<u32>
    + Into<usize>
    + Into<u32>
{
    const INVALID: Self;

    fn idx(&self) -> usize;

    fn valid(&self) -> bool {
        *self != Self::INVALID
    }

    fn idx_if_valid(&self) -> Option<usize> {
        if self.valid() {
            Some(self.idx())
        } else {
            None
        }
    }
}

/// Creates an index struct that uses a `u32` to store the index.
#[macro_export]
macro_rules! create_idx_struct {
    ($name:ident) => {
        #[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
        pub struct $name(u32);

        impl $name {
            #[allow(dead_code)]
            pub const INVALID: Self = Self(u32::max_value());

            pub fn idx(&self) -> usize {
                self.0 as usize
            }

            #[allow(dead_code)]
            pub fn valid(&self) -> bool {
                self.0 != u32::max_value()
            }
        }

        impl ::std::convert::From<usize> for $name {
            fn from(idx: usize) -> Self {
                debug_assert!(<u32 as ::std::convert::TryFrom<usize>>::try_from(idx).is_ok());
                Self(idx as u32)
            }
        }

        impl ::std::convert::From<u32> for $name {
            fn from(idx: u32) -> Self {
                Self(idx)
            }
        }

        impl ::std::convert::Into<usize> for $name {
            fn into(self) -> usize {
                self.idx()
            }
        }

        impl ::std::convert::Into<u32> for $name {
            fn into(self) -> u32 {
                self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl $crate::small_indices::SmallIdx for $name {
            const INVALID: Self = Self::INVALID;

            fn idx(&self) -> usize {
                $name::idx(self)
            }
        }
    };
}
