//! Standard collection type aliases for Trellis.
//!
//! Use these instead of direct HashMap/HashSet so the whole codebase hashes
//! consistently. FxHash is optimized for the small integer and string keys
//! that dominate graph workloads.

use rustc_hash::FxBuildHasher;

/// Standard hash map with FxHash.
pub type FxHashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Standard hash set with FxHash.
pub type FxHashSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

/// Create a new empty [`FxHashMap`].
#[inline]
#[must_use]
pub fn fx_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::with_hasher(FxBuildHasher)
}

/// Create a new [`FxHashMap`] with the specified capacity.
#[inline]
#[must_use]
pub fn fx_map_with_capacity<K, V>(capacity: usize) -> FxHashMap<K, V> {
    FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher)
}

/// Create a new empty [`FxHashSet`].
#[inline]
#[must_use]
pub fn fx_set<T>() -> FxHashSet<T> {
    FxHashSet::with_hasher(FxBuildHasher)
}

/// Create a new [`FxHashSet`] with the specified capacity.
#[inline]
#[must_use]
pub fn fx_set_with_capacity<T>(capacity: usize) -> FxHashSet<T> {
    FxHashSet::with_capacity_and_hasher(capacity, FxBuildHasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fx_map_basic() {
        let mut map: FxHashMap<&str, i32> = fx_map();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_fx_set_basic() {
        let mut set: FxHashSet<u32> = fx_set_with_capacity(8);
        set.insert(7);
        assert!(set.contains(&7));
        assert!(!set.contains(&8));
    }
}
