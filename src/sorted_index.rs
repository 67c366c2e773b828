//! An ordered map over a small number of time-indexed entries, used for the
//! price store's "greatest key ≤ query date" lookup (spec.md §3, §9).
//!
//! Adapted from the teacher's `sorted_vec_map::SortedVecMap`: same
//! `SmallVec`-backed sorted-by-key storage, but trimmed to the operations the
//! price store actually needs and extended with [`SortedIndex::floor`], the
//! descending-less-or-equal lookup the teacher's map never required.

use smallvec::SmallVec;

/// A map that keeps `(K, V)` pairs sorted by key in a small, stack-friendly
/// vector. Most commodities have at most a few hundred price points, well
/// within the inline capacity before any heap allocation.
#[derive(Clone, Debug, Default)]
pub struct SortedIndex<K, V, const N: usize = 16> {
    inner: SmallVec<[(K, V); N]>,
}

impl<K: Ord, V> SortedIndex<K, V> {
    pub const fn new() -> Self {
        Self {
            inner: SmallVec::new_const(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Inserts or replaces the value at `key`, keeping the index sorted.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.inner.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(pos) => Some(std::mem::replace(&mut self.inner[pos].1, value)),
            Err(pos) => {
                self.inner.insert(pos, (key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner
            .binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|pos| &self.inner[pos].1)
    }

    /// The value of the entry with the greatest key `<= key`, or `None` if
    /// every stored key is greater than `key` (or the index is empty). This
    /// is the "price on or before date t" rule from spec.md §3.
    pub fn floor(&self, key: &K) -> Option<&V> {
        match self.inner.binary_search_by(|(k, _)| k.cmp(key)) {
            Ok(pos) => Some(&self.inner[pos].1),
            Err(0) => None,
            Err(pos) => Some(&self.inner[pos - 1].1),
        }
    }

    /// Like [`Self::floor`] but returns the matched key alongside the value.
    pub fn floor_entry(&self, key: &K) -> Option<(&K, &V)> {
        match self.inner.binary_search_by(|(k, _)| k.cmp(key)) {
            Ok(pos) => Some((&self.inner[pos].0, &self.inner[pos].1)),
            Err(0) => None,
            Err(pos) => Some((&self.inner[pos - 1].0, &self.inner[pos - 1].1)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.iter().map(|(k, _)| k)
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.inner.last().map(|(k, v)| (k, v))
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.inner.first().map(|(k, v)| (k, v))
    }

    /// Merges `other` into `self`, keeping the last-written value for any
    /// duplicate key. Used by journal/price reload to fold a freshly parsed
    /// batch into the snapshot being built before the atomic swap.
    pub fn extend_overwrite(&mut self, other: impl IntoIterator<Item = (K, V)>) {
        for (k, v) in other {
            self.insert(k, v);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SortedIndex<K, V> {
    /// Later pairs overwrite earlier ones for a duplicate key, matching
    /// [`Self::insert`]'s semantics.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut index = Self::new();
        index.extend_overwrite(iter);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_before_first_key_is_none() {
        let mut idx = SortedIndex::new();
        idx.insert(10, "ten");
        idx.insert(20, "twenty");
        assert_eq!(idx.floor(&5), None);
    }

    #[test]
    fn floor_finds_greatest_key_less_or_equal() {
        let mut idx = SortedIndex::new();
        idx.insert(10, "ten");
        idx.insert(30, "thirty");
        idx.insert(20, "twenty");
        assert_eq!(idx.floor(&20), Some(&"twenty"));
        assert_eq!(idx.floor(&25), Some(&"twenty"));
        assert_eq!(idx.floor(&30), Some(&"thirty"));
        assert_eq!(idx.floor(&100), Some(&"thirty"));
    }

    #[test]
    fn insert_overwrites_existing_key() {
        let mut idx = SortedIndex::new();
        idx.insert(1, "a");
        assert_eq!(idx.insert(1, "b"), Some("a"));
        assert_eq!(idx.get(&1), Some(&"b"));
    }

    #[test]
    fn from_iter_sorts_and_dedups_last_write_wins() {
        let idx: SortedIndex<i32, &str> =
            SortedIndex::from_iter([(3, "c"), (1, "a"), (2, "b")]);
        let keys: Vec<_> = idx.keys().copied().collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }
}
