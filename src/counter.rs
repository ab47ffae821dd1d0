use std::collections::BTreeMap;

/// A sparse counted multiset.
///
/// Missing keys have an implicit count of zero, and entries are removed once their
/// count drops back to zero, so two counters are equal iff they count the same keys
/// the same number of times.
///
/// With the `serde` feature, a counter serializes as a sequence of `(key, count)` pairs,
/// so that non-string keys survive formats like JSON.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Counter<K: Ord> {
    counts: BTreeMap<K, usize>,
}

impl<K: Ord> Default for Counter<K> {
    fn default() -> Self {
        Counter {
            counts: BTreeMap::new(),
        }
    }
}

#[cfg(feature = "serde")]
impl<K: Ord + serde::Serialize> serde::Serialize for Counter<K> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.counts.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, K: Ord + serde::Deserialize<'de>> serde::Deserialize<'de> for Counter<K> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut counter = Counter::new();
        for (key, count) in Vec::<(K, usize)>::deserialize(deserializer)? {
            counter.add_n(key, count);
        }
        Ok(counter)
    }
}

impl<K: Ord> Counter<K> {
    pub fn new() -> Counter<K> {
        Counter::default()
    }

    /// Number of occurrences of `key` (zero if absent).
    pub fn get<Q>(&self, key: &Q) -> usize
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn add(&mut self, key: K) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: K, count: usize) {
        if count > 0 {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    /// Remove up to `count` occurrences of `key`. Counts never go below zero.
    pub fn subtract_n<Q>(&mut self, key: &Q, count: usize)
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if let Some(current) = self.counts.get_mut(key) {
            *current = current.saturating_sub(count);
            if *current == 0 {
                self.counts.remove(key);
            }
        }
    }

    /// Remove every occurrence counted in `other` from this counter.
    pub fn subtract(&mut self, other: &Counter<K>) {
        for (key, count) in other.iter() {
            self.subtract_n(key, count);
        }
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.counts.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> {
        self.counts.iter().map(|(k, c)| (k, *c))
    }
}

impl<K: Ord + Clone> Counter<K> {
    /// Add every occurrence counted in `other` to this counter.
    pub fn extend_from(&mut self, other: &Counter<K>) {
        for (key, count) in other.iter() {
            self.add_n(key.clone(), count);
        }
    }
}

impl<K: Ord> FromIterator<K> for Counter<K> {
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut counter = Counter::new();
        for key in iter {
            counter.add(key);
        }
        counter
    }
}
