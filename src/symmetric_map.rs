use fnv::FnvHashMap;
use std::hash::Hash;

/// A map keyed by unordered pairs: `(a, b)` and `(b, a)` name the same entry.
pub struct SymmetricMap<K, V> {
    map: FnvHashMap<(K, K), V>,
}

impl<K, V> SymmetricMap<K, V>
where
    K: Copy + Eq + Hash + Ord,
{
    pub fn new() -> Self {
        SymmetricMap {
            map: FnvHashMap::default(),
        }
    }

    fn order_keys(k1: K, k2: K) -> (K, K) {
        if k1 > k2 {
            (k2, k1)
        } else {
            (k1, k2)
        }
    }

    pub fn get(&self, k1: K, k2: K) -> Option<&V> {
        self.map.get(&Self::order_keys(k1, k2))
    }

    pub fn entry_or_default(&mut self, k1: K, k2: K) -> &mut V
    where
        V: Default,
    {
        self.map.entry(Self::order_keys(k1, k2)).or_default()
    }
}
