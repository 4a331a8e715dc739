use serde::Serialize;

use crate::HashMap;

/// A string-keyed map that remembers insertion order. Used everywhere the
/// order of keys ends up in generated output (attributes, options, events),
/// so compilation stays deterministic.
#[derive(Serialize, Debug, Clone)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap {
            entries: vec![],
            positions: HashMap::default(),
        }
    }
}

impl<V: PartialEq> PartialEq for OrderedMap<V> {
    fn eq(&self, rhs: &Self) -> bool {
        self.entries == rhs.entries
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap::default()
    }

    /// Insert a value, replacing the value of an existing key in place.
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.positions.get(&key) {
            Some(&index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Insert only if the key is not present yet. Returns false when the
    /// key already existed (the first occurrence wins).
    pub fn insert_first(&mut self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        if self.positions.contains_key(&key) {
            return false;
        }
        self.insert(key, value);
        true
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.positions.get(key).map(|&index| &self.entries[index].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        match self.positions.get(key) {
            Some(&index) => Some(&mut self.entries[index].1),
            None => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        let index = self.positions.remove(key)?;
        let (_, value) = self.entries.remove(index);
        for position in self.positions.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V> std::iter::FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedMap;

    #[test]
    fn keeps_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("b", 1);
        map.insert("a", 2);
        map.insert("b", 3);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(&3));
    }

    #[test]
    fn first_occurrence_wins_with_insert_first() {
        let mut map = OrderedMap::new();
        assert!(map.insert_first("class", "a"));
        assert!(!map.insert_first("class", "b"));
        assert_eq!(map.get("class"), Some(&"a"));
    }

    #[test]
    fn remove_keeps_lookups_consistent() {
        let mut map: OrderedMap<i32> = vec![("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        assert_eq!(map.remove("a"), Some(1));
        assert_eq!(map.get("c"), Some(&3));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[quickcheck]
    fn keys_are_unique_and_ordered_by_first_insert(keys: Vec<u8>) -> bool {
        let mut map = OrderedMap::new();
        let mut expected: Vec<String> = vec![];
        for key in keys {
            let key = key.to_string();
            if !expected.contains(&key) {
                expected.push(key.clone());
            }
            map.insert(key, ());
        }
        map.keys().map(String::from).collect::<Vec<_>>() == expected
    }
}
