//! The flattened tree: one entry per leaf, keyed by its full key path.

use std::collections::BTreeMap;

use crate::key_path::KeyPath;

/// A mapping from key path to leaf value with no nesting.
///
/// Keys are unique by construction. Entries are kept sorted so output is
/// stable, but lookups are only ever by full path equality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatTree<V> {
    entries: BTreeMap<KeyPath, V>,
}

impl<V> Default for FlatTree<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> FlatTree<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Returns the previous value at that path, if any.
    pub fn insert(&mut self, path: KeyPath, value: V) -> Option<V> {
        self.entries.insert(path, value)
    }

    pub fn get(&self, path: &KeyPath) -> Option<&V> {
        self.entries.get(path)
    }

    pub fn remove(&mut self, path: &KeyPath) -> Option<V> {
        self.entries.remove(path)
    }

    pub fn contains(&self, path: &KeyPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &KeyPath> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&KeyPath, &V)> {
        self.entries.iter()
    }

    /// Transform every value, keeping the keys.
    pub fn map_values<U, F>(self, mut f: F) -> FlatTree<U>
    where
        F: FnMut(&KeyPath, V) -> U,
    {
        FlatTree {
            entries: self
                .entries
                .into_iter()
                .map(|(k, v)| {
                    let u = f(&k, v);
                    (k, u)
                })
                .collect(),
        }
    }

    /// Fallible version of [`FlatTree::map_values`]; stops at the first error.
    pub fn try_map_values<U, E, F>(self, mut f: F) -> Result<FlatTree<U>, E>
    where
        F: FnMut(&KeyPath, V) -> Result<U, E>,
    {
        let mut entries = BTreeMap::new();
        for (k, v) in self.entries {
            let u = f(&k, v)?;
            entries.insert(k, u);
        }
        Ok(FlatTree { entries })
    }
}

impl<V> FromIterator<(KeyPath, V)> for FlatTree<V> {
    fn from_iter<I: IntoIterator<Item = (KeyPath, V)>>(iter: I) -> Self {
        FlatTree {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<V> IntoIterator for FlatTree<V> {
    type Item = (KeyPath, V);
    type IntoIter = std::collections::btree_map::IntoIter<KeyPath, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a FlatTree<V> {
    type Item = (&'a KeyPath, &'a V);
    type IntoIter = std::collections::btree_map::Iter<'a, KeyPath, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypath;

    #[test]
    fn insert_get_remove() {
        let mut flat = FlatTree::new();
        assert_eq!(flat.insert(keypath!("a/b"), 1), None);
        assert_eq!(flat.insert(keypath!("a/b"), 2), Some(1));
        assert_eq!(flat.get(&keypath!("a/b")), Some(&2));
        assert!(flat.contains(&keypath!("a/b")));
        assert!(!flat.contains(&keypath!("a")));
        assert_eq!(flat.remove(&keypath!("a/b")), Some(2));
        assert!(flat.is_empty());
    }

    #[test]
    fn lookup_is_by_full_path_only() {
        let flat: FlatTree<i32> = [(keypath!("a/b"), 1)].into_iter().collect();
        assert_eq!(flat.get(&keypath!("a")), None);
        assert_eq!(flat.get(&keypath!("b")), None);
        assert_eq!(flat.get(&keypath!("a/b/c")), None);
    }

    #[test]
    fn map_values_sees_keys() {
        let flat: FlatTree<i32> = [(keypath!("x/y"), 5), (keypath!("z"), 6)]
            .into_iter()
            .collect();
        let mapped = flat.map_values(|k, v| format!("{}={}", k, v));
        assert_eq!(mapped.get(&keypath!("x/y")).unwrap(), "x/y=5");
        assert_eq!(mapped.get(&keypath!("z")).unwrap(), "z=6");
    }

    #[test]
    fn try_map_values_stops_on_error() {
        let flat: FlatTree<i32> = [(keypath!("a"), 1), (keypath!("b"), -1)]
            .into_iter()
            .collect();
        let result: Result<FlatTree<u32>, String> = flat.try_map_values(|k, v| {
            u32::try_from(v).map_err(|_| format!("negative at {}", k))
        });
        assert_eq!(result.unwrap_err(), "negative at b");
    }
}
