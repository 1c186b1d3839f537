//! Path-keyed difference between two trees.
//!
//! Only presence is compared: a path in both trees is never reported, even if
//! its value changed.

use std::borrow::Cow;

use crate::codec::flatten;
use crate::flat::FlatTree;
use crate::key_path::KeyPath;
use crate::tree::Tree;

/// Anything that can be viewed as a flattened tree.
pub trait Flattened<V: Clone> {
    fn flattened(&self) -> Cow<'_, FlatTree<V>>;
}

impl<V: Clone> Flattened<V> for Tree<V> {
    fn flattened(&self) -> Cow<'_, FlatTree<V>> {
        Cow::Owned(flatten(self))
    }
}

impl<V: Clone> Flattened<V> for FlatTree<V> {
    fn flattened(&self) -> Cow<'_, FlatTree<V>> {
        Cow::Borrowed(self)
    }
}

impl<V: Clone, T: Flattened<V> + ?Sized> Flattened<V> for &T {
    fn flattened(&self) -> Cow<'_, FlatTree<V>> {
        (**self).flattened()
    }
}

/// Leaves present in an old tree but missing from a new one.
///
/// The difference is computed once, up front. [`Removed::iter`] is
/// restartable: every call walks the full result again. No order is
/// promised; compare results as sets.
#[derive(Clone, Debug, PartialEq)]
pub struct Removed<V> {
    entries: Vec<(KeyPath, V)>,
}

impl<V> Removed<V> {
    /// The removed leaf values.
    pub fn iter(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }

    /// The key paths the removed values lived at.
    pub fn paths(&self) -> impl Iterator<Item = &KeyPath> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&KeyPath, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the result, keeping only the values.
    pub fn into_values(self) -> Vec<V> {
        self.into_iter().collect()
    }
}

impl<V> IntoIterator for Removed<V> {
    type Item = V;
    type IntoIter = std::iter::Map<std::vec::IntoIter<(KeyPath, V)>, fn((KeyPath, V)) -> V>;

    fn into_iter(self) -> Self::IntoIter {
        let value: fn((KeyPath, V)) -> V = |(_, v)| v;
        self.entries.into_iter().map(value)
    }
}

impl<'a, V> IntoIterator for &'a Removed<V> {
    type Item = &'a V;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, (KeyPath, V)>, fn(&'a (KeyPath, V)) -> &'a V>;

    fn into_iter(self) -> Self::IntoIter {
        let value: fn(&'a (KeyPath, V)) -> &'a V = |(_, v)| v;
        self.entries.iter().map(value)
    }
}

/// Yield the leaves of `old` whose key paths do not appear in `new`.
///
/// Either argument may be a [`Tree`] or a [`FlatTree`] (or a reference to
/// one); trees are flattened first.
///
/// ```rust
/// use paramfs_tree::{keypath, removed, Tree};
///
/// let mut old = Tree::new();
/// old.insert(&keypath!("a/b"), 1).unwrap();
/// old.insert(&keypath!("a/c"), 2).unwrap();
/// let mut new = Tree::new();
/// new.insert(&keypath!("a/b"), 1).unwrap();
///
/// let gone: Vec<_> = removed(&new, &old).into_iter().collect();
/// assert_eq!(gone, vec![2]);
/// ```
pub fn removed<V, N, O>(new: N, old: O) -> Removed<V>
where
    V: Clone,
    N: Flattened<V>,
    O: Flattened<V>,
{
    let new = new.flattened();
    let old = old.flattened();
    let entries = old
        .iter()
        .filter(|(path, _)| !new.contains(path))
        .map(|(path, value)| (path.clone(), value.clone()))
        .collect();
    Removed { entries }
}
