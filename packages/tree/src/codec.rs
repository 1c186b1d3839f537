//! Conversions between nested trees and flattened trees.
//!
//! [`flatten`] and [`unflatten`] are inverses: for any tree whose branches
//! are all non-empty, `unflatten(flatten(&t)) == t`. An empty branch holds no
//! leaves, so it has no key path to survive flattening.
//!
//! Dynamic data (a checkpoint loaded as JSON) has no tagged structure yet, so
//! [`flatten_with`] and [`Tree::from_json_with`] take the caller's is-leaf
//! predicate and use it to decide, node by node, which variant to build.

use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::flat::FlatTree;
use crate::key_path::KeyPath;
use crate::tree::{Node, Tree};

/// Flatten a nested tree into a mapping from key path to leaf value.
///
/// ```rust
/// use paramfs_tree::{flatten, keypath, Tree};
///
/// let mut tree = Tree::new();
/// tree.insert(&keypath!("a/b"), 1).unwrap();
/// tree.insert(&keypath!("d"), 3).unwrap();
///
/// let flat = flatten(&tree);
/// assert_eq!(flat.get(&keypath!("a/b")), Some(&1));
/// assert_eq!(flat.len(), 2);
/// ```
pub fn flatten<V: Clone>(tree: &Tree<V>) -> FlatTree<V> {
    let mut flat = FlatTree::new();
    let mut prefix = Vec::new();
    flatten_ref(tree, &mut prefix, &mut flat);
    flat
}

fn flatten_ref<V: Clone>(tree: &Tree<V>, prefix: &mut Vec<String>, flat: &mut FlatTree<V>) {
    for (segment, node) in tree.children() {
        prefix.push(segment.clone());
        match node {
            Node::Leaf(value) => {
                flat.insert(KeyPath::from_validated(prefix.clone()), value.clone());
            }
            Node::Branch(subtree) => flatten_ref(subtree, prefix, flat),
        }
        prefix.pop();
    }
}

fn flatten_owned<V>(tree: Tree<V>, prefix: &mut Vec<String>, flat: &mut FlatTree<V>) {
    for (segment, node) in tree {
        prefix.push(segment);
        match node {
            Node::Leaf(value) => {
                flat.insert(KeyPath::from_validated(prefix.clone()), value);
            }
            Node::Branch(subtree) => flatten_owned(subtree, prefix, flat),
        }
        prefix.pop();
    }
}

/// Rebuild a nested tree from a flattened one.
///
/// # Errors
///
/// Returns [`Error::Conflict`] if one key path is a strict prefix of another,
/// i.e. the mapping disagrees about whether that prefix is a leaf or a
/// branch. The result does not depend on which of the two is seen first.
pub fn unflatten<V>(flat: FlatTree<V>) -> Result<Tree<V>> {
    let mut tree = Tree::new();
    for (path, value) in flat {
        // Keys are unique, so a replaced leaf is impossible here.
        tree.insert(&path, value)?;
    }
    Ok(tree)
}

/// The default leaf predicate for dynamic data: anything but an object.
pub fn is_not_object(value: &JsonValue) -> bool {
    !value.is_object()
}

/// Flatten dynamic data using the caller's is-leaf predicate.
///
/// The root must be an object. Any node the predicate does not call a leaf
/// must also be an object; otherwise this fails with [`Error::NotABranch`].
pub fn flatten_with<P>(value: &JsonValue, is_leaf: P) -> Result<FlatTree<JsonValue>>
where
    P: Fn(&JsonValue) -> bool,
{
    Ok(Tree::from_json_with(value, is_leaf)?.into_flat())
}

impl<V> Tree<V> {
    /// Flatten by value, without cloning leaves.
    pub fn into_flat(self) -> FlatTree<V> {
        let mut flat = FlatTree::new();
        let mut prefix = Vec::new();
        flatten_owned(self, &mut prefix, &mut flat);
        flat
    }
}

impl<V> FlatTree<V> {
    /// Rebuild the nested tree; see [`unflatten`].
    pub fn unflatten(self) -> Result<Tree<V>> {
        unflatten(self)
    }
}

impl<V: Clone> Tree<V> {
    /// Flatten by reference; see [`flatten`].
    pub fn flatten(&self) -> FlatTree<V> {
        flatten(self)
    }
}

impl Tree<JsonValue> {
    /// Build a tree from dynamic data with the default predicate
    /// ([`is_not_object`]).
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        Self::from_json_with(value, is_not_object)
    }

    /// Build a tree from dynamic data, asking `is_leaf` about every node
    /// below the root.
    pub fn from_json_with<P>(value: &JsonValue, is_leaf: P) -> Result<Self>
    where
        P: Fn(&JsonValue) -> bool,
    {
        match value {
            JsonValue::Object(map) => build_branch(map, &mut Vec::new(), &is_leaf),
            _ => Err(Error::NotABranch {
                path: "(root)".to_string(),
            }),
        }
    }

    /// Convert back into dynamic data; every branch becomes an object.
    pub fn into_json(self) -> JsonValue {
        JsonValue::Object(
            self.into_iter()
                .map(|(segment, node)| {
                    let value = match node {
                        Node::Leaf(v) => v,
                        Node::Branch(t) => t.into_json(),
                    };
                    (segment, value)
                })
                .collect(),
        )
    }
}

fn build_branch<P>(
    map: &Map<String, JsonValue>,
    prefix: &mut Vec<String>,
    is_leaf: &P,
) -> Result<Tree<JsonValue>>
where
    P: Fn(&JsonValue) -> bool,
{
    let mut tree = Tree::new();
    for (key, value) in map {
        prefix.push(key.clone());

        let node = if is_leaf(value) {
            Node::Leaf(value.clone())
        } else {
            match value {
                JsonValue::Object(children) => Node::Branch(build_branch(children, prefix, is_leaf)?),
                _ => {
                    return Err(Error::NotABranch {
                        path: prefix.join("/"),
                    })
                }
            }
        };

        prefix.pop();
        tree.insert_child(key.clone(), node);
    }
    Ok(tree)
}
