//! The nested tree: branches keyed by segment, bottoming out in leaves.
//!
//! Whether a node is a leaf is decided once, by the caller's predicate, when
//! the tree is built (see [`crate::codec`] and [`crate::mirror`]). After that
//! the distinction is carried in the type: a [`Node`] is either a `Leaf` or a
//! `Branch`, and nothing downstream needs to inspect values to tell.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::key_path::KeyPath;

/// One child of a branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node<V> {
    /// An opaque payload: a parameter, a filesystem path, etc.
    Leaf(V),
    /// Further nested structure.
    Branch(Tree<V>),
}

impl<V> Node<V> {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&V> {
        match self {
            Node::Leaf(v) => Some(v),
            Node::Branch(_) => None,
        }
    }

    pub fn as_branch(&self) -> Option<&Tree<V>> {
        match self {
            Node::Leaf(_) => None,
            Node::Branch(t) => Some(t),
        }
    }
}

/// A nested tree of named nodes.
///
/// The root is always a branch. Children are kept in a `BTreeMap` so
/// iteration, `Debug` output and equality are deterministic; the order
/// carries no meaning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree<V> {
    children: BTreeMap<String, Node<V>>,
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self {
            children: BTreeMap::new(),
        }
    }
}

impl<V> Tree<V> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True if this branch has no children at all.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaves reachable from this branch.
    pub fn leaf_count(&self) -> usize {
        self.children
            .values()
            .map(|node| match node {
                Node::Leaf(_) => 1,
                Node::Branch(t) => t.leaf_count(),
            })
            .sum()
    }

    /// Iterate over direct children.
    pub fn children(&self) -> impl Iterator<Item = (&String, &Node<V>)> {
        self.children.iter()
    }

    /// Look up a direct child by segment.
    pub fn child(&self, segment: &str) -> Option<&Node<V>> {
        self.children.get(segment)
    }

    /// Add a direct child, replacing any previous child with that name.
    pub fn insert_child(&mut self, segment: impl Into<String>, node: Node<V>) -> Option<Node<V>> {
        self.children.insert(segment.into(), node)
    }

    /// Get the node at a key path.
    pub fn get(&self, path: &KeyPath) -> Option<&Node<V>> {
        let mut current = self;
        for segment in path.parent_segments() {
            current = match current.children.get(segment)? {
                Node::Branch(t) => t,
                Node::Leaf(_) => return None,
            };
        }
        current.children.get(path.last())
    }

    /// Get a leaf value at a key path.
    pub fn get_leaf(&self, path: &KeyPath) -> Option<&V> {
        self.get(path)?.as_leaf()
    }

    /// Get a mutable reference to the node at a key path.
    pub fn get_mut(&mut self, path: &KeyPath) -> Option<&mut Node<V>> {
        let mut current = self;
        for segment in path.parent_segments() {
            current = match current.children.get_mut(segment)? {
                Node::Branch(t) => t,
                Node::Leaf(_) => return None,
            };
        }
        current.children.get_mut(path.last())
    }

    /// Walk the first `depth` segments of `path`, creating branches as
    /// needed, and return the branch reached.
    fn branch_entry(&mut self, path: &KeyPath, depth: usize) -> Result<&mut Tree<V>> {
        let mut current = self;

        for (i, segment) in path.segments()[..depth].iter().enumerate() {
            let node = current
                .children
                .entry(segment.clone())
                .or_insert_with(|| Node::Branch(Tree::new()));
            current = match node {
                Node::Branch(t) => t,
                Node::Leaf(_) => {
                    return Err(Error::Conflict {
                        path: KeyPath::from_validated(path.segments()[..=i].to_vec()),
                    })
                }
            };
        }

        Ok(current)
    }

    /// Set a leaf at a key path, creating intermediate branches as needed.
    ///
    /// Returns the previous leaf value at that path, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflict`] if the path runs through an existing leaf,
    /// or if it ends where an existing branch lives. Nothing is overwritten
    /// in either case.
    pub fn insert(&mut self, path: &KeyPath, value: V) -> Result<Option<V>> {
        let parent = self.branch_entry(path, path.len() - 1)?;

        match parent.children.get_mut(path.last()) {
            Some(Node::Branch(_)) => Err(Error::Conflict { path: path.clone() }),
            Some(Node::Leaf(existing)) => Ok(Some(std::mem::replace(existing, value))),
            None => {
                parent
                    .children
                    .insert(path.last().to_string(), Node::Leaf(value));
                Ok(None)
            }
        }
    }

    /// Make sure a (possibly empty) branch exists at a key path.
    pub fn insert_branch(&mut self, path: &KeyPath) -> Result<()> {
        self.branch_entry(path, path.len()).map(|_| ())
    }

    /// Remove the node at a key path, returning it if it existed.
    ///
    /// Parent branches are left in place even if they become empty.
    pub fn remove(&mut self, path: &KeyPath) -> Option<Node<V>> {
        match path.parent() {
            None => self.children.remove(path.last()),
            Some(parent) => match self.get_mut(&parent)? {
                Node::Branch(t) => t.children.remove(path.last()),
                Node::Leaf(_) => None,
            },
        }
    }

    /// Transform every leaf, keeping the shape.
    pub fn map_leaves<U, F>(self, mut f: F) -> Tree<U>
    where
        F: FnMut(V) -> U,
    {
        self.map_leaves_inner(&mut f)
    }

    fn map_leaves_inner<U, F>(self, f: &mut F) -> Tree<U>
    where
        F: FnMut(V) -> U,
    {
        Tree {
            children: self
                .children
                .into_iter()
                .map(|(segment, node)| {
                    let node = match node {
                        Node::Leaf(v) => Node::Leaf(f(v)),
                        Node::Branch(t) => Node::Branch(t.map_leaves_inner(f)),
                    };
                    (segment, node)
                })
                .collect(),
        }
    }
}

impl<V> IntoIterator for Tree<V> {
    type Item = (String, Node<V>);
    type IntoIter = std::collections::btree_map::IntoIter<String, Node<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.into_iter()
    }
}
