//! ParamFS trees: the hierarchical parameter store core.
//!
//! A checkpoint is a nested tree of named parameters. This crate converts
//! between three views of one:
//! - [`Tree`]: nested branches bottoming out in leaves
//! - [`FlatTree`]: one entry per leaf, keyed by its [`KeyPath`]
//! - a directory mirror on disk, read back with [`walk_dir`]
//!
//! and compares two trees by key path with [`removed`].
//!
//! # Example
//!
//! ```rust
//! use paramfs_tree::{flatten, keypath, unflatten, Tree};
//! use serde_json::json;
//!
//! let tree = Tree::from_json(&json!({"a": {"b": 1, "c": 2}, "d": 3})).unwrap();
//! let flat = flatten(&tree);
//! assert_eq!(flat.get(&keypath!("a/c")), Some(&json!(2)));
//! assert_eq!(unflatten(flat).unwrap(), tree);
//! ```

mod codec;
mod diff;
mod error;
mod flat;
mod key_path;
mod mirror;
mod tree;

pub use codec::{flatten, flatten_with, is_not_object, unflatten};
pub use diff::{removed, Flattened, Removed};
pub use error::{Error, Result};
pub use flat::FlatTree;
pub use key_path::{KeyPath, KeyPathError};
pub use mirror::{
    has_params_entry, parameter_dir, walk_dir, walk_dir_with, walk_parameter_dir,
    walk_parameter_dir_with, StrayEntryPolicy, PARAMS_ENTRY,
};
pub use tree::{Node, Tree};
