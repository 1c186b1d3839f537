//! Mirroring a directory hierarchy as a nested tree.
//!
//! Each non-leaf directory becomes a branch with one child per entry. A leaf
//! (decided by the caller's predicate, given the entry's full path) is
//! recorded as its own path; its contents are never read or descended into.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::key_path::KeyPath;
use crate::tree::Tree;

/// Name of the entry that marks a directory as a stored parameter.
pub const PARAMS_ENTRY: &str = "params";

/// What to do with a non-directory entry the predicate did not call a leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrayEntryPolicy {
    /// Fail the walk with [`Error::StrayEntry`].
    #[default]
    Error,
    /// Log a warning and leave the entry out of the tree.
    Skip,
}

/// The standard leaf predicate: a directory holding a `params` entry.
pub fn has_params_entry(path: &Path) -> bool {
    path.is_dir() && path.join(PARAMS_ENTRY).exists()
}

/// The directory under `root` that stores the parameter at `key`, in the
/// layout [`walk_parameter_dir`] reads back.
///
/// # Errors
///
/// - [`Error::KeyPath`] if a segment is not a usable directory name.
/// - [`Error::ReservedSegment`] if a segment other than the first is
///   [`PARAMS_ENTRY`]. Its parent directory would be taken for a leaf.
pub fn parameter_dir(root: &Path, key: &KeyPath) -> Result<PathBuf> {
    let dir = key.to_fs_path(root)?;
    if let Some(segment) = key.iter().skip(1).find(|s| s.as_str() == PARAMS_ENTRY) {
        return Err(Error::ReservedSegment {
            path: key.clone(),
            segment: segment.clone(),
        });
    }
    Ok(dir)
}

/// Mirror `root` using `has_params_entry` as the leaf predicate.
pub fn walk_parameter_dir(root: impl AsRef<Path>) -> Result<Tree<PathBuf>> {
    walk_dir(root, has_params_entry)
}

/// [`walk_parameter_dir`] with an explicit stray entry policy.
pub fn walk_parameter_dir_with(
    root: impl AsRef<Path>,
    stray_entries: StrayEntryPolicy,
) -> Result<Tree<PathBuf>> {
    walk_dir_with(root, has_params_entry, stray_entries)
}

/// Mirror `root`, failing on stray entries.
pub fn walk_dir<P>(root: impl AsRef<Path>, is_leaf: P) -> Result<Tree<PathBuf>>
where
    P: Fn(&Path) -> bool,
{
    walk_dir_with(root, is_leaf, StrayEntryPolicy::Error)
}

/// Mirror `root` into a tree whose leaves are the paths of leaf entries.
///
/// `is_leaf` is called once for every entry below `root` (never for `root`
/// itself) that is not inside a leaf. Entries are visited in file name order
/// for reproducible logs and errors; the resulting tree does not depend on it.
///
/// # Errors
///
/// - [`Error::RootInvalid`] if `root` is missing or not a directory.
/// - [`Error::StrayEntry`] for a non-directory, non-leaf entry under
///   [`StrayEntryPolicy::Error`].
/// - [`Error::NonUtf8Name`] if an entry name cannot be a key segment.
/// - [`Error::Walk`] for I/O failures, including symlink loops.
///
/// No partial tree is returned on error.
pub fn walk_dir_with<P>(
    root: impl AsRef<Path>,
    is_leaf: P,
    stray_entries: StrayEntryPolicy,
) -> Result<Tree<PathBuf>>
where
    P: Fn(&Path) -> bool,
{
    let root = root.as_ref();
    let attr = fs::metadata(root).map_err(|error| Error::RootInvalid {
        path: root.to_path_buf(),
        message: error.to_string(),
    })?;
    if !attr.is_dir() {
        return Err(Error::RootInvalid {
            path: root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    log::debug!("Mirroring {}...", root.display());

    let mut tree = Tree::new();
    let mut segments: Vec<String> = Vec::new();
    let mut walker = walkdir::WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry?;
        let name = entry
            .file_name()
            .to_str()
            .ok_or_else(|| Error::NonUtf8Name {
                path: entry.path().to_path_buf(),
            })?;

        // Depth 1 is a direct child of root.
        segments.truncate(entry.depth() - 1);
        segments.push(name.to_string());
        let key = KeyPath::new(segments.iter().cloned())?;

        if is_leaf(entry.path()) {
            log::debug!("Found leaf {} at {}", key, entry.path().display());
            tree.insert(&key, entry.path().to_path_buf())?;
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
        } else if entry.file_type().is_dir() {
            tree.insert_branch(&key)?;
        } else {
            match stray_entries {
                StrayEntryPolicy::Error => {
                    return Err(Error::StrayEntry {
                        path: entry.path().to_path_buf(),
                    })
                }
                StrayEntryPolicy::Skip => {
                    log::warn!(
                        "Skipping {}: neither a directory nor a leaf",
                        entry.path().display()
                    );
                }
            }
        }
    }

    Ok(tree)
}
