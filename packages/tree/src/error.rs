//! Error types for tree construction, mirroring and diffing.

use std::path::PathBuf;

use crate::key_path::{KeyPath, KeyPathError};

/// Errors from the tree codec and the filesystem mirror.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("key path error: {0}")]
    KeyPath(#[from] KeyPathError),

    /// One key path ends where another continues (or the reverse).
    #[error("conflicting key paths at '{path}': a leaf and a branch share this prefix")]
    Conflict { path: KeyPath },

    /// The is-leaf predicate declined a node that cannot hold children.
    #[error("node at '{path}' is not a leaf but has no children to descend into")]
    NotABranch { path: String },

    /// Storing the key would make its parent directory read back as a leaf.
    #[error("key path '{path}' cannot be stored: segment '{segment}' is reserved below the top level")]
    ReservedSegment { path: KeyPath, segment: String },

    #[error("mirror root {path:?} is not a readable directory: {message}")]
    RootInvalid { path: PathBuf, message: String },

    /// A non-directory entry that the predicate did not mark as a leaf.
    #[error("entry {path:?} is neither a directory nor a leaf")]
    StrayEntry { path: PathBuf },

    #[error("entry name {path:?} is not valid UTF-8")]
    NonUtf8Name { path: PathBuf },

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypath;
    use std::error::Error as StdError;

    #[test]
    fn conflict_display_names_path() {
        let e = Error::Conflict {
            path: keypath!("a/b"),
        };
        assert!(e.to_string().contains("'a/b'"));
    }

    #[test]
    fn key_path_error_converts_and_chains() {
        let e: Error = KeyPathError::Empty.into();
        assert!(matches!(e, Error::KeyPath(_)));
        assert!(e.to_string().starts_with("key path error"));
    }

    #[test]
    fn io_error_has_source() {
        let e = Error::io(
            "/nope",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(StdError::source(&e).is_some());
        assert!(e.to_string().contains("/nope"));
    }

    #[test]
    fn reserved_segment_display() {
        let e = Error::ReservedSegment {
            path: keypath!("model/params/w"),
            segment: "params".to_string(),
        };
        assert!(e.to_string().contains("'model/params/w'"));
        assert!(e.to_string().contains("'params'"));
    }

    #[test]
    fn stray_entry_display() {
        let e = Error::StrayEntry {
            path: PathBuf::from("/ckpt/README"),
        };
        assert!(e.to_string().contains("README"));
    }
}
