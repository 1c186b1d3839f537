//! Key paths: the join key between nested trees, flattened trees and
//! directory mirrors.

use std::fmt;
use std::path::{Path, PathBuf};

/// Errors related to key path parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPathError {
    /// A key path must have at least one segment.
    Empty,
    /// A segment cannot be used as a directory name.
    InvalidSegment {
        segment: String,
        position: usize,
        message: String,
    },
}

impl fmt::Display for KeyPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPathError::Empty => write!(f, "key path must have at least one segment"),
            KeyPathError::InvalidSegment {
                segment,
                position,
                message,
            } => {
                write!(
                    f,
                    "invalid key segment '{}' at position {}: {}",
                    segment, position, message
                )
            }
        }
    }
}

impl std::error::Error for KeyPathError {}

/// A non-empty key path.
///
/// Segments are arbitrary strings, including empty ones and ones containing
/// `/`. Only [`KeyPath::to_fs_path`] restricts them, since a segment there
/// becomes a directory name.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a `/`-separated key path.
    ///
    /// Empty pieces are ignored, so `a//b/` and `a/b` are the same path. Use
    /// [`KeyPath::new`] for segments that contain `/` or are empty.
    ///
    /// ```rust
    /// use paramfs_tree::KeyPath;
    ///
    /// let path = KeyPath::parse("encoder/layer0/weight").unwrap();
    /// assert_eq!(path.len(), 3);
    /// assert_eq!(KeyPath::parse("a//b/").unwrap(), KeyPath::parse("a/b").unwrap());
    /// assert!(KeyPath::parse("").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, KeyPathError> {
        Self::new(s.split('/').filter(|c| !c.is_empty()).map(str::to_string))
    }

    /// Build a key path from segments taken verbatim.
    pub fn new<I, S>(segments: I) -> Result<Self, KeyPathError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(KeyPathError::Empty);
        }
        Ok(KeyPath { segments })
    }

    /// Wrap segments already known to be non-empty.
    pub(crate) fn from_validated(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty());
        KeyPath { segments }
    }

    /// A single-segment key path.
    pub fn single(segment: impl Into<String>) -> Self {
        KeyPath {
            segments: vec![segment.into()],
        }
    }

    /// Check that `name` works as one directory name: not empty, not `.` or
    /// `..`, and free of `/` and NUL.
    pub fn check_dir_name(name: &str) -> Result<(), KeyPathError> {
        Self::check_segment_at(name, 0)
    }

    fn check_segment_at(segment: &str, position: usize) -> Result<(), KeyPathError> {
        let invalid = |message: String| KeyPathError::InvalidSegment {
            segment: segment.to_string(),
            position,
            message,
        };

        if segment.is_empty() {
            return Err(invalid("empty segment".to_string()));
        }
        if segment == "." || segment == ".." {
            return Err(invalid("relative directory names are not allowed".to_string()));
        }
        if let Some(c) = segment.chars().find(|c| *c == '/' || *c == '\0') {
            return Err(invalid(format!("invalid character {:?} in segment", c)));
        }
        Ok(())
    }

    /// Number of segments. Always at least one.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Key paths are never empty; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.segments.iter()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The final segment.
    pub fn last(&self) -> &str {
        // Non-empty by construction.
        &self.segments[self.segments.len() - 1]
    }

    /// Everything but the final segment. May be empty.
    pub fn parent_segments(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// The parent path, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.segments.len() == 1 {
            None
        } else {
            Some(KeyPath {
                segments: self.parent_segments().to_vec(),
            })
        }
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// A new path extended by one segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> KeyPath {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Join this path with another.
    #[must_use]
    pub fn join(&self, other: &KeyPath) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        KeyPath { segments }
    }

    /// Check if this path has the given prefix.
    pub fn has_prefix(&self, prefix: &KeyPath) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix.segments == self.segments[..prefix.segments.len()]
    }

    /// Strip a strict prefix from this path.
    ///
    /// Returns `None` if the prefix doesn't match, or if nothing would remain.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &KeyPath) -> Option<KeyPath> {
        if self.has_prefix(prefix) && prefix.len() < self.len() {
            Some(KeyPath {
                segments: self.segments[prefix.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// Resolve this key path to a location under `root`, one directory per
    /// segment.
    ///
    /// Fails with [`KeyPathError::InvalidSegment`] if a segment is not a
    /// usable directory name (see [`KeyPath::check_dir_name`]).
    pub fn to_fs_path(&self, root: &Path) -> Result<PathBuf, KeyPathError> {
        let mut path = root.to_path_buf();
        for (i, segment) in self.segments.iter().enumerate() {
            Self::check_segment_at(segment, i)?;
            path.push(segment);
        }
        Ok(path)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl std::ops::Index<usize> for KeyPath {
    type Output = String;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

impl std::str::FromStr for KeyPath {
    type Err = KeyPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPath::parse(s)
    }
}

impl<'a> IntoIterator for &'a KeyPath {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Macro for key path literals.
///
/// # Example
///
/// ```rust
/// use paramfs_tree::keypath;
///
/// let p = keypath!("encoder/layer0");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! keypath {
    ($s:expr) => {
        $crate::KeyPath::parse($s).expect("invalid key path literal")
    };
}
