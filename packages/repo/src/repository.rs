//! Locating the repository and the hidden directories ParamFS keeps in it.

use std::fs;
use std::path::{Path, PathBuf};

use paramfs_tree::KeyPath;

use crate::config::Config;
use crate::error::{Error, Result};

/// Marker entry identifying a repository root.
const REPO_MARKER: &str = ".git";
const ATTRIBUTES_FILE: &str = ".gitattributes";
const STAGED_SUFFIX: &str = ".staged.json";

/// A repository working tree and the ParamFS control directory inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    root: PathBuf,
    /// Base for relative checkpoint paths.
    working_dir: PathBuf,
    control_dir_name: String,
}

impl Repository {
    /// Find the repository containing `start`, searching parent directories.
    ///
    /// Relative checkpoint paths are later resolved against `start`.
    pub fn discover(start: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let start = start.as_ref();
        let start = start
            .canonicalize()
            .map_err(|error| Error::io(start, error))?;

        for dir in start.ancestors() {
            if dir.join(REPO_MARKER).exists() {
                log::debug!("Found repository root {}", dir.display());
                let mut repo = Self::at(dir, config)?;
                repo.working_dir = start.clone();
                return Ok(repo);
            }
        }

        Err(Error::RepoNotFound { start })
    }

    /// Use `root` as the repository root without searching. Relative
    /// checkpoint paths are resolved against `root`.
    pub fn at(root: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        KeyPath::check_dir_name(&config.control_dir).map_err(|e| {
            Error::config(format!("control_dir must be a single directory name: {}", e))
        })?;
        let root = root.into();
        Ok(Repository {
            working_dir: root.clone(),
            root,
            control_dir_name: config.control_dir.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// `path` made absolute against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// `<root>/<control dir>`, created if missing.
    pub fn control_dir(&self) -> Result<PathBuf> {
        let dir = self.root.join(&self.control_dir_name);
        create_dir_if_missing(&dir)?;
        Ok(dir)
    }

    /// `<control dir>/<checkpoint name>`, created if missing.
    pub fn checkpoint_dir(&self, checkpoint_path: impl AsRef<Path>) -> Result<PathBuf> {
        let name = checkpoint_name(checkpoint_path.as_ref())?;
        let dir = self.control_dir()?.join(name);
        create_dir_if_missing(&dir)?;
        Ok(dir)
    }

    /// Where the staged metadata for a checkpoint lives.
    pub fn staged_path(&self, checkpoint_path: impl AsRef<Path>) -> Result<PathBuf> {
        let name = checkpoint_name(checkpoint_path.as_ref())?;
        Ok(self.control_dir()?.join(format!("{}{}", name, STAGED_SUFFIX)))
    }

    /// The attribute-rules file at the repository root.
    pub fn attributes_path(&self) -> PathBuf {
        self.root.join(ATTRIBUTES_FILE)
    }

    /// `path` relative to the repository root, if it is inside it.
    pub fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.root).ok()
    }
}

/// The name a checkpoint is stored under: its file name without extension.
pub fn checkpoint_name(checkpoint_path: &Path) -> Result<String> {
    let invalid = |message: &str| Error::InvalidCheckpointPath {
        path: checkpoint_path.to_path_buf(),
        message: message.to_string(),
    };

    let stem = checkpoint_path
        .file_stem()
        .ok_or_else(|| invalid("no file name"))?
        .to_str()
        .ok_or_else(|| invalid("file name is not valid UTF-8"))?;
    KeyPath::check_dir_name(stem).map_err(|e| invalid(&e.to_string()))?;
    Ok(stem.to_string())
}

fn create_dir_if_missing(dir: &Path) -> Result<()> {
    if !dir.exists() {
        log::debug!("Creating directory {}", dir.display());
        fs::create_dir_all(dir).map_err(|error| Error::io(dir, error))?;
    }
    Ok(())
}
