use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to the user by the `paramfs` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Repo(#[from] paramfs_repo::Error),

    #[error(transparent)]
    Tree(#[from] paramfs_tree::Error),

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
