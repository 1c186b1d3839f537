use std::path::PathBuf;

use paramfs_tree::Error as TreeError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No repository found at or above {start:?}")]
    RepoNotFound { start: PathBuf },

    #[error("Command `{command}` failed with {status}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
    },

    #[error("Command `{command}` could not be started: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path {path:?} is outside the repository")]
    OutsideRepository { path: PathBuf },

    #[error("Invalid checkpoint path {path:?}: {message}")]
    InvalidCheckpointPath { path: PathBuf, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_error_converts() {
        let e: Error = TreeError::StrayEntry {
            path: PathBuf::from("/x/README"),
        }
        .into();
        assert!(matches!(e, Error::Tree(_)));
        assert!(e.to_string().contains("README"));
    }

    #[test]
    fn config_error_display() {
        let e = Error::config("unknown format 'npz'");
        assert_eq!(e.to_string(), "Configuration error: unknown format 'npz'");
    }

    #[test]
    fn repo_not_found_display() {
        let e = Error::RepoNotFound {
            start: PathBuf::from("/tmp/nowhere"),
        };
        assert!(e.to_string().contains("/tmp/nowhere"));
    }
}
