//! The version-control boundary.
//!
//! Every operation either succeeds or reports the failing command; nothing
//! is retried or rolled back here.

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::repository::Repository;

pub trait VersionControl {
    /// Stage a file or directory.
    fn add(&self, path: &Path) -> Result<()>;

    /// Register the large-file filter.
    fn lfs_install(&self) -> Result<()>;

    /// Mark everything under `directory` for large-file tracking.
    fn lfs_track(&self, directory: &Path) -> Result<()>;
}

impl<T: VersionControl + ?Sized> VersionControl for &T {
    fn add(&self, path: &Path) -> Result<()> {
        (**self).add(path)
    }

    fn lfs_install(&self) -> Result<()> {
        (**self).lfs_install()
    }

    fn lfs_track(&self, directory: &Path) -> Result<()> {
        (**self).lfs_track(directory)
    }
}

/// The glob tracking everything under `directory`, relative to `root` and
/// `/`-separated regardless of platform.
pub fn track_glob(root: &Path, directory: &Path) -> Result<String> {
    let relative = directory
        .strip_prefix(root)
        .map_err(|_| Error::OutsideRepository {
            path: directory.to_path_buf(),
        })?;

    let mut parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.push("**".to_string());
    Ok(parts.join("/"))
}

/// Runs the `git` binary in the repository root.
#[derive(Debug, Clone)]
pub struct GitCommand {
    root: PathBuf,
    program: OsString,
}

impl GitCommand {
    pub fn new(repo: &Repository) -> Self {
        GitCommand {
            root: repo.root().to_path_buf(),
            program: OsString::from("git"),
        }
    }

    /// Use a different executable in place of `git`.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    fn run(&self, args: &[&OsStr]) -> Result<()> {
        let command = std::iter::once(self.program.as_os_str())
            .chain(args.iter().copied())
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        log::debug!("Running `{}` in {}", command, self.root.display());

        let status = Command::new(&self.program)
            .args(args)
            .current_dir(&self.root)
            .status()
            .map_err(|source| Error::CommandSpawn {
                command: command.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::CommandFailed { command, status })
        }
    }
}

impl VersionControl for GitCommand {
    fn add(&self, path: &Path) -> Result<()> {
        log::debug!("Adding {} to staging area", path.display());
        self.run(&[OsStr::new("add"), path.as_os_str()])
    }

    fn lfs_install(&self) -> Result<()> {
        self.run(&[OsStr::new("lfs"), OsStr::new("install")])
    }

    fn lfs_track(&self, directory: &Path) -> Result<()> {
        let glob = track_glob(&self.root, directory)?;
        self.run(&[OsStr::new("lfs"), OsStr::new("track"), OsStr::new(&glob)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn track_glob_is_relative() {
        let glob = track_glob(Path::new("/repo"), Path::new("/repo/.paramfs/bert")).unwrap();
        assert_eq!(glob, ".paramfs/bert/**");
    }

    #[test]
    fn track_glob_outside_repo_fails() {
        assert!(matches!(
            track_glob(Path::new("/repo"), Path::new("/elsewhere/bert")),
            Err(Error::OutsideRepository { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn zero_status_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::at(dir.path(), &Config::default()).unwrap();
        let vcs = GitCommand::new(&repo).with_program("true");
        vcs.lfs_install().unwrap();
        vcs.add(Path::new("anything")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_status_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::at(dir.path(), &Config::default()).unwrap();
        let vcs = GitCommand::new(&repo).with_program("false");
        match vcs.lfs_install() {
            Err(Error::CommandFailed { command, status }) => {
                assert_eq!(command, "false lfs install");
                assert!(!status.success());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_program_reports_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::at(dir.path(), &Config::default()).unwrap();
        let vcs = GitCommand::new(&repo).with_program("paramfs-no-such-binary");
        assert!(matches!(
            vcs.lfs_install(),
            Err(Error::CommandSpawn { .. })
        ));
    }
}
