//! Checkpoint workflows: storing a parameter tree in the control directory,
//! reading it back, and registering it with version control.
//!
//! On disk a checkpoint named `bert` lives in `<control>/bert/`, one leaf
//! directory per parameter, mirroring the tree's structure.

use std::fs;
use std::path::{Component, Path, PathBuf};

use paramfs_tree::{
    parameter_dir, removed, unflatten, walk_parameter_dir_with, FlatTree, KeyPath, Tree,
};
use serde_json::json;

use crate::attributes::{add_filter_rule, read_attributes, write_attributes};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::param_store::ParamStore;
use crate::repository::{checkpoint_name, Repository};
use crate::staged::{save_staged, StagedMetadata};
use crate::vcs::VersionControl;

/// Filter name used in attribute rules.
pub const FILTER_NAME: &str = "paramfs";

/// What [`Checkpoints::save`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Every parameter written, in key path order.
    pub written: Vec<KeyPath>,
    /// Parameters that were on disk but are absent from the new tree.
    pub removed: Vec<KeyPath>,
}

pub struct Checkpoints<S, C> {
    repo: Repository,
    config: Config,
    store: S,
    vcs: C,
}

impl<S, C> Checkpoints<S, C>
where
    S: ParamStore,
    S::Value: Clone,
    C: VersionControl,
{
    pub fn new(repo: Repository, config: Config, store: S, vcs: C) -> Self {
        Checkpoints {
            repo,
            config,
            store,
            vcs,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn vcs(&self) -> &C {
        &self.vcs
    }

    /// The parameter directories currently stored for a checkpoint.
    pub fn list(&self, checkpoint_path: &Path) -> Result<FlatTree<PathBuf>> {
        let dir = self.repo.checkpoint_dir(checkpoint_path)?;
        Ok(walk_parameter_dir_with(&dir, self.config.stray_entries)?.into_flat())
    }

    /// Store every leaf of `tree`, replacing what was stored before.
    ///
    /// Every key path is checked before anything on disk changes; a key
    /// that cannot be stored (see [`parameter_dir`]) fails the whole save.
    /// Stale parameters are deleted before anything is written, so a
    /// parameter that turned into a group (or the reverse) never collides
    /// with its old directory.
    pub fn save(&self, checkpoint_path: &Path, tree: &Tree<S::Value>) -> Result<SaveReport> {
        let dir = self.repo.checkpoint_dir(checkpoint_path)?;

        let params = tree.flatten();
        let targets = params
            .keys()
            .map(|key| parameter_dir(&dir, key).map(|leaf_dir| (key.clone(), leaf_dir)))
            .collect::<paramfs_tree::Result<FlatTree<PathBuf>>>()?;

        let on_disk = walk_parameter_dir_with(&dir, self.config.stray_entries)?;

        let stale = removed(&targets, &on_disk);
        for (key, leaf_dir) in stale.entries() {
            log::debug!("Removing stale parameter {}", key);
            remove_leaf(leaf_dir, &dir)?;
        }

        // Both maps share the same keys, in the same order.
        for (value, leaf_dir) in params.values().zip(targets.values()) {
            self.store.save(leaf_dir, value)?;
        }

        Ok(SaveReport {
            written: params.keys().cloned().collect(),
            removed: stale.paths().cloned().collect(),
        })
    }

    /// Rebuild the parameter tree stored for a checkpoint.
    pub fn load(&self, checkpoint_path: &Path) -> Result<Tree<S::Value>> {
        let values = self
            .list(checkpoint_path)?
            .try_map_values(|_, leaf_dir| self.store.load(&leaf_dir))?;
        Ok(unflatten(values)?)
    }

    /// Record staged metadata for a saved checkpoint and stage it, along
    /// with the checkpoint's parameter directory.
    pub fn stage(&self, checkpoint_path: &Path, report: &SaveReport) -> Result<PathBuf> {
        let name = checkpoint_name(checkpoint_path)?;
        let staged_path = self.repo.staged_path(checkpoint_path)?;

        let mut metadata = StagedMetadata::new();
        metadata.insert("checkpoint".to_string(), json!(name));
        metadata.insert(
            "checkpoint_format".to_string(),
            json!(self.config.checkpoint_format.as_str()),
        );
        metadata.insert(
            "update_strategy".to_string(),
            json!(self.config.update_strategy.as_str()),
        );
        metadata.insert("params".to_string(), json!(key_strings(&report.written)));
        metadata.insert("removed".to_string(), json!(key_strings(&report.removed)));
        save_staged(&staged_path, &metadata)?;

        self.vcs.add(&self.repo.checkpoint_dir(checkpoint_path)?)?;
        self.vcs.add(&staged_path)?;
        Ok(staged_path)
    }

    /// Set up large-file tracking for a checkpoint and route the checkpoint
    /// file through the ParamFS filter. Returns whether the attribute rules
    /// changed.
    pub fn track(&self, checkpoint_path: &Path) -> Result<bool> {
        let pattern = self.attribute_pattern(checkpoint_path)?;

        self.vcs.lfs_install()?;
        self.vcs
            .lfs_track(&self.repo.checkpoint_dir(checkpoint_path)?)?;

        let attributes = self.repo.attributes_path();
        let mut lines = read_attributes(&attributes)?;
        let changed = add_filter_rule(&mut lines, &pattern, FILTER_NAME);
        if changed {
            write_attributes(&attributes, &lines)?;
        }
        self.vcs.add(&attributes)?;
        Ok(changed)
    }

    /// The checkpoint path as a `/`-separated pattern relative to the root.
    /// Relative paths are taken from the repository's working directory.
    fn attribute_pattern(&self, checkpoint_path: &Path) -> Result<String> {
        let outside = || Error::OutsideRepository {
            path: checkpoint_path.to_path_buf(),
        };
        let absolute = self.repo.resolve(checkpoint_path);
        let relative = self.repo.relative(&absolute).ok_or_else(outside)?;

        let mut parts: Vec<String> = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::ParentDir => {
                    parts.pop().ok_or_else(outside)?;
                }
                _ => {}
            }
        }
        if parts.is_empty() {
            return Err(Error::InvalidCheckpointPath {
                path: checkpoint_path.to_path_buf(),
                message: "empty path".to_string(),
            });
        }
        Ok(parts.join("/"))
    }
}

fn key_strings(keys: &[KeyPath]) -> Vec<String> {
    keys.iter().map(ToString::to_string).collect()
}

/// Delete a leaf directory, then any parents it leaves empty, stopping at
/// `stop`.
fn remove_leaf(leaf_dir: &Path, stop: &Path) -> Result<()> {
    fs::remove_dir_all(leaf_dir).map_err(|error| Error::io(leaf_dir, error))?;

    let mut parent = leaf_dir.parent();
    while let Some(dir) = parent {
        if dir == stop || !dir.starts_with(stop) {
            break;
        }
        let is_empty = fs::read_dir(dir)
            .map_err(|error| Error::io(dir, error))?
            .next()
            .is_none();
        if !is_empty {
            break;
        }
        fs::remove_dir(dir).map_err(|error| Error::io(dir, error))?;
        parent = dir.parent();
    }
    Ok(())
}
