//! Repository plumbing for ParamFS.
//!
//! Ties a [`paramfs_tree::Tree`] to a version-controlled working tree:
//! configuration, the control directory holding stored checkpoints, the
//! parameter persistence backend and the `git` boundary.
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use paramfs_repo::{Checkpoints, Config, GitCommand, JsonParamStore, Repository};
//!
//! # fn main() -> paramfs_repo::Result<()> {
//! let config = Config::from_env()?;
//! let repo = Repository::discover(".", &config)?;
//! let vcs = GitCommand::new(&repo);
//! let checkpoints = Checkpoints::new(repo, config, JsonParamStore::new(), vcs);
//!
//! let tree = checkpoints.load(Path::new("model.json"))?;
//! println!("{} parameters", tree.leaf_count());
//! # Ok(())
//! # }
//! ```

mod attributes;
mod checkpoint;
mod config;
mod error;
mod param_store;
mod repository;
mod staged;
mod vcs;

pub use attributes::{add_filter_rule, read_attributes, write_attributes};
pub use checkpoint::{Checkpoints, SaveReport, FILTER_NAME};
pub use config::{
    Config, Identifier, CHECKPOINT_TYPE_VAR, JSON_FORMAT, STRAY_ENTRIES_VAR, UPDATE_TYPE_VAR,
};
pub use error::{Error, Result};
pub use param_store::{JsonParamStore, ParamStore};
pub use repository::{checkpoint_name, Repository};
pub use staged::{load_staged, read_staged, save_staged, write_staged, StagedMetadata};
pub use vcs::{track_glob, GitCommand, VersionControl};
