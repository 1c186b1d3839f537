//! # paramfs-cli
//!
//! The `paramfs` command: stores model checkpoints as a directory per
//! parameter inside a git repository, so changes are tracked parameter by
//! parameter.
//!
//! ## Usage
//!
//! ```bash
//! # Route model.json through ParamFS and track its parameters with LFS
//! paramfs track model.json
//!
//! # Store the current parameters and stage them
//! paramfs add model.json
//!
//! # Rebuild the checkpoint from stored parameters
//! paramfs checkout model.json -o restored.json
//!
//! # Parameters dropped between two checkpoint files
//! paramfs removed new.json old.json
//! ```

pub mod commands;
mod error;

use std::io;
use std::path::PathBuf;

use clap::Subcommand;
use paramfs_repo::{Checkpoints, Config, GitCommand, JsonParamStore, Repository};

pub use error::{CliError, Result};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Set up large-file tracking and the attribute rule for a checkpoint
    Track { checkpoint: PathBuf },

    /// Store a checkpoint's parameters and stage them
    Add { checkpoint: PathBuf },

    /// Rebuild a checkpoint from its stored parameters
    Checkout {
        checkpoint: PathBuf,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the stored parameters of a checkpoint
    Ls { checkpoint: PathBuf },

    /// Print parameters present in OLD but missing from NEW
    Removed { new: PathBuf, old: PathBuf },
}

/// Run one subcommand against the repository containing the working
/// directory.
pub fn run(command: Command) -> Result<()> {
    log::debug!("Running {:?}", command);
    let mut out = io::stdout().lock();

    // Comparing two files needs no repository.
    if let Command::Removed { new, old } = &command {
        return commands::removed(new, old, &mut out);
    }

    let config = Config::from_env()?;
    config.require_supported_format()?;
    let cwd = std::env::current_dir().map_err(|e| CliError::io(".", e))?;
    let repo = Repository::discover(&cwd, &config)?;
    let vcs = GitCommand::new(&repo);
    let checkpoints = Checkpoints::new(repo, config, JsonParamStore::new(), vcs);

    match command {
        Command::Track { checkpoint } => commands::track(&checkpoints, &checkpoint, &mut out),
        Command::Add { checkpoint } => commands::add(&checkpoints, &checkpoint, &mut out),
        Command::Checkout { checkpoint, output } => {
            commands::checkout(&checkpoints, &checkpoint, output.as_deref(), &mut out)
        }
        Command::Ls { checkpoint } => commands::ls(&checkpoints, &checkpoint, &mut out),
        Command::Removed { new, old } => commands::removed(&new, &old, &mut out),
    }
}
