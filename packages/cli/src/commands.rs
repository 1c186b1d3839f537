//! One function per subcommand. Output goes to the writer passed in.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use paramfs_repo::{Checkpoints, JsonParamStore, VersionControl};
use paramfs_tree::{removed as removed_params, Tree};
use serde_json::Value as JsonValue;

use crate::error::{CliError, Result};

type JsonCheckpoints<C> = Checkpoints<JsonParamStore, C>;

/// Read a checkpoint file into a parameter tree.
pub fn read_tree(path: &Path) -> Result<Tree<JsonValue>> {
    let contents = fs::read(path).map_err(|e| CliError::io(path, e))?;
    let value: JsonValue = serde_json::from_slice(&contents).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Tree::from_json(&value)?)
}

pub fn track<C: VersionControl>(
    checkpoints: &JsonCheckpoints<C>,
    checkpoint: &Path,
    out: &mut impl Write,
) -> Result<()> {
    if checkpoints.track(checkpoint)? {
        writeln!(out, "Tracking {}", checkpoint.display()).map_err(stdout_error)?;
    } else {
        writeln!(out, "{} is already tracked", checkpoint.display()).map_err(stdout_error)?;
    }
    Ok(())
}

/// Store the parameters of a checkpoint file and stage them.
pub fn add<C: VersionControl>(
    checkpoints: &JsonCheckpoints<C>,
    checkpoint: &Path,
    out: &mut impl Write,
) -> Result<()> {
    let tree = read_tree(checkpoint)?;
    let report = checkpoints.save(checkpoint, &tree)?;
    checkpoints.stage(checkpoint, &report)?;

    writeln!(
        out,
        "Stored {} parameters, removed {}",
        report.written.len(),
        report.removed.len()
    )
    .map_err(stdout_error)?;
    for key in &report.removed {
        writeln!(out, "  - {}", key).map_err(stdout_error)?;
    }
    Ok(())
}

/// Rebuild a checkpoint from stored parameters, into `output` or `out`.
pub fn checkout<C: VersionControl>(
    checkpoints: &JsonCheckpoints<C>,
    checkpoint: &Path,
    output: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    let value = checkpoints.load(checkpoint)?.into_json();
    match output {
        Some(path) => {
            let file = fs::File::create(path).map_err(|e| CliError::io(path, e))?;
            let mut writer = io::BufWriter::new(file);
            write_json(&mut writer, &value).map_err(|e| CliError::io(path, e))?;
            writer.flush().map_err(|e| CliError::io(path, e))
        }
        None => write_json(out, &value).map_err(stdout_error),
    }
}

pub fn ls<C: VersionControl>(
    checkpoints: &JsonCheckpoints<C>,
    checkpoint: &Path,
    out: &mut impl Write,
) -> Result<()> {
    for key in checkpoints.list(checkpoint)?.keys() {
        writeln!(out, "{}", key).map_err(stdout_error)?;
    }
    Ok(())
}

/// Print the parameters of `old` that no longer exist in `new`.
pub fn removed(new: &Path, old: &Path, out: &mut impl Write) -> Result<()> {
    let new_tree = read_tree(new)?;
    let old_tree = read_tree(old)?;
    for key in removed_params(&new_tree, &old_tree).paths() {
        writeln!(out, "{}", key).map_err(stdout_error)?;
    }
    Ok(())
}

fn write_json(out: &mut impl Write, value: &JsonValue) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

fn stdout_error(error: io::Error) -> CliError {
    CliError::io("<stdout>", error)
}
