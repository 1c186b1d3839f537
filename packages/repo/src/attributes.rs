//! Reading and editing the repository's attribute-rules file.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Read the rules file as lines (without terminators). A missing file reads
/// as no lines.
pub fn read_attributes(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(error) => Err(Error::io(path, error)),
    }
}

/// Replace the rules file with `lines`, one per line.
pub fn write_attributes(path: impl AsRef<Path>, lines: &[String]) -> Result<()> {
    let path = path.as_ref();
    log::debug!("Writing {} attribute rules to {}", lines.len(), path.display());

    let mut f = fs::File::create(path).map_err(|error| Error::io(path, error))?;
    for line in lines {
        writeln!(f, "{}", line).map_err(|error| Error::io(path, error))?;
    }
    Ok(())
}

/// Route `pattern` through `filter`, unless a rule for that pattern already
/// does. Returns whether `lines` changed.
pub fn add_filter_rule(lines: &mut Vec<String>, pattern: &str, filter: &str) -> bool {
    let filter_attr = format!("filter={}", filter);
    let exists = lines.iter().any(|line| {
        let mut fields = line.split_whitespace();
        fields.next() == Some(pattern) && fields.any(|attr| attr == filter_attr)
    });
    if exists {
        return false;
    }

    lines.push(format!(
        "{} filter={} diff={} merge={}",
        pattern, filter, filter, filter
    ));
    true
}
