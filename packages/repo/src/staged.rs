//! The small JSON record kept for a pending change.
//!
//! Handles are either paths ([`load_staged`], [`save_staged`]) or already
//! open streams ([`read_staged`], [`write_staged`]).

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

pub type StagedMetadata = Map<String, JsonValue>;

pub fn read_staged<R: Read>(reader: R) -> Result<StagedMetadata> {
    Ok(serde_json::from_reader(reader)?)
}

/// Write `metadata` with four-space indentation.
pub fn write_staged<W: Write>(writer: W, metadata: &StagedMetadata) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    metadata.serialize(&mut serializer)?;
    Ok(())
}

pub fn load_staged(path: impl AsRef<Path>) -> Result<StagedMetadata> {
    let path = path.as_ref();
    let file = fs::File::open(path).map_err(|error| Error::io(path, error))?;
    read_staged(io::BufReader::new(file))
}

pub fn save_staged(path: impl AsRef<Path>, metadata: &StagedMetadata) -> Result<()> {
    let path = path.as_ref();
    log::debug!("Writing staged metadata to {}", path.display());

    let file = fs::File::create(path).map_err(|error| Error::io(path, error))?;
    let mut writer = io::BufWriter::new(file);
    write_staged(&mut writer, metadata)?;
    writer.flush().map_err(|error| Error::io(path, error))
}
