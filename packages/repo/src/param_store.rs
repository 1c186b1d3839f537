//! The persistence backend: one stored parameter per leaf directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use paramfs_tree::PARAMS_ENTRY;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// Reads and writes the payload of a single parameter.
///
/// A store is addressed by leaf directory. Whatever it writes there must
/// include an entry named [`PARAMS_ENTRY`], so the directory is recognised
/// as a leaf when the checkpoint is mirrored back.
pub trait ParamStore {
    type Value;

    fn load(&self, leaf_dir: &Path) -> Result<Self::Value>;

    fn save(&self, leaf_dir: &Path, value: &Self::Value) -> Result<()>;
}

const VALUE_FILE: &str = "value.json";

/// Stores each parameter as `<leaf_dir>/params/value.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParamStore;

impl JsonParamStore {
    pub fn new() -> Self {
        JsonParamStore
    }

    fn value_path(leaf_dir: &Path) -> PathBuf {
        leaf_dir.join(PARAMS_ENTRY).join(VALUE_FILE)
    }
}

impl ParamStore for JsonParamStore {
    type Value = JsonValue;

    fn load(&self, leaf_dir: &Path) -> Result<JsonValue> {
        let file_path = Self::value_path(leaf_dir);
        log::debug!("Reading {}...", file_path.display());

        let file = fs::File::open(&file_path).map_err(|error| Error::io(&file_path, error))?;
        let reader = io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    fn save(&self, leaf_dir: &Path, value: &JsonValue) -> Result<()> {
        let file_path = Self::value_path(leaf_dir);
        log::debug!("Writing {}...", file_path.display());

        let params_dir = leaf_dir.join(PARAMS_ENTRY);
        fs::create_dir_all(&params_dir).map_err(|error| Error::io(&params_dir, error))?;
        let file = fs::File::create(&file_path).map_err(|error| Error::io(&file_path, error))?;
        serde_json::to_writer(io::BufWriter::new(file), value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramfs_tree::has_params_entry;
    use serde_json::json;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let leaf = dir.path().join("encoder/layer0/weight");
        let store = JsonParamStore::new();

        let value = json!([[0.25, -1.5], [3.0, 0.0]]);
        store.save(&leaf, &value).unwrap();
        assert_eq!(store.load(&leaf).unwrap(), value);
    }

    #[test]
    fn saved_dir_is_a_leaf() {
        let dir = tempfile::tempdir().unwrap();
        let leaf = dir.path().join("w");
        JsonParamStore.save(&leaf, &json!(1)).unwrap();
        assert!(has_params_entry(&leaf));
    }

    #[test]
    fn save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let leaf = dir.path().join("w");
        JsonParamStore.save(&leaf, &json!([1, 2, 3])).unwrap();
        JsonParamStore.save(&leaf, &json!(7)).unwrap();
        assert_eq!(JsonParamStore.load(&leaf).unwrap(), json!(7));
    }

    #[test]
    fn load_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            JsonParamStore.load(&dir.path().join("nope")),
            Err(Error::Io { .. })
        ));
    }

    #[test]
    fn load_corrupt_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let params = dir.path().join("w").join(PARAMS_ENTRY);
        fs::create_dir_all(&params).unwrap();
        fs::write(params.join(VALUE_FILE), b"{not json").unwrap();
        assert!(matches!(
            JsonParamStore.load(&dir.path().join("w")),
            Err(Error::Json(_))
        ));
    }
}
