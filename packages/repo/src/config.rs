//! Process-wide settings, resolved once and passed in explicitly.
//!
//! The environment is read in exactly one place, [`Config::from_env`], which
//! the binary calls at startup. Library code only ever sees a `Config`.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use paramfs_tree::StrayEntryPolicy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Selects the checkpoint format.
pub const CHECKPOINT_TYPE_VAR: &str = "PARAMFS_CHECKPOINT_TYPE";
/// Selects the update strategy recorded with staged changes.
pub const UPDATE_TYPE_VAR: &str = "PARAMFS_UPDATE_TYPE";
/// `error` or `skip`; see [`StrayEntryPolicy`].
pub const STRAY_ENTRIES_VAR: &str = "PARAMFS_STRAY_ENTRIES";

/// The only checkpoint format with a persistence backend today.
pub const JSON_FORMAT: &str = "json";

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// A short lowercase name such as `json` or `dense`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !IDENTIFIER.is_match(s) {
            return Err(Error::config(format!(
                "'{}' is not a valid identifier (letters, digits, '-' and '_' only)",
                s
            )));
        }
        Ok(Identifier(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Identifier {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub checkpoint_format: Identifier,
    pub update_strategy: Identifier,
    pub stray_entries: StrayEntryPolicy,
    /// Hidden directory under the repository root holding stored parameters.
    pub control_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            checkpoint_format: Identifier(JSON_FORMAT.to_string()),
            update_strategy: Identifier("dense".to_string()),
            stray_entries: StrayEntryPolicy::Error,
            control_dir: ".paramfs".to_string(),
        }
    }
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Resolve configuration from `(name, value)` pairs, starting from the
    /// defaults. Unrelated variables are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Config::default();
        for (name, value) in vars {
            let value = value.as_ref();
            match name.as_ref() {
                CHECKPOINT_TYPE_VAR => config.checkpoint_format = value.parse()?,
                UPDATE_TYPE_VAR => config.update_strategy = value.parse()?,
                STRAY_ENTRIES_VAR => {
                    config.stray_entries = match value.trim().to_ascii_lowercase().as_str() {
                        "error" => StrayEntryPolicy::Error,
                        "skip" => StrayEntryPolicy::Skip,
                        other => {
                            return Err(Error::config(format!(
                                "{} must be 'error' or 'skip', got '{}'",
                                STRAY_ENTRIES_VAR, other
                            )))
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// Fail unless a persistence backend exists for the selected format.
    pub fn require_supported_format(&self) -> Result<()> {
        if self.checkpoint_format.as_str() == JSON_FORMAT {
            Ok(())
        } else {
            Err(Error::config(format!(
                "unsupported checkpoint format '{}'",
                self.checkpoint_format
            )))
        }
    }
}
