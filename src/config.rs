use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::schema::InferenceOptions;

pub const DEFAULT_STORE_PATH: &str = "tracker.json";

/// Optional YAML settings file.
///
/// ```yaml
/// store: data/sheets.json
/// inference:
///   max_select_options: 8
///   label_column_select: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: Option<PathBuf>,
    pub inference: InferenceOptions,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("Opening config file {path:?}"))?;
        Self::from_yaml(&raw).with_context(|| format!("Parsing config file {path:?}"))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Loads `path` when given; without one the defaults apply.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let config = Self::load(path)?;
                debug!("Loaded config from {path:?}: {config:?}");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// The store path: the command-line value wins, then the config file,
    /// then [`DEFAULT_STORE_PATH`].
    pub fn store_path(&self, cli_store: Option<&Path>) -> PathBuf {
        cli_store
            .map(Path::to_path_buf)
            .or_else(|| self.store.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
