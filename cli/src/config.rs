//! Configuration file handling.
//!
//! Loads `config.toml` from `--config` or the platform config directory;
//! command-line flags and `STASHBOX_*` variables override it.

use anyhow::{anyhow, Context as _, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use stashbox_backends::{CommandConfig, CommandDataset, JsonFileDataset};
use stashbox_core::{Dataset, EngineConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Records left out of every dump; the built-in list when absent
    #[serde(default)]
    pub exclusions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DatasetConfig {
    Command(CommandConfig),
    JsonFile { path: PathBuf },
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig::Command(CommandConfig::default())
    }
}

impl DatasetConfig {
    pub fn build(&self) -> Arc<dyn Dataset> {
        match self {
            DatasetConfig::Command(config) => Arc::new(CommandDataset::new(config.clone())),
            DatasetConfig::JsonFile { path } => Arc::new(JsonFileDataset::new(path)),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(anyhow!("Config file not found: {}", path.display()));
            }
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "Loading config");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn apply_overrides(&mut self, root: Option<&Path>, media: Option<&Path>, scratch: Option<&Path>) {
        if let Some(root) = root {
            self.engine.root_dir = root.to_path_buf();
        }
        if let Some(media) = media {
            self.engine.media_dir = media.to_path_buf();
        }
        if let Some(scratch) = scratch {
            self.engine.scratch_dir = scratch.to_path_buf();
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "stashbox").map(|dirs| dirs.config_dir().join("config.toml"))
}
