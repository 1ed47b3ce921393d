use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Paths and policy the engine runs with. Passed in at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding one subdirectory per backup unit
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Live media tree captured and restored by the pipelines
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Parent directory for per-operation scratch space
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Age after which automatic backups are pruned
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("media")
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_retention_days() -> u32 {
    60
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            media_dir: default_media_dir(),
            scratch_dir: default_scratch_dir(),
            retention_days: default_retention_days(),
        }
    }
}

impl EngineConfig {
    pub fn new(root_dir: impl Into<PathBuf>, media_dir: impl Into<PathBuf>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            media_dir: media_dir.into(),
            scratch_dir: scratch_dir.into(),
            retention_days: default_retention_days(),
        }
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.retention_days = days;
        self
    }
}
