//! Shared fixtures for engine tests.

use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::engine::BackupEngine;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const FAKE_DUMP: &str = r#"[{"model": "inventory.product", "pk": 1}]"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Dump(Vec<String>),
    Clear,
    Load(String),
}

#[derive(Default)]
pub struct FakeDataset {
    pub calls: Mutex<Vec<Call>>,
    pub fail_dump: Mutex<bool>,
    pub fail_load: Mutex<bool>,
    pub block_media: Mutex<bool>,
}

impl FakeDataset {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_dump(&self) {
        *self.fail_dump.lock().unwrap() = true;
    }

    pub fn fail_load(&self) {
        *self.fail_load.lock().unwrap() = true;
    }

    /// Dump also drops a plain file where the unit's media mirror goes.
    pub fn block_media(&self) {
        *self.block_media.lock().unwrap() = true;
    }
}

#[async_trait]
impl Dataset for FakeDataset {
    async fn dump(&self, output: &Path, exclusions: &[String]) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Dump(exclusions.to_vec()));
        if *self.fail_dump.lock().unwrap() {
            return Err(Error::Dataset("dump exploded".to_string()));
        }
        tokio::fs::write(output, FAKE_DUMP).await?;
        let block_media = *self.block_media.lock().unwrap();
        if block_media {
            tokio::fs::write(output.with_file_name("media"), b"in the way").await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Clear);
        Ok(())
    }

    async fn load(&self, input: &Path) -> Result<()> {
        let data = tokio::fs::read_to_string(input).await?;
        self.calls.lock().unwrap().push(Call::Load(data));
        if *self.fail_load.lock().unwrap() {
            return Err(Error::Dataset("load exploded".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub dataset: Arc<FakeDataset>,
    pub engine: BackupEngine,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(
            dir.path().join("backups"),
            dir.path().join("media"),
            dir.path().join("scratch"),
        );
        std::fs::create_dir_all(&config.media_dir).unwrap();
        let dataset = Arc::new(FakeDataset::default());
        let engine = BackupEngine::local(config, dataset.clone());
        Self { dir, dataset, engine }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("backups")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }
}
