use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::naming::{auto_name, manual_name, AUTO_PREFIX};
use crate::repository::{LocalRepository, UnitRepository};
use crate::types::{AutoBackupReport, CreateRequest, Unit, DEFAULT_DUMP_EXCLUSIONS};
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

/// Backup lifecycle engine.
///
/// Owns no in-memory state between calls: every operation re-reads the
/// repository. Operations on the same unit name are not serialized here,
/// callers that run them concurrently must do that themselves.
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use stashbox_core::{BackupEngine, CreateRequest, EngineConfig, Dataset};
/// # async fn run(dataset: Arc<dyn Dataset>) -> stashbox_core::Result<()> {
/// let engine = BackupEngine::local(EngineConfig::default(), dataset);
/// let unit = engine
///     .create(CreateRequest::new("admin", chrono::Utc::now()).with_media(true))
///     .await?;
/// println!("{}", unit.summary());
/// # Ok(())
/// # }
/// ```
pub struct BackupEngine {
    pub(crate) config: EngineConfig,
    pub(crate) repository: Arc<dyn UnitRepository>,
    pub(crate) dataset: Arc<dyn Dataset>,
    pub(crate) exclusions: Vec<String>,
}

impl BackupEngine {
    pub fn new(config: EngineConfig, repository: Arc<dyn UnitRepository>, dataset: Arc<dyn Dataset>) -> Self {
        Self {
            config,
            repository,
            dataset,
            exclusions: DEFAULT_DUMP_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Engine over a `LocalRepository` rooted at `config.root_dir`.
    pub fn local(config: EngineConfig, dataset: Arc<dyn Dataset>) -> Self {
        let repository = Arc::new(LocalRepository::new(&config.root_dir));
        Self::new(config, repository, dataset)
    }

    pub fn with_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> &dyn UnitRepository {
        self.repository.as_ref()
    }

    pub async fn ensure_root(&self) -> Result<()> {
        self.repository.ensure_root().await
    }

    /// All readable units, newest first.
    pub async fn list(&self) -> Result<Vec<Unit>> {
        let mut units = self.repository.list_units().await?;
        units.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(units)
    }

    pub async fn get(&self, name: &str) -> Result<Unit> {
        self.repository.get_unit(name).await
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        match self.repository.delete_unit_dir(name).await {
            Ok(()) => {
                info!(unit = %name, "Deleted backup");
                Ok(())
            }
            Err(e) => {
                error!(unit = %name, operation = "delete", error = %e, "Failed to delete backup");
                Err(e)
            }
        }
    }

    /// Creates `manual_<YYYYMMDD>_<HHMMSS>` with media.
    pub async fn create_manual(&self, identity: &str, now: DateTime<Utc>) -> Result<Unit> {
        let request = CreateRequest::new(identity, now)
            .with_name(manual_name(&now))
            .with_media(true);
        self.create(request).await
    }

    /// Creates today's `auto_backup_<YYYYMMDD>` and prunes expired ones.
    ///
    /// A re-run on the same day keeps the existing unit and still prunes.
    pub async fn auto_backup(&self, identity: &str, now: DateTime<Utc>) -> Result<AutoBackupReport> {
        let name = auto_name(&now);
        let request = CreateRequest::new(identity, now)
            .with_name(name.as_str())
            .with_media(self.config.media_dir.exists())
            .with_description("Automatic backup");

        let (unit, existed) = match self.create(request).await {
            Ok(unit) => (unit, false),
            Err(Error::AlreadyExists { .. }) => {
                info!(unit = %name, "Automatic backup for today already exists");
                (self.get(&name).await?, true)
            }
            Err(e) => return Err(e),
        };

        let pruned = self.prune(now).await?;
        Ok(AutoBackupReport { unit, existed, pruned })
    }

    /// Deletes automatic backups older than the retention window.
    ///
    /// A unit that fails to delete is logged and left in place.
    pub async fn prune(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let cutoff = now - Duration::days(i64::from(self.config.retention_days));
        let mut pruned = Vec::new();

        for unit in self.repository.list_units().await? {
            if !unit.name.starts_with(AUTO_PREFIX) || unit.created_at() >= cutoff {
                continue;
            }
            match self.repository.delete_unit_dir(&unit.name).await {
                Ok(()) => {
                    info!(unit = %unit.name, created_at = %unit.created_at(), "Pruned expired automatic backup");
                    pruned.push(unit.name);
                }
                Err(e) => {
                    warn!(unit = %unit.name, error = %e, "Failed to prune automatic backup");
                }
            }
        }

        pruned.sort();
        Ok(pruned)
    }

    /// Allocates a scratch directory exclusive to one operation on one unit.
    pub(crate) fn scratch_dir(&self, operation: &str, name: &str) -> Result<TempDir> {
        std::fs::create_dir_all(&self.config.scratch_dir)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("stashbox_{}_{}_", operation, name))
            .tempdir_in(&self.config.scratch_dir)?;
        debug!(path = %dir.path().display(), "Allocated scratch space");
        Ok(dir)
    }
}

pub(crate) fn release_scratch(dir: TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        warn!(path = %path.display(), error = %e, "Failed to clean up scratch space");
    }
}
