use crate::manifest;
use crate::naming::{check_name, validate_name};
use crate::size::measure;
use crate::types::{Unit, UnitPaths};
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, warn};

/// Storage for backup units, keyed by unit name.
///
/// Every unit is a self-contained directory holding its manifest, the
/// dataset dump and an optional media mirror. Pipelines stage content
/// through the paths returned by `create_unit_dir` / `unit_paths`, so a
/// repository backed by something other than local disk stages locally
/// and publishes on its own.
///
/// Names are validated on every call; a name outside `[A-Za-z0-9_-]+`
/// never reaches the filesystem.
#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// Creates the repository root if absent. Idempotent.
    async fn ensure_root(&self) -> Result<()>;

    /// Enumerates units in no particular order. Units whose manifest cannot
    /// be read are left out.
    async fn list_units(&self) -> Result<Vec<Unit>>;

    /// Resolves a single unit. Missing units and unreadable manifests
    /// surface as `NotFound` and `Corrupt` respectively.
    async fn get_unit(&self, name: &str) -> Result<Unit>;

    async fn unit_exists(&self, name: &str) -> Result<bool>;

    /// Creates an empty unit directory, `AlreadyExists` if one is present.
    async fn create_unit_dir(&self, name: &str) -> Result<UnitPaths>;

    /// Removes a unit and everything in it, `NotFound` if absent.
    async fn delete_unit_dir(&self, name: &str) -> Result<()>;

    fn unit_paths(&self, name: &str) -> Result<UnitPaths>;
}

/// Units as directories under a root on local disk.
///
/// ```text
/// root/
/// └── <unit-name>/
///     ├── backup_info.json   # manifest
///     ├── db.json            # dataset dump
///     └── media/             # optional media mirror
/// ```
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unit_dir(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(check_name(name)?))
    }
}

#[async_trait]
impl UnitRepository for LocalRepository {
    async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn list_units(&self) -> Result<Vec<Unit>> {
        let mut units = Vec::new();
        if !self.root.exists() {
            return Ok(units);
        }

        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if !validate_name(&name) {
                warn!(unit = %name, "Skipping directory with an invalid backup name");
                continue;
            }

            match manifest::read(&path).await {
                Ok(manifest) => units.push(Unit {
                    size_bytes: measure(path).await?,
                    name,
                    manifest,
                }),
                Err(e) if e.is_skippable() => {
                    warn!(unit = %name, error = %e, "Skipping unit with unreadable manifest");
                }
                Err(e) => {
                    error!(unit = %name, operation = "list", error = %e, "Failed to read unit, skipping");
                }
            }
        }

        debug!(root = %self.root.display(), count = units.len(), "Listed backup units");
        Ok(units)
    }

    async fn get_unit(&self, name: &str) -> Result<Unit> {
        let dir = self.unit_dir(name)?;
        if !dir.is_dir() {
            return Err(Error::NotFound { name: name.to_string() });
        }
        let manifest = manifest::read(&dir).await?;
        Ok(Unit {
            name: name.to_string(),
            size_bytes: measure(dir).await?,
            manifest,
        })
    }

    async fn unit_exists(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.unit_dir(name)?).await?)
    }

    async fn create_unit_dir(&self, name: &str) -> Result<UnitPaths> {
        let dir = self.unit_dir(name)?;
        self.ensure_root().await?;
        match fs::create_dir(&dir).await {
            Ok(()) => Ok(UnitPaths { root: dir }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(Error::AlreadyExists {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_unit_dir(&self, name: &str) -> Result<()> {
        let dir = self.unit_dir(name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn unit_paths(&self, name: &str) -> Result<UnitPaths> {
        Ok(UnitPaths {
            root: self.unit_dir(name)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Manifest, MANIFEST_FILE};
    use chrono::{TimeZone, Utc};

    async fn seed(repo: &LocalRepository, name: &str, day: u32) {
        let paths = repo.create_unit_dir(name).await.unwrap();
        let created_at = Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap();
        manifest::write(&paths.root, &Manifest::new(name, "tester", created_at))
            .await
            .unwrap();
        std::fs::write(paths.dump(), b"[]").unwrap();
    }

    #[tokio::test]
    async fn test_ensure_root_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(dir.path().join("backups"));
        repo.ensure_root().await.unwrap();
        repo.ensure_root().await.unwrap();
        assert!(repo.root().is_dir());
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_units() {
        let dir = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        seed(&repo, "first", 1).await;
        seed(&repo, "second", 2).await;

        std::fs::create_dir(dir.path().join("no_manifest")).unwrap();
        std::fs::create_dir(dir.path().join("garbled")).unwrap();
        std::fs::write(dir.path().join("garbled").join(MANIFEST_FILE), "{").unwrap();
        std::fs::write(dir.path().join("stray.txt"), b"not a unit").unwrap();

        let mut names: Vec<_> = repo.list_units().await.unwrap().into_iter().map(|u| u.name).collect();
        names.sort();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_list_only_returns_addressable_units() {
        let dir = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        seed(&repo, "nightly", 1).await;

        let stray = dir.path().join("nightly.old");
        std::fs::create_dir(&stray).unwrap();
        let created_at = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        manifest::write(&stray, &Manifest::new("nightly.old", "tester", created_at))
            .await
            .unwrap();

        let units = repo.list_units().await.unwrap();
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["nightly"]);
        for unit in &units {
            repo.get_unit(&unit.name).await.unwrap();
        }
        assert!(stray.is_dir());
    }

    #[tokio::test]
    async fn test_list_on_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(dir.path().join("nowhere"));
        assert!(repo.list_units().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_twice_is_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        repo.create_unit_dir("dup").await.unwrap();

        assert!(repo.unit_exists("dup").await.unwrap());
        assert!(matches!(
            repo.create_unit_dir("dup").await,
            Err(Error::AlreadyExists { name }) if name == "dup"
        ));
    }

    #[tokio::test]
    async fn test_get_unit_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        seed(&repo, "sized", 3).await;

        let unit = repo.get_unit("sized").await.unwrap();
        assert_eq!(unit.manifest.created_by, "tester");
        assert!(unit.size_bytes > 2);
        assert!(matches!(repo.get_unit("absent").await, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_missing_leaves_others() {
        let dir = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        seed(&repo, "keep", 1).await;

        assert!(matches!(
            repo.delete_unit_dir("absent").await,
            Err(Error::NotFound { name }) if name == "absent"
        ));
        assert_eq!(repo.list_units().await.unwrap().len(), 1);

        repo.delete_unit_dir("keep").await.unwrap();
        assert!(!repo.unit_exists("keep").await.unwrap());
    }

    #[tokio::test]
    async fn test_names_never_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let repo = LocalRepository::new(dir.path().join("backups"));
        std::fs::create_dir_all(dir.path().join("victim")).unwrap();

        assert!(matches!(
            repo.delete_unit_dir("../victim").await,
            Err(Error::InvalidName { .. })
        ));
        assert!(dir.path().join("victim").is_dir());
    }
}
