use crate::engine::{release_scratch, BackupEngine};
use crate::fsutil::{clear_dir, copy_tree};
use crate::types::{RestoreReport, RestoreRequest, Unit, UnitPaths};
use crate::{Error, Result};
use std::path::Path;
use tracing::{error, info, warn};

impl BackupEngine {
    /// Replaces the live dataset, and optionally the live media tree, with
    /// the contents of a unit.
    ///
    /// Nothing is touched unless `request.confirmed` is set. Once the
    /// dataset has been cleared there is no rollback: a failure past that
    /// point surfaces as `Error::RestoreFailed` and may leave the live
    /// system partially restored. The unit itself is never modified.
    pub async fn restore(&self, request: RestoreRequest) -> Result<RestoreReport> {
        let name = request.name.as_str();
        if !request.confirmed {
            warn!(unit = %name, "Restore rejected: not confirmed");
            return Err(Error::NotConfirmed);
        }

        let unit = match self.repository.get_unit(name).await {
            Ok(unit) => unit,
            Err(e @ Error::InvalidName { .. }) => return Err(e),
            Err(e) => {
                error!(unit = %name, operation = "restore", error = %e, "Backup cannot be resolved");
                return Err(Error::NotFound { name: name.to_string() });
            }
        };
        let paths = self.repository.unit_paths(name)?;

        if !paths.dump().is_file() {
            error!(unit = %name, operation = "restore", dump = %paths.dump().display(), "Dataset dump missing");
            return Err(Error::MissingDump { name: name.to_string() });
        }
        if request.restore_media && !paths.media().is_dir() {
            error!(unit = %name, operation = "restore", "Media restore requested but backup has no media");
            return Err(Error::MissingMedia { name: name.to_string() });
        }

        let scratch = self
            .scratch_dir("restore", name)
            .map_err(|e| Error::restore_failed(name, e))?;
        let result = self.apply(&unit, &paths, request.restore_media, scratch.path()).await;
        if let Err(e) = tokio::task::spawn_blocking(move || release_scratch(scratch)).await {
            warn!(unit = %name, error = %e, "Scratch cleanup task failed");
        }

        match result {
            Ok(report) => {
                info!(unit = %name, media = report.media_restored, "Backup restored");
                Ok(report)
            }
            Err(e) => {
                error!(unit = %name, operation = "restore", error = %e, "Restore failed, live system may be partially restored");
                Err(Error::restore_failed(name, e))
            }
        }
    }

    async fn apply(&self, unit: &Unit, paths: &UnitPaths, restore_media: bool, scratch: &Path) -> Result<RestoreReport> {
        warn!(unit = %unit.name, dataset = self.dataset.name(), "Clearing live dataset");
        self.dataset.clear().await?;
        self.dataset.load(&paths.dump()).await?;
        info!(unit = %unit.name, "Dataset loaded");

        let mut report = RestoreReport {
            name: unit.name.clone(),
            media_restored: false,
            media_files: 0,
        };

        if restore_media {
            let live = self.config.media_dir.clone();
            let source = paths.media();
            let snapshot = scratch.join("media_snapshot");
            let name = unit.name.clone();
            let files = tokio::task::spawn_blocking(move || replace_media(&name, &live, &source, &snapshot)).await??;
            report.media_restored = true;
            report.media_files = files;
        }

        Ok(report)
    }
}

/// Swaps the live media tree for the unit's copy, keeping a best-effort
/// snapshot of the previous contents in scratch space.
fn replace_media(name: &str, live: &Path, source: &Path, snapshot: &Path) -> Result<u64> {
    if live.is_dir() {
        match copy_tree(live, snapshot) {
            Ok(stats) => info!(unit = %name, files = stats.files, "Snapshotted live media"),
            Err(e) => warn!(unit = %name, error = %e, "Could not snapshot live media, continuing"),
        }
    }

    let removed = clear_dir(live)?;
    info!(unit = %name, entries = removed, "Cleared live media");

    let stats = copy_tree(source, live)?;
    info!(unit = %name, files = stats.files, bytes = stats.bytes, "Restored media");
    Ok(stats.files)
}

#[cfg(test)]
mod tests {
    use crate::manifest::MANIFEST_FILE;
    use crate::testing::{Call, Fixture, FAKE_DUMP};
    use crate::types::{CreateRequest, RestoreRequest};
    use crate::Error;
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    fn request(name: &str, restore_media: bool, confirmed: bool) -> RestoreRequest {
        RestoreRequest {
            name: name.to_string(),
            restore_media,
            confirmed,
        }
    }

    async fn seeded(fx: &Fixture, name: &str, include_media: bool) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        fx.engine
            .create(CreateRequest::new("alice", now).with_name(name).with_media(include_media))
            .await
            .unwrap();
        fx.dataset.calls.lock().unwrap().clear();
    }

    fn tree(dir: &Path) -> Vec<(String, Vec<u8>)> {
        let mut files: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(dir).unwrap().to_string_lossy().to_string();
                (rel, std::fs::read(e.path()).unwrap())
            })
            .collect();
        files.sort();
        files
    }

    fn scratch_is_empty(fx: &Fixture) -> bool {
        !fx.scratch_dir().exists() || std::fs::read_dir(fx.scratch_dir()).unwrap().count() == 0
    }

    #[tokio::test]
    async fn test_unconfirmed_restore_touches_nothing() {
        let fx = Fixture::new();
        std::fs::write(fx.media_dir().join("live.txt"), b"live").unwrap();
        seeded(&fx, "snap", true).await;
        let media_before = tree(&fx.media_dir());
        let root_before = tree(&fx.root());

        let err = fx.engine.restore(request("snap", true, false)).await.unwrap_err();

        assert!(matches!(err, Error::NotConfirmed));
        assert!(fx.dataset.calls().is_empty());
        assert_eq!(tree(&fx.media_dir()), media_before);
        assert_eq!(tree(&fx.root()), root_before);
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn test_restore_dataset_only() {
        let fx = Fixture::new();
        std::fs::write(fx.media_dir().join("keep.txt"), b"untouched").unwrap();
        seeded(&fx, "snap", true).await;
        std::fs::write(fx.media_dir().join("new.txt"), b"after").unwrap();

        let report = fx.engine.restore(request("snap", false, true)).await.unwrap();

        assert!(!report.media_restored);
        assert_eq!(fx.dataset.calls(), vec![Call::Clear, Call::Load(FAKE_DUMP.to_string())]);
        assert!(fx.media_dir().join("new.txt").exists());
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn test_restore_media_replaces_live_tree() {
        let fx = Fixture::new();
        std::fs::create_dir_all(fx.media_dir().join("img")).unwrap();
        std::fs::write(fx.media_dir().join("img/p.png"), b"original").unwrap();
        seeded(&fx, "snap", true).await;
        let unit_before = tree(&fx.root().join("snap"));

        std::fs::write(fx.media_dir().join("img/p.png"), b"edited").unwrap();
        std::fs::write(fx.media_dir().join("added.txt"), b"extra").unwrap();

        let report = fx.engine.restore(request("snap", true, true)).await.unwrap();

        assert!(report.media_restored);
        assert_eq!(report.media_files, 1);
        assert_eq!(tree(&fx.media_dir()), vec![("img/p.png".to_string(), b"original".to_vec())]);
        assert_eq!(tree(&fx.root().join("snap")), unit_before);
        assert!(scratch_is_empty(&fx));
    }

    #[tokio::test]
    async fn test_media_restore_without_media_fails_before_mutation() {
        let fx = Fixture::new();
        std::fs::write(fx.media_dir().join("live.txt"), b"live").unwrap();
        seeded(&fx, "db_only", false).await;

        let err = fx.engine.restore(request("db_only", true, true)).await.unwrap_err();

        assert!(matches!(err, Error::MissingMedia { ref name } if name == "db_only"));
        assert!(fx.dataset.calls().is_empty());
        assert!(fx.media_dir().join("live.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_unit_and_missing_dump() {
        let fx = Fixture::new();
        assert!(matches!(
            fx.engine.restore(request("nope", false, true)).await,
            Err(Error::NotFound { .. })
        ));

        seeded(&fx, "hollow", false).await;
        std::fs::remove_file(fx.root().join("hollow/db.json")).unwrap();
        assert!(matches!(
            fx.engine.restore(request("hollow", false, true)).await,
            Err(Error::MissingDump { ref name }) if name == "hollow"
        ));
        assert!(fx.dataset.calls().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_not_found() {
        let fx = Fixture::new();
        seeded(&fx, "garbled", false).await;
        std::fs::write(fx.root().join("garbled").join(MANIFEST_FILE), "{").unwrap();

        assert!(matches!(
            fx.engine.restore(request("garbled", false, true)).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_failure_is_restore_failed_and_cleans_scratch() {
        let fx = Fixture::new();
        seeded(&fx, "snap", false).await;
        fx.dataset.fail_load();

        let err = fx.engine.restore(request("snap", false, true)).await.unwrap_err();

        match err {
            Error::RestoreFailed { name, cause } => {
                assert_eq!(name, "snap");
                assert!(matches!(*cause, Error::Dataset(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fx.dataset.calls()[0], Call::Clear);
        assert!(scratch_is_empty(&fx));
    }
}
