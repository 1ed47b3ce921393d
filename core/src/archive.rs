use crate::engine::{release_scratch, BackupEngine};
use crate::fsutil::relative_files;
use crate::types::{ArchiveExport, ARCHIVE_CONTENT_TYPE};
use crate::{Error, Result};
use bytes::Bytes;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, error, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

impl BackupEngine {
    /// Packages a unit as a deflate-compressed ZIP for download.
    ///
    /// Entry names are the unit's files relative to the unit directory. The
    /// archive is staged in scratch space which is released in the
    /// background once the bytes are in memory.
    pub async fn export(&self, name: &str) -> Result<ArchiveExport> {
        let paths = self.repository.unit_paths(name)?;
        if !paths.root.is_dir() {
            error!(unit = %name, operation = "export", "Backup not found");
            return Err(Error::NotFound { name: name.to_string() });
        }

        let scratch = self.scratch_dir("export", name)?;
        let file_name = format!("{}.zip", name);
        let archive_path = scratch.path().join(&file_name);

        let unit_root = paths.root.clone();
        let target = archive_path.clone();
        let entries = match tokio::task::spawn_blocking(move || write_archive(&unit_root, &target)).await? {
            Ok(entries) => entries,
            Err(e) => {
                error!(unit = %name, operation = "export", error = %e, "Failed to build archive");
                return Err(e);
            }
        };
        let data = tokio::fs::read(&archive_path).await?;

        let _ = tokio::task::spawn_blocking(move || release_scratch(scratch));

        info!(unit = %name, entries = entries.len(), bytes = data.len(), "Exported backup archive");
        Ok(ArchiveExport {
            file_name,
            content_type: ARCHIVE_CONTENT_TYPE,
            entries,
            data: Bytes::from(data),
        })
    }
}

/// Writes every regular file under `unit_root` into a new ZIP at `archive`.
fn write_archive(unit_root: &Path, archive: &Path) -> Result<Vec<String>> {
    let entries = relative_files(unit_root)?;
    let mut writer = ZipWriter::new(File::create(archive)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in &entries {
        writer.start_file(entry.as_str(), options)?;
        let mut source = File::open(unit_root.join(entry))?;
        io::copy(&mut source, &mut writer)?;
        debug!(entry = %entry, "Archived file");
    }

    writer.finish()?;
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use crate::testing::Fixture;
    use crate::types::CreateRequest;
    use crate::Error;
    use chrono::{TimeZone, Utc};
    use std::io::{Cursor, Read};

    #[tokio::test]
    async fn test_export_entries_match_unit_files() {
        let fx = Fixture::new();
        let unit = fx.root().join("pair");
        std::fs::create_dir_all(unit.join("media")).unwrap();
        std::fs::write(unit.join("db.json"), b"[1, 2, 3]").unwrap();
        std::fs::write(unit.join("media/logo.png"), vec![7u8; 4096]).unwrap();

        let export = fx.engine.export("pair").await.unwrap();

        assert_eq!(export.file_name, "pair.zip");
        assert_eq!(export.content_type, "application/zip");
        assert_eq!(export.entries, vec!["db.json", "media/logo.png"]);

        let mut archive = zip::ZipArchive::new(Cursor::new(export.data.to_vec())).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["db.json", "media/logo.png"]);

        for name in &names {
            let mut file = archive.by_name(name).unwrap();
            assert_eq!(file.compression(), zip::CompressionMethod::Deflated);
            let mut contents = Vec::new();
            file.read_to_end(&mut contents).unwrap();
            assert_eq!(contents, std::fs::read(unit.join(name)).unwrap());
        }
    }

    #[tokio::test]
    async fn test_export_of_created_unit_includes_manifest() {
        let fx = Fixture::new();
        std::fs::write(fx.media_dir().join("a.txt"), b"abc").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        fx.engine
            .create(CreateRequest::new("alice", now).with_name("full").with_media(true))
            .await
            .unwrap();

        let export = fx.engine.export("full").await.unwrap();
        assert_eq!(export.entries, vec!["backup_info.json", "db.json", "media/a.txt"]);
        assert!(!fx.root().join("full/full.zip").exists());
    }

    #[tokio::test]
    async fn test_export_missing_unit_is_not_found() {
        let fx = Fixture::new();
        assert!(matches!(fx.engine.export("absent").await, Err(Error::NotFound { .. })));
    }
}
