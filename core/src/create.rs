use crate::engine::BackupEngine;
use crate::fsutil::copy_tree;
use crate::manifest::{self, Manifest};
use crate::naming::{check_name, resolve_name};
use crate::size::measure;
use crate::types::{CreateRequest, Unit, UnitPaths};
use crate::{Error, Result};
use tracing::{error, info, warn};

impl BackupEngine {
    /// Creates a backup unit: dataset dump, optional media mirror, manifest.
    ///
    /// Either the whole unit exists afterwards or nothing does. Any failure
    /// after the unit directory has been made removes it again and surfaces
    /// as `Error::BackupFailed` carrying the original cause.
    pub async fn create(&self, request: CreateRequest) -> Result<Unit> {
        let name = resolve_name(request.name.as_deref(), &request.now);
        check_name(&name)?;

        if self.repository.unit_exists(&name).await? {
            warn!(unit = %name, "Backup already exists");
            return Err(Error::AlreadyExists { name });
        }

        let paths = match self.repository.create_unit_dir(&name).await {
            Ok(paths) => paths,
            Err(e @ Error::AlreadyExists { .. }) => return Err(e),
            Err(e) => {
                error!(unit = %name, operation = "create", error = %e, "Failed to create unit directory");
                return Err(Error::backup_failed(&name, e));
            }
        };

        info!(unit = %name, media = request.include_media, by = %request.identity, "Creating backup");

        match self.populate(&name, &paths, &request).await {
            Ok(manifest) => {
                let unit = Unit {
                    size_bytes: measure(paths.root.clone()).await?,
                    name,
                    manifest,
                };
                info!(unit = %unit.name, size = %unit.size(), "Backup created");
                Ok(unit)
            }
            Err(e) => {
                error!(unit = %name, operation = "create", error = %e, "Backup failed, removing partial unit");
                if let Err(cleanup) = self.repository.delete_unit_dir(&name).await {
                    error!(unit = %name, error = %cleanup, "Failed to remove partial unit");
                }
                Err(Error::backup_failed(&name, e))
            }
        }
    }

    async fn populate(&self, name: &str, paths: &UnitPaths, request: &CreateRequest) -> Result<Manifest> {
        self.dataset.dump(&paths.dump(), &self.exclusions).await?;
        if !paths.dump().is_file() {
            return Err(Error::Dataset(format!("{} produced no dump", self.dataset.name())));
        }

        if request.include_media {
            let source = self.config.media_dir.clone();
            let target = paths.media();
            if source.is_dir() {
                let stats = tokio::task::spawn_blocking(move || copy_tree(&source, &target)).await??;
                info!(unit = %name, files = stats.files, bytes = stats.bytes, "Copied media");
            } else {
                warn!(unit = %name, media = %source.display(), "Live media directory missing, storing empty media");
                tokio::fs::create_dir_all(&target).await?;
            }
        }

        let manifest = Manifest::new(name, request.identity.as_str(), request.now)
            .with_description(request.description.trim())
            .with_media(request.include_media);
        manifest::write(&paths.root, &manifest).await?;
        Ok(manifest)
    }
}
