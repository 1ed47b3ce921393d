use crate::manifest::Manifest;
use crate::size::format_size;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

pub const DUMP_FILE: &str = "db.json";
pub const MEDIA_DIR: &str = "media";
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Dataset records that are regenerated by the application itself and
/// never belong in a dump.
pub const DEFAULT_DUMP_EXCLUSIONS: &[&str] = &["auth.permission", "contenttypes", "sessions.session"];

/// A backup unit as seen on read: its manifest plus the derived size.
#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    pub name: String,
    pub manifest: Manifest,
    pub size_bytes: u64,
}

impl Unit {
    pub fn created_at(&self) -> DateTime<Utc> {
        self.manifest.created_at
    }

    pub fn size(&self) -> String {
        format_size(self.size_bytes)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} - by {} at {} ({}{})",
            self.name,
            self.manifest.created_by,
            self.manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.size(),
            if self.manifest.includes_media { ", with media" } else { "" }
        )
    }
}

#[derive(Debug, Clone)]
pub struct CreateRequest {
    /// `None` or blank falls back to `backup_<YYYYMMDD>_<HHMMSS>`.
    pub name: Option<String>,
    pub include_media: bool,
    pub description: String,
    pub identity: String,
    pub now: DateTime<Utc>,
}

impl CreateRequest {
    pub fn new(identity: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            name: None,
            include_media: false,
            description: String::new(),
            identity: identity.into(),
            now,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_media(mut self, include_media: bool) -> Self {
        self.include_media = include_media;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct RestoreRequest {
    pub name: String,
    pub restore_media: bool,
    pub confirmed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub name: String,
    pub media_restored: bool,
    pub media_files: u64,
}

/// A unit packaged for download.
#[derive(Debug, Clone)]
pub struct ArchiveExport {
    pub file_name: String,
    pub content_type: &'static str,
    pub entries: Vec<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoBackupReport {
    /// Today's automatic backup
    pub unit: Unit,
    /// Set when `unit` was already there from an earlier run today
    pub existed: bool,
    pub pruned: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UnitPaths {
    pub root: PathBuf,
}

impl UnitPaths {
    pub fn dump(&self) -> PathBuf {
        self.root.join(DUMP_FILE)
    }

    pub fn media(&self) -> PathBuf {
        self.root.join(MEDIA_DIR)
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join(crate::manifest::MANIFEST_FILE)
    }
}
