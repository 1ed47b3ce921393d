//! `backup_info.json`, the per-unit metadata record.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

pub const MANIFEST_FILE: &str = "backup_info.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: String,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "unknown_identity")]
    pub created_by: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub includes_media: bool,
}

fn unknown_identity() -> String {
    "unknown".to_string()
}

impl Manifest {
    pub fn new(name: impl Into<String>, created_by: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            created_at,
            created_by: created_by.into(),
            description: String::new(),
            includes_media: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_media(mut self, includes_media: bool) -> Self {
        self.includes_media = includes_media;
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(name: &str, data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| Error::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Writes the manifest into `unit_dir`, replacing any existing one.
pub async fn write(unit_dir: &Path, manifest: &Manifest) -> Result<()> {
    let json = manifest.to_json()?;
    fs::write(unit_dir.join(MANIFEST_FILE), json).await?;
    Ok(())
}

/// Reads the manifest from `unit_dir`.
///
/// A missing file maps to `Error::NotFound` and an unparseable one to
/// `Error::Corrupt`; both name the unit after its directory.
pub async fn read(unit_dir: &Path) -> Result<Manifest> {
    let name = unit_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let data = match fs::read_to_string(unit_dir.join(MANIFEST_FILE)).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound { name });
        }
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            return Err(Error::Corrupt {
                name,
                reason: e.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    Manifest::from_json(&name, &data)
}

/// Timestamps are written as RFC 3339. Offset-less ISO-8601 values are
/// accepted on read and taken as UTC.
mod iso8601 {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| serde::de::Error::custom(format!("invalid created_at {:?}: {}", raw, e)))
    }
}
