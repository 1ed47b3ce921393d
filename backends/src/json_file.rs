use async_trait::async_trait;
use serde_json::Value;
use stashbox_core::{Dataset, Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// A dataset kept as a JSON array of fixture records on disk.
///
/// Records carry a `"model"` field of the form `app.model`. An exclusion
/// names either a whole app (`contenttypes`) or one model
/// (`auth.permission`), compared case-insensitively. Loading upserts by
/// `(model, pk)`; records without a `pk` are appended.
pub struct JsonFileDataset {
    path: PathBuf,
}

impl JsonFileDataset {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read_records(path: &Path) -> Result<Vec<Value>> {
        let data = match fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&data)? {
            Value::Array(records) => Ok(records),
            _ => Err(Error::Dataset(format!("{} is not a JSON array", path.display()))),
        }
    }

    async fn write_records(path: &Path, records: &[Value]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(path, json).await?;
        Ok(())
    }
}

fn is_excluded(record: &Value, exclusions: &[String]) -> bool {
    let Some(model) = record.get("model").and_then(Value::as_str) else {
        return false;
    };
    let model = model.to_ascii_lowercase();
    let app = model.split('.').next().unwrap_or_default();
    exclusions.iter().any(|ex| {
        let ex = ex.to_ascii_lowercase();
        ex == model || ex == app
    })
}

fn record_key(record: &Value) -> Option<(String, String)> {
    let model = record.get("model")?.as_str()?.to_ascii_lowercase();
    let pk = record.get("pk")?;
    Some((model, pk.to_string()))
}

fn upsert(current: &mut Vec<Value>, incoming: Vec<Value>) {
    for record in incoming {
        let existing = record_key(&record)
            .and_then(|key| current.iter().position(|r| record_key(r).as_ref() == Some(&key)));
        match existing {
            Some(i) => current[i] = record,
            None => current.push(record),
        }
    }
}

#[async_trait]
impl Dataset for JsonFileDataset {
    async fn dump(&self, output: &Path, exclusions: &[String]) -> Result<()> {
        let records = Self::read_records(&self.path).await?;
        let total = records.len();
        let kept: Vec<Value> = records
            .into_iter()
            .filter(|r| !is_excluded(r, exclusions))
            .collect();
        Self::write_records(output, &kept).await?;
        info!(path = %output.display(), kept = kept.len(), excluded = total - kept.len(), "Dataset dump written");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Self::write_records(&self.path, &[]).await
    }

    async fn load(&self, input: &Path) -> Result<()> {
        let records = Self::read_records(input).await?;
        let mut current = Self::read_records(&self.path).await?;
        upsert(&mut current, records);
        Self::write_records(&self.path, &current).await?;
        info!(path = %input.display(), records = current.len(), "Dataset loaded");
        Ok(())
    }

    fn name(&self) -> &str {
        "json-file"
    }
}
