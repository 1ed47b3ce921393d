use crate::Result;
use async_trait::async_trait;
use std::path::Path;

/// The relational dataset behind the application.
///
/// The engine treats dumps as opaque files; implementations decide the
/// serialization. `clear` followed by `load` must leave the dataset equal to
/// the dump's contents.
#[async_trait]
pub trait Dataset: Send + Sync {
    /// Writes a dump of everything except the `exclusions` to `output`.
    async fn dump(&self, output: &Path, exclusions: &[String]) -> Result<()>;

    /// Removes all records.
    async fn clear(&self) -> Result<()>;

    /// Loads the dump at `input` into the dataset.
    async fn load(&self, input: &Path) -> Result<()>;

    fn name(&self) -> &str;
}
