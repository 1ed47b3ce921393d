use crate::config::AppConfig;
use anyhow::Result;
use stashbox_core::{AuditAction, AuditRecord, AuditSink, BackupEngine, TracingAuditSink};
use tracing::info;

/// Everything a command needs: the engine, who is acting, and where audit
/// records go.
pub struct Context {
    pub engine: BackupEngine,
    pub identity: String,
    audit: Box<dyn AuditSink>,
}

impl Context {
    pub fn from_cli(cli: &crate::Cli) -> Result<Self> {
        let mut config = AppConfig::load(cli.config.as_deref())?;
        config.apply_overrides(cli.root.as_deref(), cli.media.as_deref(), cli.scratch.as_deref());

        info!(
            root = %config.engine.root_dir.display(),
            media = %config.engine.media_dir.display(),
            "Opening backup store"
        );

        let dataset = config.dataset.build();
        let mut engine = BackupEngine::local(config.engine.clone(), dataset);
        if let Some(exclusions) = config.exclusions.clone() {
            engine = engine.with_exclusions(exclusions);
        }

        Ok(Self {
            engine,
            identity: resolve_identity(cli.user.as_deref()),
            audit: Box::new(TracingAuditSink),
        })
    }

    pub fn audit(&self, action: AuditAction, subject: &str, message: impl Into<String>) {
        self.audit
            .emit(AuditRecord::new(action, subject, self.identity.as_str(), message));
    }
}

pub fn resolve_identity(explicit: Option<&str>) -> String {
    explicit
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var("USER").ok())
        .or_else(|| std::env::var("USERNAME").ok())
        .unwrap_or_else(|| "system".to_string())
}
