use super::spinner;
use crate::context::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use stashbox_core::{format_size, AuditAction};
use std::path::PathBuf;

#[derive(Args)]
pub struct DownloadCommand {
    #[arg(help = "Backup to download")]
    name: String,

    #[arg(short, long, help = "Output file (defaults to ./<name>.zip)")]
    output: Option<PathBuf>,
}

impl DownloadCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let ctx = Context::from_cli(cli)?;

        let pb = spinner(cli, format!("Packaging {}...", self.name));
        let result = ctx.engine.export(&self.name).await;
        pb.finish_and_clear();
        let export = result?;

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&export.file_name));
        tokio::fs::write(&output, &export.data)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;

        ctx.audit(
            AuditAction::Download,
            &self.name,
            format!("Downloaded as {}", export.file_name),
        );
        println!(
            "Wrote {} ({} entries, {})",
            output.display(),
            export.entries.len(),
            format_size(export.data.len() as u64)
        );
        Ok(())
    }
}
