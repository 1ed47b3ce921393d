use super::spinner;
use crate::context::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use stashbox_core::{AuditAction, RestoreRequest};

#[derive(Args)]
pub struct RestoreCommand {
    #[arg(help = "Backup to restore")]
    name: String,

    #[arg(long, help = "Also replace the live media directory")]
    media: bool,

    #[arg(long, help = "Confirm that current data will be overwritten")]
    yes: bool,
}

impl RestoreCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let ctx = Context::from_cli(cli)?;
        let request = RestoreRequest {
            name: self.name.clone(),
            restore_media: self.media,
            confirmed: self.yes,
        };

        let pb = spinner(cli, format!("Restoring {}...", self.name));
        let result = ctx.engine.restore(request).await;
        pb.finish_and_clear();

        let report = result.with_context(|| {
            if self.yes {
                format!("Restore of '{}' did not complete", self.name)
            } else {
                format!("Restoring '{}' overwrites the current data; re-run with --yes", self.name)
            }
        })?;
        let message = if report.media_restored {
            format!("Dataset and media restored ({} files)", report.media_files)
        } else {
            "Dataset restored".to_string()
        };
        ctx.audit(AuditAction::Restore, &report.name, message.as_str());
        println!("Restored {}: {}", report.name, message);
        Ok(())
    }
}
