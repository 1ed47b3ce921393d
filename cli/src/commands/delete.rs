use crate::context::Context;
use anyhow::{anyhow, Result};
use clap::Args;
use stashbox_core::AuditAction;

#[derive(Args)]
pub struct DeleteCommand {
    #[arg(help = "Backup to delete")]
    name: String,

    #[arg(long, help = "Confirm the deletion")]
    yes: bool,
}

impl DeleteCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        if !self.yes {
            return Err(anyhow!("Refusing to delete '{}' without --yes", self.name));
        }

        let ctx = Context::from_cli(cli)?;
        ctx.engine.delete(&self.name).await?;

        ctx.audit(AuditAction::Delete, &self.name, "Backup deleted");
        println!("Deleted {}", self.name);
        Ok(())
    }
}
