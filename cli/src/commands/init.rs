use anyhow::Result;
use clap::Args;
use crate::context::Context;

#[derive(Args)]
pub struct InitCommand {}

impl InitCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let ctx = Context::from_cli(cli)?;
        ctx.engine.ensure_root().await?;

        println!(
            "Backup root ready at {}",
            ctx.engine.config().root_dir.display()
        );
        Ok(())
    }
}
