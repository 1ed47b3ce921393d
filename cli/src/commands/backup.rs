use super::spinner;
use crate::context::Context;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use stashbox_core::{AuditAction, CreateRequest, Unit};
use tracing::info;

#[derive(Args)]
pub struct CreateCommand {
    #[arg(long, help = "Backup name (letters, digits, '_' or '-'); defaults to a timestamp")]
    name: Option<String>,

    #[arg(long, help = "Include the media directory")]
    media: bool,

    #[arg(long, help = "Free-form description")]
    description: Option<String>,
}

impl CreateCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let ctx = Context::from_cli(cli)?;

        let mut request = CreateRequest::new(ctx.identity.clone(), Utc::now()).with_media(self.media);
        if let Some(ref name) = self.name {
            request = request.with_name(name.clone());
        }
        if let Some(ref description) = self.description {
            request = request.with_description(description.clone());
        }

        let pb = spinner(cli, "Creating backup...");
        let result = ctx.engine.create(request).await;
        pb.finish_and_clear();

        let unit = result?;
        report_created(&ctx, &unit, "Backup created");
        Ok(())
    }
}

#[derive(Args)]
pub struct ManualCommand {}

impl ManualCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let ctx = Context::from_cli(cli)?;

        let pb = spinner(cli, "Creating manual backup...");
        let result = ctx.engine.create_manual(&ctx.identity, Utc::now()).await;
        pb.finish_and_clear();

        let unit = result?;
        report_created(&ctx, &unit, "Manual backup created");
        Ok(())
    }
}

#[derive(Args)]
pub struct AutoCommand {}

impl AutoCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let ctx = Context::from_cli(cli)?;

        let pb = spinner(cli, "Running automatic backup...");
        let result = ctx.engine.auto_backup(&ctx.identity, Utc::now()).await;
        pb.finish_and_clear();

        let report = result?;
        if report.existed {
            println!("Automatic backup already present: {}", report.unit.summary());
        } else {
            report_created(&ctx, &report.unit, "Automatic backup created");
        }
        for name in &report.pruned {
            ctx.audit(AuditAction::Delete, name, "Expired automatic backup pruned");
            println!("Pruned {}", name);
        }
        info!(pruned = report.pruned.len(), "Automatic backup finished");
        Ok(())
    }
}

fn report_created(ctx: &Context, unit: &Unit, message: &str) {
    ctx.audit(AuditAction::Create, &unit.name, message);
    println!("{}: {}", message, unit.summary());
}
