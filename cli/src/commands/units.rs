use crate::context::Context;
use anyhow::{anyhow, Result};
use clap::Args;
use stashbox_core::report_size;
use std::path::PathBuf;

#[derive(Args)]
pub struct ListCommand {
    #[arg(long, help = "Output format (table, json)")]
    format: Option<String>,
}

impl ListCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let ctx = Context::from_cli(cli)?;
        let units = ctx.engine.list().await?;
        let format = self.format.as_deref().unwrap_or("table");

        match format {
            "table" => {
                if units.is_empty() {
                    println!("No backups found");
                    return Ok(());
                }

                println!(
                    "{:<32} {:<20} {:<12} {:<6} {:<12} {}",
                    "Name", "Created", "By", "Media", "Size", "Description"
                );
                println!("{:-<100}", "");

                for unit in &units {
                    println!(
                        "{:<32} {:<20} {:<12} {:<6} {:<12} {}",
                        unit.name,
                        unit.created_at().format("%Y-%m-%d %H:%M:%S"),
                        unit.manifest.created_by,
                        if unit.manifest.includes_media { "yes" } else { "no" },
                        unit.size(),
                        unit.manifest.description
                    );
                }
            }
            "json" => {
                println!("{}", serde_json::to_string_pretty(&units)?);
            }
            _ => {
                return Err(anyhow!("Unsupported format: {}", format));
            }
        }

        Ok(())
    }
}

#[derive(Args)]
pub struct ShowCommand {
    #[arg(help = "Backup name")]
    name: String,
}

impl ShowCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let ctx = Context::from_cli(cli)?;
        let unit = ctx.engine.get(&self.name).await?;

        println!("Name:        {}", unit.name);
        println!("Created:     {}", unit.created_at().format("%Y-%m-%d %H:%M:%S UTC"));
        println!("Created by:  {}", unit.manifest.created_by);
        println!("Media:       {}", if unit.manifest.includes_media { "included" } else { "not included" });
        println!("Size:        {}", unit.size());
        if !unit.manifest.description.is_empty() {
            println!("Description: {}", unit.manifest.description);
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct SizeCommand {
    #[arg(help = "Directory to measure")]
    path: PathBuf,
}

impl SizeCommand {
    pub fn run(&self) -> Result<()> {
        println!("{}\t{}", report_size(&self.path), self.path.display());
        Ok(())
    }
}
