mod commands;
mod config;
mod context;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use commands::{
    backup::{AutoCommand, CreateCommand, ManualCommand},
    delete::DeleteCommand,
    download::DownloadCommand,
    init::InitCommand,
    restore::RestoreCommand,
    units::{ListCommand, ShowCommand, SizeCommand},
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(
    name = "stashbox",
    about = "Back up, restore and download application data",
    long_about = "Stashbox captures a dataset dump plus the media tree as named backup units and restores them on demand"
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "STASHBOX_CONFIG", help = "Config file (TOML)")]
    config: Option<PathBuf>,

    #[arg(long, env = "STASHBOX_ROOT", help = "Backup root directory")]
    root: Option<PathBuf>,

    #[arg(long, env = "STASHBOX_MEDIA", help = "Live media directory")]
    media: Option<PathBuf>,

    #[arg(long, env = "STASHBOX_SCRATCH", help = "Scratch directory for restores and downloads")]
    scratch: Option<PathBuf>,

    #[arg(long, env = "STASHBOX_USER", help = "Identity recorded on backups and audit records")]
    user: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,

    #[arg(short, long, help = "Enable quiet mode")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create the backup root directory")]
    Init(InitCommand),

    #[command(about = "List backups, newest first")]
    List(ListCommand),

    #[command(about = "Show one backup")]
    Show(ShowCommand),

    #[command(about = "Create a new backup")]
    Create(CreateCommand),

    #[command(about = "Create an auto-named manual backup including media")]
    Manual(ManualCommand),

    #[command(about = "Create today's automatic backup and prune expired ones")]
    Auto(AutoCommand),

    #[command(about = "Restore the dataset (and optionally media) from a backup")]
    Restore(RestoreCommand),

    #[command(about = "Delete a backup")]
    Delete(DeleteCommand),

    #[command(about = "Download a backup as a ZIP archive")]
    Download(DownloadCommand),

    #[command(about = "Report the size of a directory")]
    Size(SizeCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet)?;

    debug!("Starting stashbox");

    match cli.command {
        Commands::Init(ref cmd) => cmd.run(&cli).await,
        Commands::List(ref cmd) => cmd.run(&cli).await,
        Commands::Show(ref cmd) => cmd.run(&cli).await,
        Commands::Create(ref cmd) => cmd.run(&cli).await,
        Commands::Manual(ref cmd) => cmd.run(&cli).await,
        Commands::Auto(ref cmd) => cmd.run(&cli).await,
        Commands::Restore(ref cmd) => cmd.run(&cli).await,
        Commands::Delete(ref cmd) => cmd.run(&cli).await,
        Commands::Download(ref cmd) => cmd.run(&cli).await,
        Commands::Size(ref cmd) => cmd.run(),
    }
}

fn init_tracing(verbose: bool, quiet: bool) -> Result<()> {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "stashbox={level},stashbox_core={level},stashbox_backends={level},audit=info"
        ))
    });

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Setting default subscriber failed: {}", e))
}
