use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stashbox_core::{Dataset, Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, error, info};

/// External commands that dump, clear and load the dataset.
///
/// Each command is a program followed by its arguments. The dump command
/// gets `<exclude_flag> <record>` appended per exclusion and must write the
/// dump to stdout; the load command gets the dump path appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default = "default_dump")]
    pub dump: Vec<String>,

    #[serde(default = "default_clear")]
    pub clear: Vec<String>,

    #[serde(default = "default_load")]
    pub load: Vec<String>,

    #[serde(default = "default_exclude_flag")]
    pub exclude_flag: String,

    /// Directory the commands run in
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn manage(args: &[&str]) -> Vec<String> {
    ["python", "manage.py"].iter().chain(args).map(|s| s.to_string()).collect()
}

fn default_dump() -> Vec<String> {
    manage(&["dumpdata", "--indent", "2"])
}

fn default_clear() -> Vec<String> {
    manage(&["flush", "--noinput"])
}

fn default_load() -> Vec<String> {
    manage(&["loaddata"])
}

fn default_exclude_flag() -> String {
    "--exclude".to_string()
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            dump: default_dump(),
            clear: default_clear(),
            load: default_load(),
            exclude_flag: default_exclude_flag(),
            working_dir: None,
        }
    }
}

pub struct CommandDataset {
    config: CommandConfig,
}

impl CommandDataset {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    fn command(&self, operation: &str, argv: &[String]) -> Result<Command> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Dataset(format!("No command configured for {}", operation)))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.config.working_dir {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }

    async fn run(&self, operation: &str, mut cmd: Command) -> Result<Vec<u8>> {
        debug!(operation, command = ?cmd.as_std(), "Running dataset command");
        let output = cmd
            .output()
            .await
            .map_err(|e| Error::Dataset(format!("Failed to run {} command: {}", operation, e)))?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(operation, status = %output.status, stderr = %stderr.trim(), "Dataset command failed");
            Err(Error::Dataset(format!(
                "{} command exited with {}: {}",
                operation,
                output.status,
                stderr.trim()
            )))
        }
    }
}

#[async_trait]
impl Dataset for CommandDataset {
    async fn dump(&self, output: &Path, exclusions: &[String]) -> Result<()> {
        let mut cmd = self.command("dump", &self.config.dump)?;
        for exclusion in exclusions {
            cmd.arg(&self.config.exclude_flag).arg(exclusion);
        }

        let stdout = self.run("dump", cmd).await?;
        fs::write(output, &stdout).await?;
        info!(path = %output.display(), bytes = stdout.len(), "Dataset dump written");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let cmd = self.command("clear", &self.config.clear)?;
        self.run("clear", cmd).await?;
        info!("Dataset cleared");
        Ok(())
    }

    async fn load(&self, input: &Path) -> Result<()> {
        let mut cmd = self.command("load", &self.config.load)?;
        cmd.arg(input);
        self.run("load", cmd).await?;
        info!(path = %input.display(), "Dataset loaded");
        Ok(())
    }

    fn name(&self) -> &str {
        "command"
    }
}
