pub mod backup;
pub mod delete;
pub mod download;
pub mod init;
pub mod restore;
pub mod units;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a pipeline runs; hidden in quiet mode.
pub(crate) fn spinner(cli: &crate::Cli, message: impl Into<String>) -> ProgressBar {
    if cli.quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
