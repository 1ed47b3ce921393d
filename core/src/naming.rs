//! Backup unit names.
//!
//! Names double as directory names under the backup root, so they are
//! restricted to `[A-Za-z0-9_-]+`.

use crate::{Error, Result};
use chrono::{DateTime, TimeZone};

pub const AUTO_PREFIX: &str = "auto_backup_";
pub const MANUAL_PREFIX: &str = "manual_";

pub fn validate_name(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Returns the name unchanged when valid, `Error::InvalidName` otherwise.
pub fn check_name(candidate: &str) -> Result<&str> {
    if validate_name(candidate) {
        Ok(candidate)
    } else {
        Err(Error::InvalidName {
            name: candidate.to_string(),
        })
    }
}

pub fn suggest_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("backup_{}", now.format("%Y%m%d_%H%M%S"))
}

pub fn manual_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}", MANUAL_PREFIX, now.format("%Y%m%d_%H%M%S"))
}

/// One automatic backup per day.
pub fn auto_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}", AUTO_PREFIX, now.format("%Y%m%d"))
}

/// Picks the user-supplied name when it has any non-whitespace content,
/// falling back to the suggested one.
pub fn resolve_name<Tz: TimeZone>(candidate: Option<&str>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match candidate.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => suggest_name(now),
    }
}
