pub mod archive;
pub mod audit;
pub mod config;
pub mod create;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod fsutil;
pub mod manifest;
pub mod naming;
pub mod repository;
pub mod restore;
pub mod size;
pub mod types;

#[cfg(test)]
mod testing;

pub use audit::{AuditAction, AuditRecord, AuditSink, TracingAuditSink};
pub use config::EngineConfig;
pub use dataset::Dataset;
pub use engine::BackupEngine;
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use naming::{suggest_name, validate_name};
pub use repository::{LocalRepository, UnitRepository};
pub use size::{format_size, report_size};
pub use types::*;
