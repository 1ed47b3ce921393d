//! Audit records emitted by the orchestration layer after a pipeline returns.
//!
//! The engine itself never emits them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Restore,
    Delete,
    Download,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditAction::Create => "create",
            AuditAction::Restore => "restore",
            AuditAction::Delete => "delete",
            AuditAction::Download => "download",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub action: AuditAction,
    pub subject: String,
    pub actor: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(action: AuditAction, subject: impl Into<String>, actor: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action,
            subject: subject.into(),
            actor: actor.into(),
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Fire-and-forget sink; implementations must not fail the caller.
pub trait AuditSink: Send + Sync {
    fn emit(&self, record: AuditRecord);
}

/// Writes records to the `audit` tracing target.
#[derive(Debug, Default, Clone)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, record: AuditRecord) {
        info!(
            target: "audit",
            action = %record.action,
            subject = %record.subject,
            actor = %record.actor,
            at = %record.at.to_rfc3339(),
            "{}",
            record.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collecting(Mutex<Vec<AuditRecord>>);

    impl AuditSink for Collecting {
        fn emit(&self, record: AuditRecord) {
            self.0.lock().unwrap().push(record);
        }
    }

    #[test]
    fn test_sink_receives_records() {
        let sink = Collecting::default();
        let sinks: Vec<&dyn AuditSink> = vec![&sink, &TracingAuditSink];
        for s in sinks {
            s.emit(AuditRecord::new(AuditAction::Delete, "nightly", "alice", "Deleted backup nightly"));
        }

        let records = sink.0.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AuditAction::Delete);
        assert_eq!(records[0].subject, "nightly");
        assert_eq!(records[0].action.to_string(), "delete");
    }
}
