use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid backup name {name:?}: only letters, digits, '_' and '-' are allowed")]
    InvalidName { name: String },

    #[error("Backup {name} already exists")]
    AlreadyExists { name: String },

    #[error("Backup {name} not found")]
    NotFound { name: String },

    #[error("Backup {name} is incomplete: dataset dump is missing")]
    MissingDump { name: String },

    #[error("Backup {name} has no media to restore")]
    MissingMedia { name: String },

    #[error("Restore must be explicitly confirmed")]
    NotConfirmed,

    #[error("Manifest for backup {name} is corrupt: {reason}")]
    Corrupt { name: String, reason: String },

    #[error("Backup {name} failed: {cause}")]
    BackupFailed {
        name: String,
        #[source]
        cause: Box<Error>,
    },

    #[error("Restore of backup {name} failed: {cause}")]
    RestoreFailed {
        name: String,
        #[source]
        cause: Box<Error>,
    },

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn backup_failed(name: &str, cause: Error) -> Self {
        Error::BackupFailed {
            name: name.to_string(),
            cause: Box::new(cause),
        }
    }

    pub(crate) fn restore_failed(name: &str, cause: Error) -> Self {
        Error::RestoreFailed {
            name: name.to_string(),
            cause: Box::new(cause),
        }
    }

    /// True for failures a caller can skip over when enumerating units.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Error::Corrupt { .. } | Error::NotFound { .. })
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Other(format!("Background task failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
