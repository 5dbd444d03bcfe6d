use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("Legacy config error: {0}")]
    LegacyConfigError(#[from] SourceError),

    #[error("failed to write {}: {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {reason}")]
    ConfigValidationError { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum LockError {
    #[error("lock {} is held by another process", .0.display())]
    Unavailable(PathBuf),

    #[error("failed to lock {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a legacy settings source could not be loaded. `NotFound` lets the
/// run proceed with every field absent; the others abort it before any write.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("legacy config {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read legacy config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse legacy config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    High,
    Critical,
}

impl MigrateError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MigrateError::Lock(_)
            | MigrateError::LegacyConfigError(SourceError::Parse { .. })
            | MigrateError::ConfigValidationError { .. } => ErrorSeverity::High,
            MigrateError::LegacyConfigError(_)
            | MigrateError::WriteError { .. }
            | MigrateError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MigrateError::Lock(LockError::Unavailable(_)) => "Failed to acquire lock.".to_string(),
            MigrateError::Lock(LockError::Io { path, .. }) => {
                format!("Failed to acquire lock on {}.", path.display())
            }
            MigrateError::WriteError { path, .. } => {
                format!("Could not write {}; the previous file is unchanged.", path.display())
            }
            MigrateError::LegacyConfigError(e) => {
                format!("Python config could not be imported, nothing was written: {e}")
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MigrateError::Lock(LockError::Unavailable(_)) => {
                "Another migration is running; wait for it to finish and retry"
            }
            MigrateError::Lock(LockError::Io { .. }) => {
                "Check that the lock directory exists and is writable"
            }
            MigrateError::LegacyConfigError(SourceError::Parse { .. }) => {
                "Fix the syntax error in the legacy config and rerun"
            }
            MigrateError::LegacyConfigError(_) => {
                "Check that the legacy config is readable by this user"
            }
            MigrateError::WriteError { .. } => {
                "Check permissions and free space in the config directory"
            }
            MigrateError::SerializationError(_) => "Inspect the legacy config for unusual values",
            MigrateError::ConfigValidationError { .. } => {
                "Check the SECUREDROP_* path overrides in the environment"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
