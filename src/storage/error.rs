//! Error types for storage operations

use std::fmt;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug)]
pub enum StorageError {
    /// I/O error (file access, etc.)
    Io(std::io::Error),

    /// Malformed table contents
    Parse(String),

    /// A config for this domain already exists
    DuplicateDomain(String),

    /// No config exists for this domain
    DomainNotFound(String),

    /// Backend-specific error
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "I/O error: {}", err),
            StorageError::Parse(msg) => write!(f, "failed to parse stored data: {}", msg),
            StorageError::DuplicateDomain(domain) => {
                write!(f, "domain '{}' already exists", domain)
            }
            StorageError::DomainNotFound(domain) => write!(f, "domain '{}' not found", domain),
            StorageError::Backend(msg) => write!(f, "storage backend error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<csv::Error> for StorageError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(_) => StorageError::Backend(err.to_string()),
            _ => StorageError::Parse(err.to_string()),
        }
    }
}
