//! Error types for parts_registry

use std::fmt;

/// Unified error type for registry operations
#[derive(Debug)]
pub enum RegistryError {
    /// User input failed validation (missing field, empty query, bad image format)
    Validation(String),
    /// Vendor code already exists in the store
    DuplicateCode(String),
    /// Database operation failed
    Database(rusqlite::Error),
    /// File I/O failed (image storage, spreadsheet write)
    Io(std::io::Error),
    /// Spreadsheet serialization failed
    Csv(csv::Error),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Validation(msg) => write!(f, "{}", msg),
            RegistryError::DuplicateCode(code) => write!(f, "Code {} already exists", code),
            RegistryError::Database(e) => write!(f, "Database error: {}", e),
            RegistryError::Io(e) => write!(f, "I/O error: {}", e),
            RegistryError::Csv(e) => write!(f, "Spreadsheet error: {}", e),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Database(e) => Some(e),
            RegistryError::Io(e) => Some(e),
            RegistryError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for RegistryError {
    fn from(err: rusqlite::Error) -> Self {
        RegistryError::Database(err)
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        RegistryError::Io(err)
    }
}

impl From<csv::Error> for RegistryError {
    fn from(err: csv::Error) -> Self {
        RegistryError::Csv(err)
    }
}

/// Result alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
