//! Error types for gatepass.
//!
//! This module defines the error types used throughout the gatepass crate.
//! Storage and filesystem faults are never recovered locally; they bubble up
//! to the HTTP layer, which turns them into a generic server error.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for gatepass operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === QR Errors ===
    /// The profile URL could not be encoded as a QR symbol.
    #[error("failed to encode QR code: {0}")]
    QrEncode(#[from] qrcode::types::QrError),

    /// The rendered QR symbol could not be encoded as an image.
    #[error("failed to encode QR image: {0}")]
    ImageEncode(#[from] image::ImageError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a QR artifact.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Path that couldn't be written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Runtime Errors ===
    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A specialized Result type for gatepass operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}

/// A gatepass number that failed validation at the start step.
///
/// This is a user-facing outcome, not a fault: the form is re-rendered with
/// [`ValidationError::message`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// The submitted gatepass number was empty or whitespace only.
    #[error("Gatepass number cannot be empty.")]
    EmptyGatepass,
}

impl ValidationError {
    /// The message shown next to the input field.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("port must be greater than 0");
        assert!(err.to_string().contains("port must be greater than 0"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_file_write_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::FileWrite {
            path: PathBuf::from("static/qrcodes/person_1.png"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("person_1.png"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_validation_error_message() {
        assert_eq!(
            ValidationError::EmptyGatepass.message(),
            "Gatepass number cannot be empty."
        );
    }
}
