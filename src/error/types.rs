//! Error types
//!
//! Defines the error taxonomy of the storage subsystem and the top-level
//! error used by the binary.

use std::fmt;
use std::io;

/// Storage module errors
#[derive(Debug)]
pub enum StorageError {
    /// Mounting failed or no media is present.
    DeviceUnavailable(String),
    /// A required directory could not be ensured during initialize.
    DirectorySetupFailed { path: String, reason: String },
    NotInitialized,
    /// Bytes written differ from bytes requested, or the file could not be opened.
    WriteIncomplete {
        path: String,
        expected: usize,
        written: usize,
    },
    StatsUnavailable,
    EmptyFrame,
    HealthCheckFailed(String),
    IoError(io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DeviceUnavailable(msg) => write!(f, "Storage device unavailable: {}", msg),
            StorageError::DirectorySetupFailed { path, reason } => {
                write!(f, "Failed to set up directory {}: {}", path, reason)
            }
            StorageError::NotInitialized => write!(f, "Storage not initialized"),
            StorageError::WriteIncomplete {
                path,
                expected,
                written,
            } => write!(
                f,
                "Incomplete write to {}: expected {} bytes, wrote {}",
                path, expected, written
            ),
            StorageError::StatsUnavailable => write!(f, "Storage statistics unavailable"),
            StorageError::EmptyFrame => write!(f, "Frame buffer is empty"),
            StorageError::HealthCheckFailed(msg) => write!(f, "Storage health check failed: {}", msg),
            StorageError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::IoError(error)
    }
}

/// General error that encompasses everything the binary can hit
#[derive(Debug)]
pub enum WildcamError {
    Config(config::ConfigError),
    Storage(StorageError),
    IoError(io::Error),
}

impl fmt::Display for WildcamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WildcamError::Config(e) => write!(f, "Configuration error: {}", e),
            WildcamError::Storage(e) => write!(f, "Storage error: {}", e),
            WildcamError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for WildcamError {}

impl From<config::ConfigError> for WildcamError {
    fn from(error: config::ConfigError) -> Self {
        WildcamError::Config(error)
    }
}

impl From<StorageError> for WildcamError {
    fn from(error: StorageError) -> Self {
        WildcamError::Storage(error)
    }
}

impl From<io::Error> for WildcamError {
    fn from(error: io::Error) -> Self {
        WildcamError::IoError(error)
    }
}
