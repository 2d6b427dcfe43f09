//! Error handlers
//!
//! Provides error reporting for the binary.

use crate::error::types::{StorageError, WildcamError};
use log::error;

/// Log a top-level error
pub fn handle_error(err: &WildcamError) {
    error!("Wildcam storage error: {}", err);
}

/// Convert error to a process exit code
pub fn exit_code(err: &WildcamError) -> i32 {
    match err {
        WildcamError::Config(_) => 78,
        WildcamError::Storage(StorageError::DeviceUnavailable(_)) => 69,
        WildcamError::Storage(StorageError::DirectorySetupFailed { .. }) => 73,
        WildcamError::Storage(_) => 74,
        WildcamError::IoError(_) => 74,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let err = WildcamError::from(StorageError::DeviceUnavailable("no card".into()));
        assert_eq!(exit_code(&err), 69);

        let err = WildcamError::from(StorageError::NotInitialized);
        assert_eq!(exit_code(&err), 74);

        let err = WildcamError::from(config::ConfigError::Message("bad".into()));
        assert_eq!(exit_code(&err), 78);
    }
}
