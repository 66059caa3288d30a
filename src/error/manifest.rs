//! Manifest errors

use super::TsdError;

/// Creates an invalid manifest error
pub fn invalid(message: impl Into<String>) -> TsdError {
    TsdError::ManifestInvalid {
        message: message.into(),
    }
}

/// Creates a release history invariant error
pub fn history_invalid(message: impl Into<String>) -> TsdError {
    TsdError::ReleaseHistoryInvalid {
        message: message.into(),
    }
}
