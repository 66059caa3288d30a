//! Parsing errors for versions, specifiers, requirements and markers

use super::TsdError;

pub fn invalid_version(input: impl Into<String>, reason: impl Into<String>) -> TsdError {
    TsdError::InvalidVersion {
        input: input.into(),
        reason: reason.into(),
    }
}

pub fn invalid_specifier(input: impl Into<String>, reason: impl Into<String>) -> TsdError {
    TsdError::InvalidSpecifier {
        input: input.into(),
        reason: reason.into(),
    }
}

pub fn invalid_requirement(input: impl Into<String>, reason: impl Into<String>) -> TsdError {
    TsdError::InvalidRequirement {
        input: input.into(),
        reason: reason.into(),
    }
}

pub fn invalid_marker(input: impl Into<String>, reason: impl Into<String>) -> TsdError {
    TsdError::InvalidMarker {
        input: input.into(),
        reason: reason.into(),
    }
}
