//! Install-time resolution errors

use super::TsdError;

pub fn runtime_unsupported(runtime: impl Into<String>, required: impl Into<String>) -> TsdError {
    TsdError::RuntimeUnsupported {
        runtime: runtime.into(),
        required: required.into(),
    }
}

pub fn missing(requirement: impl Into<String>) -> TsdError {
    TsdError::DependencyMissing {
        requirement: requirement.into(),
    }
}

pub fn conflict(
    name: impl Into<String>,
    found: impl Into<String>,
    requirement: impl Into<String>,
) -> TsdError {
    TsdError::DependencyConflict {
        name: name.into(),
        found: found.into(),
        requirement: requirement.into(),
    }
}

pub fn pinned_source_mismatch(
    name: impl Into<String>,
    expected: impl Into<String>,
    found: impl Into<String>,
) -> TsdError {
    TsdError::PinnedSourceMismatch {
        name: name.into(),
        expected: expected.into(),
        found: found.into(),
    }
}
