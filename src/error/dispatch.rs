//! Collaborator lookup and launch errors

use super::TsdError;

/// Creates a collaborator not found error
pub fn not_found(
    entry_point: impl Into<String>,
    program: impl Into<String>,
    hint: impl Into<String>,
) -> TsdError {
    TsdError::CollaboratorNotFound {
        entry_point: entry_point.into(),
        program: program.into(),
        hint: hint.into(),
    }
}

/// Creates a collaborator not executable error
pub fn not_executable(
    entry_point: impl Into<String>,
    path: impl Into<String>,
    env_var: impl Into<String>,
) -> TsdError {
    TsdError::CollaboratorNotExecutable {
        entry_point: entry_point.into(),
        path: path.into(),
        env_var: env_var.into(),
    }
}

/// Creates a launch failed error
pub fn launch_failed(path: impl Into<String>, reason: impl Into<String>) -> TsdError {
    TsdError::CollaboratorLaunchFailed {
        path: path.into(),
        reason: reason.into(),
    }
}
