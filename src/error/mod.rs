//! Error types and handling for tsd-s3cmd
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`version`]: Version, specifier, requirement and marker parsing errors
//! - [`manifest`]: Packaging metadata errors
//! - [`install`]: Install-time resolution errors
//! - [`dispatch`]: Collaborator lookup and launch errors
//! - [`config`]: Configuration file errors

pub mod config;
pub mod dispatch;
pub mod install;
pub mod manifest;
pub mod version;

use miette::Diagnostic;
use thiserror::Error;

/// Exit code for configuration problems (`EX_CONFIG` from sysexits.h)
pub const EXIT_CONFIG: u8 = 78;

/// Exit code for every other failure raised by the wrapper itself
pub const EXIT_FAILURE: u8 = 1;

/// Main error type for tsd-s3cmd operations
#[derive(Error, Diagnostic, Debug)]
pub enum TsdError {
    // Parsing errors
    #[error("Invalid version '{input}': {reason}")]
    #[diagnostic(
        code(tsd_s3cmd::version::invalid),
        help("Versions follow PEP 440, e.g. 3.4.3, 1.0rc1, 2.0.post1")
    )]
    InvalidVersion { input: String, reason: String },

    #[error("Invalid version specifier '{input}': {reason}")]
    #[diagnostic(
        code(tsd_s3cmd::version::invalid_specifier),
        help("Specifiers look like >=3.4.3, ==1.*, ~=2.1 or a comma-separated list of them")
    )]
    InvalidSpecifier { input: String, reason: String },

    #[error("Invalid requirement '{input}': {reason}")]
    #[diagnostic(code(tsd_s3cmd::requirement::invalid))]
    InvalidRequirement { input: String, reason: String },

    #[error("Invalid environment marker '{input}': {reason}")]
    #[diagnostic(code(tsd_s3cmd::requirement::invalid_marker))]
    InvalidMarker { input: String, reason: String },

    // Manifest errors
    #[error("Invalid package manifest: {message}")]
    #[diagnostic(code(tsd_s3cmd::manifest::invalid))]
    ManifestInvalid { message: String },

    #[error("Release history violates an invariant: {message}")]
    #[diagnostic(code(tsd_s3cmd::manifest::history))]
    ReleaseHistoryInvalid { message: String },

    // Installation errors
    #[error("Runtime {runtime} is not supported (requires {required})")]
    #[diagnostic(
        code(tsd_s3cmd::install::runtime_unsupported),
        help("Install into an environment whose runtime satisfies the requirement")
    )]
    RuntimeUnsupported { runtime: String, required: String },

    #[error("Dependency not available: {requirement}")]
    #[diagnostic(code(tsd_s3cmd::install::missing))]
    DependencyMissing { requirement: String },

    #[error("Dependency conflict: {name} {found} does not satisfy {requirement}")]
    #[diagnostic(code(tsd_s3cmd::install::conflict))]
    DependencyConflict {
        name: String,
        found: String,
        requirement: String,
    },

    #[error("Pinned source mismatch for {name}: expected {expected}, found {found}")]
    #[diagnostic(
        code(tsd_s3cmd::install::pinned_source_mismatch),
        help("The dependency is pinned to a specific fork; install it from the pinned URL")
    )]
    PinnedSourceMismatch {
        name: String,
        expected: String,
        found: String,
    },

    // Dispatch errors
    #[error("Command '{program}' for {entry_point} not found")]
    #[diagnostic(
        code(tsd_s3cmd::dispatch::not_found),
        help("{hint}")
    )]
    CollaboratorNotFound {
        entry_point: String,
        program: String,
        hint: String,
    },

    #[error("Command '{path}' for {entry_point} is not an executable file")]
    #[diagnostic(
        code(tsd_s3cmd::dispatch::not_executable),
        help("Check the file permissions or point {env_var} at the right program")
    )]
    CollaboratorNotExecutable {
        entry_point: String,
        path: String,
        env_var: String,
    },

    #[error("Failed to launch '{path}': {reason}")]
    #[diagnostic(code(tsd_s3cmd::dispatch::launch_failed))]
    CollaboratorLaunchFailed { path: String, reason: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(tsd_s3cmd::config::not_found),
        help("Unset TSD_S3CMD_CONFIG or point it at an existing file")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(tsd_s3cmd::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}")]
    #[diagnostic(code(tsd_s3cmd::config::parse_failed), help("{reason}"))]
    ConfigParseFailed { path: String, reason: String },
}

impl TsdError {
    /// Process exit code the wrapper reports for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::CollaboratorNotFound { .. }
            | Self::CollaboratorNotExecutable { .. }
            | Self::CollaboratorLaunchFailed { .. }
            | Self::ConfigNotFound { .. }
            | Self::ConfigReadFailed { .. }
            | Self::ConfigParseFailed { .. } => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }
}

impl From<serde_yaml::Error> for TsdError {
    fn from(err: serde_yaml::Error) -> Self {
        TsdError::ManifestInvalid {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, TsdError>;
