//! Entry-point dispatcher
//!
//! Each installed command forwards its arguments, environment and standard
//! streams to a collaborator program and reports that program's exit status
//! as its own. Nothing is parsed or retried here.

pub mod collaborator;
pub mod exit;

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, ExitCode};

use tracing::debug;

use crate::config::UserConfig;
use crate::error::Result;
use crate::error::dispatch::launch_failed;
use crate::manifest::PackageManifest;

pub use collaborator::{Collaborator, Located, Lookup, LookupSource};

/// Commands installed by the package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// Internal API client authentication
    TaclAuth,
    /// Storage transfer through the pinned s3cmd fork
    TsdS3cmd,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 2] = [EntryPoint::TaclAuth, EntryPoint::TsdS3cmd];

    pub fn script_name(self) -> &'static str {
        match self {
            EntryPoint::TaclAuth => "tacl_auth",
            EntryPoint::TsdS3cmd => "tsd-s3cmd",
        }
    }
}

/// How the collaborator is started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegation {
    /// Replace the current process (Unix only)
    Exec,
    /// Start a child, wait, and map its status
    Spawn,
}

impl Default for Delegation {
    fn default() -> Self {
        if cfg!(unix) {
            Delegation::Exec
        } else {
            Delegation::Spawn
        }
    }
}

/// Run `program` with `args`, inheriting environment and standard streams
///
/// Returns the exit code to report. With [`Delegation::Exec`] this only
/// returns when the program could not be started.
pub fn delegate(program: &Path, args: &[OsString], mode: Delegation) -> Result<u8> {
    let mut command = Command::new(program);
    command.args(args);
    debug!(program = %program.display(), args = args.len(), mode = ?mode, "delegating");

    match mode {
        Delegation::Exec => exec(&mut command, program),
        Delegation::Spawn => {
            let status = command
                .status()
                .map_err(|e| launch_failed(program.display().to_string(), e.to_string()))?;
            debug!(status = %status, "collaborator finished");
            Ok(exit::exit_code(status))
        }
    }
}

#[cfg(unix)]
fn exec(command: &mut Command, program: &Path) -> Result<u8> {
    use std::os::unix::process::CommandExt;

    let err = command.exec();
    Err(launch_failed(program.display().to_string(), err.to_string()))
}

#[cfg(not(unix))]
fn exec(command: &mut Command, program: &Path) -> Result<u8> {
    let status = command
        .status()
        .map_err(|e| launch_failed(program.display().to_string(), e.to_string()))?;
    Ok(exit::exit_code(status))
}

/// Resolve the collaborator for `entry` and hand over to it
pub fn dispatch(
    entry: EntryPoint,
    args: &[OsString],
    config: &UserConfig,
    mode: Delegation,
) -> Result<u8> {
    let manifest = PackageManifest::current()?;
    let collaborator = Collaborator::for_script(&manifest, entry.script_name())?;
    let located = Lookup::from_process(&collaborator, config).locate(&collaborator)?;
    delegate(&located.path, args, mode)
}

/// Process entry for an installed command
pub fn run(entry: EntryPoint) -> ExitCode {
    let config = UserConfig::load();
    crate::logging::init(config.as_ref().ok().and_then(|c| c.log.as_deref()));

    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    let result =
        config.and_then(|config| dispatch(entry, &args, &config, Delegation::default()));

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            crate::ui::report_error(&err);
            ExitCode::from(err.exit_code())
        }
    }
}
