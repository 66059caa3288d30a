//! Exit status propagation

use std::process::ExitStatus;

use crate::error::EXIT_FAILURE;

/// Offset shells add to a terminating signal number
const SIGNAL_EXIT_BASE: i32 = 128;

/// Map a finished child to the exit code the wrapper reports
///
/// Normal exits keep their code; a child killed by signal `n` maps to
/// `128 + n` the way POSIX shells report it.
pub fn exit_code(status: ExitStatus) -> u8 {
    if let Some(code) = status.code() {
        return truncate(code);
    }
    signal_exit_code(status).unwrap_or(EXIT_FAILURE)
}

/// Keep the low byte, never turning a failure into success
fn truncate(code: i32) -> u8 {
    match u8::try_from(code & 0xff) {
        Ok(0) if code != 0 => EXIT_FAILURE,
        Ok(byte) => byte,
        Err(_) => EXIT_FAILURE,
    }
}

#[cfg(unix)]
fn signal_exit_code(status: ExitStatus) -> Option<u8> {
    use std::os::unix::process::ExitStatusExt;

    status
        .signal()
        .map(|signal| truncate(SIGNAL_EXIT_BASE + signal))
}

#[cfg(not(unix))]
fn signal_exit_code(_status: ExitStatus) -> Option<u8> {
    None
}
