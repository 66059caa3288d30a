//! Terminal output for the wrapper's own messages
//!
//! Everything here goes to stderr; stdout belongs to the collaborator.

use console::Style;
use miette::Diagnostic;

use crate::error::TsdError;

/// Render an error as `Error: <message>` plus an optional `help:` line
pub fn format_error(err: &TsdError, colored: bool) -> String {
    let label = Style::new().red().bold().force_styling(colored);
    let hint = Style::new().cyan().force_styling(colored);

    let mut out = format!("{} {}", label.apply_to("Error:"), err);
    if let Some(help) = err.help() {
        out.push_str(&format!("\n  {} {}", hint.apply_to("help:"), help));
    }
    out
}

/// Print an error to stderr, colored when stderr is a terminal
pub fn report_error(err: &TsdError) {
    eprintln!("{}", format_error(err, console::colors_enabled_stderr()));
}
