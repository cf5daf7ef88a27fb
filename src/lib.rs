//! Parsing and expansion for the `smallsh` command interpreter.
//!
//! Only the pure pieces live here so fuzz targets and black-box tests can
//! link them without the process, signal and line-editing dependencies the
//! binary needs.

mod error;
mod expansion;
mod mode;
mod parse;

pub use error::{ErrorKind, ShellError, ShellResult};
pub use expansion::{PID_MARKER, expand_marker, expand_pid};
pub use mode::{ForegroundMode, ModeTransition};
pub use parse::{CommandSpec, NULL_DEVICE, Token, parse_command, tokenize};

/// Parse a line and resolve it the way the executor would under the given
/// foreground-only setting: `&` is dropped when the mode is on, otherwise a
/// background command gets the null device for any stream it left alone.
pub fn parse_with_mode(line: &str, foreground_only: bool) -> ShellResult<CommandSpec> {
    let mut cmd = parse_command(line)?.with_background_defaults(foreground_only);
    if foreground_only {
        cmd.background = false;
    }
    Ok(cmd)
}

/// Fuzz helper for parser-only targets.
pub fn fuzz_parse_bytes(data: &[u8]) {
    let input = String::from_utf8_lossy(data);
    let _ = tokenize(&input).len();
    if let Ok(cmd) = parse_command(&input) {
        let _ = cmd.with_background_defaults(false);
    }
}

/// Fuzz helper for expansion followed by parsing.
pub fn fuzz_expand_bytes(data: &[u8]) {
    let mut line = String::from_utf8_lossy(data).into_owned();
    expand_pid(&mut line, u32::MAX);
    if let Err(err) = parse_command(&line) {
        let _ = err.display_with_input(&line);
    }
}
