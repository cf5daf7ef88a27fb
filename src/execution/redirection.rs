use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::process::{Command, Stdio};

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::CommandSpec;

const OUTPUT_MODE: u32 = 0o644;

/// Open the redirection targets and hand them to the child as fd 0 and 1.
///
/// Files are opened close-on-exec; `Stdio` dups them onto the standard
/// descriptors in the child only, so the shell's own stdin/stdout never
/// move. Input is opened first, so a bad input path leaves the output file
/// untouched.
pub(crate) fn apply_redirections(command: &mut Command, cmd: &CommandSpec) -> ShellResult<()> {
    if let Some(ref path) = cmd.stdin {
        let file = open_input(path).map_err(|err| open_error(path, "input", err))?;
        command.stdin(Stdio::from(file));
    }
    if let Some(ref path) = cmd.stdout {
        let file = open_output(path).map_err(|err| open_error(path, "output", err))?;
        command.stdout(Stdio::from(file));
    }
    Ok(())
}

fn open_input(path: &str) -> io::Result<File> {
    OpenOptions::new().read(true).open(path)
}

fn open_output(path: &str) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(OUTPUT_MODE)
        .open(path)
}

fn open_error(path: &str, stream: &str, err: io::Error) -> ShellError {
    ShellError::new(
        ErrorKind::Redirection,
        format!("cannot open {path} for {stream}"),
    )
    .with_context(err.to_string())
}
