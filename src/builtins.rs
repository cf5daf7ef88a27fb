use std::env;
use std::io::{self, Write};

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::execution::Flow;
use crate::job_control::Termination;
use crate::parse::CommandSpec;

pub fn is_builtin(name: &str) -> bool {
    matches!(name, "exit" | "cd" | "status")
}

/// Run `cmd` inside the shell if it names a built-in. Built-ins ignore
/// redirections and `&`, and never change the foreground status.
pub fn execute_builtin<W: Write>(
    cmd: &CommandSpec,
    last_status: Termination,
    out: &mut W,
) -> io::Result<Option<Flow>> {
    if !is_builtin(cmd.program()) {
        return Ok(None);
    }
    match cmd.program() {
        "exit" => Ok(Some(Flow::Exit)),
        "cd" => {
            if let Err(err) = change_directory(cmd.args.get(1).map(String::as_str)) {
                writeln!(out, "{}", err.message)?;
                out.flush()?;
            }
            Ok(Some(Flow::Continue(last_status)))
        }
        "status" => {
            writeln!(out, "{last_status}")?;
            out.flush()?;
            Ok(Some(Flow::Continue(last_status)))
        }
        _ => Ok(None),
    }
}

fn change_directory(target: Option<&str>) -> ShellResult<()> {
    let target = match target {
        Some(path) => path.to_string(),
        None => env::var("HOME")
            .map_err(|_| ShellError::new(ErrorKind::Builtin, "cd: HOME not set"))?,
    };
    env::set_current_dir(&target).map_err(|err| {
        ShellError::new(ErrorKind::Builtin, format!("cd: {target}: {err}"))
    })
}
