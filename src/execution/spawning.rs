use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;

use log::debug;
use nix::unistd::{ForkResult, Pid, fork};

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::CommandSpec;
use crate::signals::reset_child_signals;

use super::redirection::apply_redirections;

pub(crate) fn build_command(cmd: &CommandSpec, foreground: bool) -> ShellResult<Command> {
    let Some((program, args)) = cmd.args.split_first() else {
        return Err(ShellError::new(ErrorKind::Execution, "empty command"));
    };
    let mut command = Command::new(program);
    command.args(args);

    apply_redirections(&mut command, cmd)?;
    // Dispositions must change in the child only, after fork and before exec.
    unsafe {
        command.pre_exec(move || reset_child_signals(foreground));
    }

    Ok(command)
}

pub(crate) fn spawn_command(command: &mut Command, trace: bool) -> ShellResult<Pid> {
    let program = command.get_program().to_string_lossy().into_owned();
    let child = command
        .spawn()
        .map_err(|err| wrap_spawn_error(&program, err))?;
    if trace {
        eprintln!("trace: spawn pid {}", child.id());
    }
    debug!("job event=spawn program={} pid={}", program, child.id());
    Ok(Pid::from_raw(child.id() as i32))
}

/// Resource exhaustion while creating the process is fatal; anything that
/// went wrong at exec time only affects this command.
pub(crate) fn wrap_spawn_error(program: &str, err: io::Error) -> ShellError {
    debug!("job event=spawn program={} error={}", program, err);
    match err.raw_os_error() {
        Some(libc::EAGAIN) | Some(libc::ENOMEM) => ShellError::new(
            ErrorKind::Spawn,
            format!("{program}: cannot create process: {err}"),
        ),
        _ if is_exec_failure(&err) => {
            ShellError::new(ErrorKind::Execution, format!("{program}: command not found"))
                .with_context(err.to_string())
        }
        _ => ShellError::new(ErrorKind::Execution, format!("{program}: {err}")),
    }
}

/// Fork a child that exits 1 straight away. A background command that could
/// not be started still gets a PID and a reaper report this way.
pub(crate) fn spawn_failed_job(program: &str) -> ShellResult<Pid> {
    match unsafe { fork() } {
        Ok(ForkResult::Child) => unsafe { libc::_exit(1) },
        Ok(ForkResult::Parent { child }) => {
            debug!("job event=spawn program={} pid={} failed=true", program, child);
            Ok(child)
        }
        Err(err) => Err(ShellError::new(
            ErrorKind::Spawn,
            format!("{program}: cannot create process: {err}"),
        )),
    }
}

fn is_exec_failure(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) {
        return true;
    }
    matches!(
        err.raw_os_error(),
        Some(
            libc::ENOEXEC
                | libc::ENOTDIR
                | libc::EISDIR
                | libc::ELOOP
                | libc::ENAMETOOLONG
                | libc::ETXTBSY
        )
    )
}
