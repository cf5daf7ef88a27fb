use std::io::{self, Write};
use std::process;

use log::debug;
use rustyline::{Config, DefaultEditor, Editor};

use crate::config::ShellConfig;
use crate::error::ShellResult;
use crate::execution::{ExecContext, Flow, execute_command};
use crate::expansion::expand_pid;
use crate::io_helpers::{is_ignorable, read_input_line};
use crate::job_control::{BackgroundJobs, Termination, reap_jobs};
use crate::mode::ForegroundMode;
use crate::parse::parse_command;
use crate::signals::PROMPT;

pub(crate) struct ShellState {
    // Only present when stdin is a terminal and the editor is enabled.
    pub(crate) editor: Option<DefaultEditor>,
    // Shared with the SIGTSTP handler.
    pub(crate) mode: ForegroundMode,
    pub(crate) jobs: BackgroundJobs,
    // Status of the last foreground external command; built-ins never touch it.
    pub(crate) last_status: Termination,
    pub(crate) pid: u32,
    pub(crate) config: ShellConfig,
}

pub(crate) fn init_state(config: ShellConfig, mode: ForegroundMode) -> io::Result<ShellState> {
    let interactive = unsafe { libc::isatty(libc::STDIN_FILENO) == 1 };
    let editor = if config.line_editor && interactive {
        let editor_config = Config::builder()
            .auto_add_history(true)
            .edit_mode(config.edit_mode)
            .build();
        Some(Editor::with_config(editor_config).map_err(io::Error::other)?)
    } else {
        None
    };
    debug!(
        "shell event=init interactive={} editor={}",
        interactive,
        editor.is_some()
    );

    Ok(ShellState {
        editor,
        mode,
        jobs: BackgroundJobs::new(),
        last_status: Termination::default(),
        pid: process::id(),
        config,
    })
}

/// Read and run one line. Returns `false` once the shell should stop.
pub(crate) fn run_once<W: Write>(state: &mut ShellState, out: &mut W) -> ShellResult<bool> {
    reap_jobs(&mut state.jobs, out)?;

    let mut line = match read_input_line(state.editor.as_mut(), PROMPT)? {
        Some(line) => line,
        None => {
            debug!("shell event=eof");
            return Ok(false);
        }
    };
    if is_ignorable(&line) {
        return Ok(true);
    }

    expand_pid(&mut line, state.pid);
    if state.config.trace {
        eprintln!("trace: line {line:?}");
    }

    let cmd = match parse_command(&line) {
        Ok(cmd) => cmd,
        Err(err) => {
            writeln!(out, "{err}")?;
            out.flush()?;
            if state.config.trace {
                eprintln!("{}", err.display_with_input(&line));
            }
            return Ok(true);
        }
    };
    if state.config.trace {
        eprintln!("trace: command {cmd:?}");
    }

    let mut ctx = ExecContext {
        mode: &state.mode,
        jobs: &mut state.jobs,
        trace: state.config.trace,
    };
    match execute_command(cmd, state.last_status, &mut ctx, out)? {
        Flow::Exit => Ok(false),
        Flow::Continue(status) => {
            state.last_status = status;
            Ok(true)
        }
    }
}

/// Drive the shell until `exit`, end of input or a fatal error, then clean
/// up background jobs. Returns the process exit status.
pub(crate) fn run(state: &mut ShellState) -> i32 {
    let stdout = io::stdout();
    let code = loop {
        let mut out = stdout.lock();
        match run_once(state, &mut out) {
            Ok(true) => {}
            Ok(false) => break 0,
            Err(err) if err.is_fatal() => {
                debug!("shell event=fatal kind={}", err.kind);
                eprintln!("{err}");
                break 1;
            }
            Err(err) => eprintln!("{err}"),
        }
    };
    shutdown(state);
    code
}

fn shutdown(state: &mut ShellState) {
    if state.jobs.is_empty() {
        debug!("shell event=shutdown jobs=0");
        return;
    }
    let jobs = state.jobs.len();
    let killed = state.jobs.terminate_all(state.config.exit_grace);
    debug!("shell event=shutdown jobs={} sigkill={}", jobs, killed);
}
