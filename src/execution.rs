use std::io::Write;

use log::debug;

use crate::builtins::execute_builtin;
use crate::error::ShellResult;
use crate::job_control::{BackgroundJobs, Termination, wait_foreground};
use crate::mode::ForegroundMode;
use crate::parse::CommandSpec;

mod redirection;
mod spawning;

use spawning::{build_command, spawn_command, spawn_failed_job};

/// What the read loop should do after a command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Flow {
    /// Keep reading; carries the (possibly updated) foreground status.
    Continue(Termination),
    /// `exit` was requested.
    Exit,
}

pub struct ExecContext<'a> {
    pub mode: &'a ForegroundMode,
    pub jobs: &'a mut BackgroundJobs,
    pub trace: bool,
}

/// Run one parsed command and return the next foreground status.
///
/// The foreground-only flag is read once here. That single snapshot decides
/// the null-device defaults, whether the shell waits, and the child's SIGINT
/// disposition, so a toggle arriving mid-command cannot split them.
pub fn execute_command<W: Write>(
    cmd: CommandSpec,
    last_status: Termination,
    ctx: &mut ExecContext<'_>,
    out: &mut W,
) -> ShellResult<Flow> {
    if let Some(flow) = execute_builtin(&cmd, last_status, out)? {
        return Ok(flow);
    }

    let foreground_only = ctx.mode.is_enabled();
    let cmd = cmd.with_background_defaults(foreground_only);
    let foreground = cmd.runs_in_foreground(foreground_only);
    if ctx.trace {
        eprintln!(
            "trace: launch argv={:?} stdin={:?} stdout={:?} foreground={}",
            cmd.args, cmd.stdin, cmd.stdout, foreground
        );
    }

    let launched = build_command(&cmd, foreground)
        .and_then(|mut command| spawn_command(&mut command, ctx.trace));
    let pid = match launched {
        Ok(pid) => pid,
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) if foreground => {
            // Reported the way a child that failed before exec would be.
            writeln!(out, "{}", err.message)?;
            out.flush()?;
            return Ok(Flow::Continue(Termination::Exited(1)));
        }
        Err(err) => {
            let pid = spawn_failed_job(cmd.program())?;
            ctx.jobs.register(pid);
            writeln!(out, "background pid is {pid}")?;
            writeln!(out, "{}", err.message)?;
            out.flush()?;
            return Ok(Flow::Continue(last_status));
        }
    };

    if !foreground {
        ctx.jobs.register(pid);
        writeln!(out, "background pid is {pid}")?;
        out.flush()?;
        return Ok(Flow::Continue(last_status));
    }

    debug!(
        "job event=foreground pid={} foreground_only={}",
        pid, foreground_only
    );
    let status = wait_foreground(pid)?;
    if let Termination::Signaled(_) = status {
        writeln!(out, "{status}")?;
        out.flush()?;
    }
    Ok(Flow::Continue(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job_control::reap_jobs;
    use crate::parse::parse_command;
    use serial_test::serial;
    use std::fs;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    struct Harness {
        mode: ForegroundMode,
        jobs: BackgroundJobs,
        status: Termination,
        out: Vec<u8>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                mode: ForegroundMode::new(),
                jobs: BackgroundJobs::new(),
                status: Termination::default(),
                out: Vec::new(),
            }
        }

        fn run(&mut self, line: &str) -> Flow {
            let cmd = parse_command(line).unwrap();
            let mut ctx = ExecContext {
                mode: &self.mode,
                jobs: &mut self.jobs,
                trace: false,
            };
            let flow = execute_command(cmd, self.status, &mut ctx, &mut self.out).unwrap();
            if let Flow::Continue(status) = flow {
                self.status = status;
            }
            flow
        }

        fn take_output(&mut self) -> String {
            String::from_utf8(std::mem::take(&mut self.out)).unwrap()
        }

        fn reap_until_idle(&mut self) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while !self.jobs.is_empty() && Instant::now() < deadline {
                reap_jobs(&mut self.jobs, &mut self.out).unwrap();
                thread::sleep(Duration::from_millis(20));
            }
        }
    }

    fn script(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path.display().to_string()
    }

    #[test]
    #[serial]
    fn foreground_exit_code_feeds_status() {
        let dir = tempdir().unwrap();
        let exit3 = script(&dir, "exit3.sh", "exit 3\n");
        let mut shell = Harness::new();

        shell.run(&format!("sh {exit3}"));
        assert_eq!(shell.status, Termination::Exited(3));
        assert!(shell.take_output().is_empty());

        shell.run("status");
        assert_eq!(shell.take_output(), "exit value 3\n");
    }

    #[test]
    #[serial]
    fn signaled_foreground_child_is_reported_immediately() {
        let dir = tempdir().unwrap();
        let selfkill = script(&dir, "selfkill.sh", "kill -9 $$\n");
        let mut shell = Harness::new();

        shell.run(&format!("sh {selfkill}"));
        assert_eq!(shell.take_output(), "terminated by signal 9\n");

        shell.run("status");
        assert_eq!(shell.take_output(), "terminated by signal 9\n");
    }

    #[test]
    #[serial]
    fn unknown_program_sets_exit_value_one() {
        let mut shell = Harness::new();
        shell.run("smallsh-missing-program --flag");
        assert_eq!(
            shell.take_output(),
            "smallsh-missing-program: command not found\n"
        );
        assert_eq!(shell.status, Termination::Exited(1));
    }

    #[test]
    #[serial]
    fn redirection_failure_sets_exit_value_one() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.txt").display().to_string();
        let mut shell = Harness::new();

        shell.run(&format!("wc < {missing}"));
        assert_eq!(
            shell.take_output(),
            format!("cannot open {missing} for input\n")
        );
        assert_eq!(shell.status, Termination::Exited(1));
    }

    #[test]
    #[serial]
    fn output_redirection_writes_file() {
        let dir = tempdir().unwrap();
        let out_path = dir.path().join("out.txt").display().to_string();
        let mut shell = Harness::new();

        shell.run(&format!("echo hello > {out_path}"));
        assert_eq!(fs::read_to_string(&out_path).unwrap(), "hello\n");
        assert_eq!(shell.status, Termination::Exited(0));
    }

    #[test]
    #[serial]
    fn builtins_leave_status_alone() {
        let dir = tempdir().unwrap();
        let exit5 = script(&dir, "exit5.sh", "exit 5\n");
        let mut shell = Harness::new();
        shell.run(&format!("sh {exit5}"));

        let cwd = std::env::current_dir().unwrap();
        shell.run("cd /smallsh/not/here");
        assert_eq!(std::env::current_dir().unwrap(), cwd);
        assert_eq!(shell.status, Termination::Exited(5));
        assert_eq!(shell.run("exit"), Flow::Exit);
    }

    #[test]
    #[serial]
    fn background_job_reports_pid_and_is_reaped() {
        let dir = tempdir().unwrap();
        let exit4 = script(&dir, "exit4.sh", "exit 4\n");
        let mut shell = Harness::new();

        shell.run(&format!("sh {exit4} &"));
        let launched = shell.take_output();
        let pid = launched
            .strip_prefix("background pid is ")
            .and_then(|rest| rest.trim().parse::<i32>().ok())
            .unwrap_or_else(|| panic!("unexpected output: {launched}"));
        assert_eq!(shell.status, Termination::Exited(0));
        assert_eq!(shell.jobs.len(), 1);

        shell.reap_until_idle();
        assert_eq!(
            shell.take_output(),
            format!("background pid {pid} is done: exit value 4\n")
        );
    }

    fn launched_pid(output: &str) -> i32 {
        output
            .strip_prefix("background pid is ")
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|pid| pid.parse().ok())
            .unwrap_or_else(|| panic!("unexpected output: {output}"))
    }

    #[test]
    #[serial]
    fn background_launch_failures_are_reaped_as_exit_one() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.txt").display().to_string();
        let mut shell = Harness::new();

        shell.run("smallsh-missing-program &");
        let launched = shell.take_output();
        let first = launched_pid(&launched);
        assert!(launched.ends_with("smallsh-missing-program: command not found\n"));

        shell.run(&format!("cat < {missing} &"));
        let launched = shell.take_output();
        let second = launched_pid(&launched);
        assert!(launched.ends_with(&format!("cannot open {missing} for input\n")));

        assert_eq!(shell.status, Termination::Exited(0));
        assert_eq!(shell.jobs.len(), 2);
        shell.reap_until_idle();
        let reaped = shell.take_output();
        assert!(reaped.contains(&format!("background pid {first} is done: exit value 1\n")));
        assert!(reaped.contains(&format!("background pid {second} is done: exit value 1\n")));
    }

    #[test]
    #[serial]
    fn background_job_reads_null_device() {
        let dir = tempdir().unwrap();
        let out_path = dir.path().join("captured.txt");
        let mut shell = Harness::new();

        shell.run(&format!("cat > {} &", out_path.display()));
        shell.reap_until_idle();
        assert!(shell.jobs.is_empty());
        assert_eq!(fs::read_to_string(&out_path).unwrap(), "");
    }

    #[test]
    #[serial]
    fn foreground_only_mode_waits_on_background_commands() {
        let dir = tempdir().unwrap();
        let exit5 = script(&dir, "exit5.sh", "exit 5\n");
        let mut shell = Harness::new();
        shell.mode.toggle();

        shell.run(&format!("sh {exit5} &"));
        assert!(shell.take_output().is_empty());
        assert!(shell.jobs.is_empty());
        assert_eq!(shell.status, Termination::Exited(5));
    }
}
