use std::fmt;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

/// How a child ended. Also the shell's Foreground Status, which starts out
/// as `Exited(0)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Termination {
    Exited(i32),
    Signaled(i32),
}

impl Default for Termination {
    fn default() -> Self {
        Termination::Exited(0)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Termination::Exited(code) => write!(f, "exit value {code}"),
            Termination::Signaled(sig) => write!(f, "terminated by signal {sig}"),
        }
    }
}

impl Termination {
    fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Exited(_, code) => Some(Termination::Exited(code)),
            WaitStatus::Signaled(_, sig, _) => Some(Termination::Signaled(sig as i32)),
            _ => None,
        }
    }
}

/// Children started with `&` that have not been reaped yet.
#[derive(Debug, Default)]
pub struct BackgroundJobs {
    pids: Vec<Pid>,
}

impl BackgroundJobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pid: Pid) {
        debug!("job event=register pid={}", pid);
        self.pids.push(pid);
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.pids.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    fn forget(&mut self, pid: Pid) {
        self.pids.retain(|&known| known != pid);
    }

    /// SIGTERM every job, give them `grace` to exit, SIGKILL the rest and
    /// wait for all of them. Returns how many needed SIGKILL.
    pub fn terminate_all(&mut self, grace: Duration) -> usize {
        let mut remaining = std::mem::take(&mut self.pids);
        for &pid in &remaining {
            debug!("job event=terminate pid={} signal=SIGTERM", pid);
            if let Err(err) = kill(pid, Signal::SIGTERM) {
                if err != Errno::ESRCH {
                    warn!("job event=terminate pid={} error={}", pid, err);
                }
            }
        }

        let deadline = Instant::now() + grace;
        loop {
            remaining.retain(|&pid| !try_reap(pid));
            if remaining.is_empty() || Instant::now() >= deadline {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        for &pid in &remaining {
            debug!("job event=terminate pid={} signal=SIGKILL", pid);
            let _ = kill(pid, Signal::SIGKILL);
            if let Err(err) = wait_foreground(pid) {
                debug!("job event=terminate pid={} wait_error={}", pid, err);
            }
        }
        remaining.len()
    }
}

/// Block until `pid` exits or is killed. Signal delivery to the shell
/// (e.g. the foreground-only toggle) does not end the wait.
pub fn wait_foreground(pid: Pid) -> io::Result<Termination> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(termination) = Termination::from_wait_status(status) {
                    debug!("job event=wait pid={} status={:?}", pid, termination);
                    return Ok(termination);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(err) => {
                debug!("job event=wait pid={} error={}", pid, err);
                return Err(io::Error::other(err.to_string()));
            }
        }
    }
}

fn try_reap(pid: Pid) -> bool {
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::StillAlive) => false,
        Ok(_) => true,
        Err(Errno::EINTR) => false,
        Err(_) => true,
    }
}

/// Collect every child that has already terminated, without blocking.
pub fn poll_terminated() -> Vec<(Pid, Termination)> {
    let mut done = Vec::new();
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status) => {
                if let (Some(pid), Some(termination)) =
                    (status.pid(), Termination::from_wait_status(status))
                {
                    done.push((pid, termination));
                }
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => break,
            Err(err) => {
                warn!("job event=poll error={}", err);
                break;
            }
        }
    }
    done
}

/// Report and forget every finished background job.
pub fn reap_jobs<W: Write>(jobs: &mut BackgroundJobs, out: &mut W) -> io::Result<()> {
    for (pid, termination) in poll_terminated() {
        if !jobs.contains(pid) {
            debug!("job event=reap pid={} untracked=true", pid);
            continue;
        }
        debug!("job event=reap pid={} status={:?}", pid, termination);
        jobs.forget(pid);
        writeln!(out, "background pid {pid} is done: {termination}")?;
        out.flush()?;
    }
    Ok(())
}
