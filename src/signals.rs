use std::io;
use std::os::fd::BorrowedFd;

use log::debug;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use signal_hook::consts::signal::SIGTSTP;
use signal_hook::SigId;

use crate::mode::ForegroundMode;

/// Printed before every line read, and again after a mode toggle.
pub const PROMPT: &str = ": ";

/// The shell ignores SIGINT so Ctrl-C only reaches foreground children.
pub fn install_signal_handlers() -> io::Result<()> {
    let action = SigAction::new(SigHandler::SigIgn, SaFlags::SA_RESTART, SigSet::empty());
    install_action(Signal::SIGINT, &action)?;
    debug!("signal event=install signal=SIGINT mode=ignore");
    Ok(())
}

/// Make SIGTSTP flip foreground-only mode instead of stopping the shell.
///
/// The handler only toggles an atomic and issues raw `write(2)` calls with
/// fixed text, all of which are async-signal-safe.
pub fn install_foreground_toggle(mode: &ForegroundMode) -> io::Result<SigId> {
    let mode = mode.clone();
    let id = unsafe {
        signal_hook::low_level::register(SIGTSTP, move || {
            let transition = mode.toggle();
            write_raw(transition.notice().as_bytes());
            write_raw(PROMPT.as_bytes());
        })
    }?;
    debug!("signal event=install signal=SIGTSTP mode=toggle");
    Ok(id)
}

fn write_raw(bytes: &[u8]) {
    let fd = unsafe { BorrowedFd::borrow_raw(libc::STDOUT_FILENO) };
    let mut offset = 0usize;
    while offset < bytes.len() {
        match nix::unistd::write(fd, &bytes[offset..]) {
            Ok(0) => break,
            Ok(written) => offset += written,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(_) => break,
        }
    }
}

/// Child-side dispositions, run between fork and exec. SIGTSTP is always
/// ignored; SIGINT is default for foreground children and ignored for
/// background ones so a background job survives Ctrl-C.
pub fn reset_child_signals(foreground: bool) -> io::Result<()> {
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    install_action(Signal::SIGTSTP, &ignore)?;
    if foreground {
        let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        install_action(Signal::SIGINT, &default)?;
    } else {
        install_action(Signal::SIGINT, &ignore)?;
    }
    Ok(())
}

fn install_action(signal: Signal, action: &SigAction) -> io::Result<()> {
    unsafe { sigaction(signal, action) }
        .map(|_| ())
        .map_err(|err| io::Error::other(err.to_string()))
}
