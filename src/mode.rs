use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared foreground-only flag.
///
/// Clones share one atomic, so the copy moved into the SIGTSTP handler and
/// the copy held by the main loop always agree. `toggle` is a single
/// `fetch_xor` and is safe to call from a signal handler.
#[derive(Clone, Debug, Default)]
pub struct ForegroundMode {
    enabled: Arc<AtomicBool>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ModeTransition {
    Entered,
    Exited,
}

impl ModeTransition {
    pub fn notice(self) -> &'static str {
        match self {
            ModeTransition::Entered => "\nEntering foreground-only mode (& is now ignored)\n",
            ModeTransition::Exited => "\nExiting foreground-only mode\n",
        }
    }
}

impl ForegroundMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn toggle(&self) -> ModeTransition {
        if self.enabled.fetch_xor(true, Ordering::SeqCst) {
            ModeTransition::Exited
        } else {
            ModeTransition::Entered
        }
    }
}
