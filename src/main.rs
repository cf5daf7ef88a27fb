use std::env;
use std::process;

mod builtins;
mod config;
mod error;
mod execution;
mod expansion;
mod io_helpers;
mod job_control;
mod mode;
mod parse;
mod repl;
mod signals;

use config::load_config;
use mode::ForegroundMode;
use repl::{init_state, run};
use signals::{install_foreground_toggle, install_signal_handlers};

fn main() {
    init_logging();

    let config = match load_config(env::args().skip(1), |name| env::var(name).ok()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err.display_with_input(""));
            process::exit(2);
        }
    };

    if let Err(err) = install_signal_handlers() {
        eprintln!("error: {err}");
        process::exit(1);
    }
    let mode = ForegroundMode::new();
    if let Err(err) = install_foreground_toggle(&mode) {
        eprintln!("error: {err}");
        process::exit(1);
    }

    let mut state = match init_state(config, mode) {
        Ok(state) => state,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    };
    process::exit(run(&mut state));
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or("SMALLSH_LOG", "info");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
