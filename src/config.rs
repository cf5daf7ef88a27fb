use std::time::Duration;

use rustyline::EditMode;

use crate::error::{ErrorKind, ShellError, ShellResult};

const DEFAULT_EXIT_GRACE: Duration = Duration::from_millis(500);
const USAGE: &str = "Usage: smallsh [-x] [--no-editor] [--exit-grace-ms=N]";

/// Start-up settings. There is no rc file; everything comes from flags and
/// the environment.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// `-x`: echo expanded lines and parsed commands on stderr.
    pub trace: bool,
    /// Use rustyline when stdin is a terminal. `--no-editor` turns it off.
    pub line_editor: bool,
    pub edit_mode: EditMode,
    /// Time between SIGTERM and SIGKILL when `exit` cleans up jobs.
    pub exit_grace: Duration,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            trace: false,
            line_editor: true,
            edit_mode: EditMode::Emacs,
            exit_grace: DEFAULT_EXIT_GRACE,
        }
    }
}

pub fn load_config<I, F>(args: I, lookup_var: F) -> ShellResult<ShellConfig>
where
    I: IntoIterator<Item = String>,
    F: Fn(&str) -> Option<String>,
{
    let mut config = ShellConfig::default();

    config.edit_mode = match lookup_var("SMALLSH_EDITMODE").as_deref() {
        Some("vi") | Some("VI") => EditMode::Vi,
        _ => EditMode::Emacs,
    };
    if let Some(value) = lookup_var("SMALLSH_EXIT_GRACE_MS") {
        config.exit_grace = parse_grace(&value, "SMALLSH_EXIT_GRACE_MS")?;
    }

    for arg in args {
        if arg == "-x" {
            config.trace = true;
        } else if arg == "--no-editor" {
            config.line_editor = false;
        } else if let Some(value) = arg.strip_prefix("--exit-grace-ms=") {
            config.exit_grace = parse_grace(value, "--exit-grace-ms")?;
        } else {
            return Err(
                ShellError::new(ErrorKind::Config, format!("unknown option '{arg}'"))
                    .with_context(USAGE),
            );
        }
    }

    Ok(config)
}

fn parse_grace(value: &str, source: &str) -> ShellResult<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| {
            ShellError::new(
                ErrorKind::Config,
                format!("invalid {source} value: {value}"),
            )
            .with_context("expected a whole number of milliseconds")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(args: &[&str], vars: &[(&str, &str)]) -> ShellResult<ShellConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_config(args.iter().map(|s| s.to_string()), |name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[], &[]).unwrap();
        assert!(!config.trace);
        assert!(config.line_editor);
        assert_eq!(config.edit_mode, EditMode::Emacs);
        assert_eq!(config.exit_grace, Duration::from_millis(500));
    }

    #[test]
    fn flags() {
        let config = load(&["-x", "--no-editor", "--exit-grace-ms=50"], &[]).unwrap();
        assert!(config.trace);
        assert!(!config.line_editor);
        assert_eq!(config.exit_grace, Duration::from_millis(50));
    }

    #[test]
    fn flag_overrides_environment() {
        let config = load(
            &["--exit-grace-ms=20"],
            &[("SMALLSH_EXIT_GRACE_MS", "900"), ("SMALLSH_EDITMODE", "vi")],
        )
        .unwrap();
        assert_eq!(config.exit_grace, Duration::from_millis(20));
        assert_eq!(config.edit_mode, EditMode::Vi);

        let config = load(&[], &[("SMALLSH_EXIT_GRACE_MS", "900")]).unwrap();
        assert_eq!(config.exit_grace, Duration::from_millis(900));
    }

    #[test]
    fn rejects_bad_values() {
        let err = load(&["--exit-grace-ms=soon"], &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
        assert_eq!(err.message, "invalid --exit-grace-ms value: soon");

        let err = load(&[], &[("SMALLSH_EXIT_GRACE_MS", "-1")]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);

        let err = load(&["--login"], &[]).unwrap_err();
        assert_eq!(err.message, "unknown option '--login'");
        assert_eq!(err.context.as_deref(), Some(USAGE));
    }
}
