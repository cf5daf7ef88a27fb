//! Turns an expanded input line into a `CommandSpec`.
//!
//! The grammar is flat: words separated by spaces, `<` and `>`
//! each followed by a path, and an optional trailing `&`. There is no
//! quoting, globbing, or piping.

mod command_parser;
mod redirection_parser;
mod tokenizer;

pub use command_parser::parse_command;
pub use tokenizer::{tokenize, Token};

/// Redirection target given to unattended background commands.
pub const NULL_DEVICE: &str = "/dev/null";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program or built-in name followed by its arguments; never empty.
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    /// Set by a trailing `&`.
    pub background: bool,
}

impl CommandSpec {
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            stdin: None,
            stdout: None,
            background: false,
        }
    }

    pub fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    /// Whether the shell blocks on this command. Foreground-only mode turns
    /// every `&` command into a blocking one.
    pub fn runs_in_foreground(&self, foreground_only: bool) -> bool {
        !self.background || foreground_only
    }

    /// Point unset stdin/stdout of a genuine background command at the null
    /// device so it never competes for the terminal. Explicit redirections
    /// are kept; foreground commands are returned unchanged.
    pub fn with_background_defaults(mut self, foreground_only: bool) -> Self {
        if self.runs_in_foreground(foreground_only) {
            return self;
        }
        self.stdin.get_or_insert_with(|| NULL_DEVICE.to_string());
        self.stdout.get_or_insert_with(|| NULL_DEVICE.to_string());
        self
    }
}

impl Default for CommandSpec {
    fn default() -> Self {
        Self::new()
    }
}
