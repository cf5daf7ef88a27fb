use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::redirection_parser::{apply_redirection, is_redirection};
use crate::parse::{CommandSpec, tokenize};

/// Parse one expanded line.
///
/// A trailing standalone `&` marks the command as background and is
/// dropped. The first word is always the program name, even if it looks
/// like an operator. Null-device defaults for background commands are not
/// applied here; see [`CommandSpec::with_background_defaults`].
pub fn parse_command(line: &str) -> ShellResult<CommandSpec> {
    let (body, background) = split_background(line);
    let mut iter = tokenize(body).into_iter();

    let first = iter.next().ok_or_else(|| {
        ShellError::new(ErrorKind::Parse, "empty command").with_position(0)
    })?;

    let mut current = CommandSpec::new();
    current.background = background;
    current.args.push(first.text.to_string());

    while let Some(token) = iter.next() {
        if is_redirection(token.text) {
            apply_redirection(&mut current, token, &mut iter)?;
        } else {
            current.args.push(token.text.to_string());
        }
    }

    Ok(current)
}

fn split_background(line: &str) -> (&str, bool) {
    let trimmed = line.trim_end_matches(' ');
    match trimmed.strip_suffix('&') {
        Some(rest) if rest.is_empty() || rest.ends_with(' ') => (rest, true),
        _ => (line, false),
    }
}
