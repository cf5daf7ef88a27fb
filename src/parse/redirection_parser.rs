use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::{CommandSpec, Token};

pub(crate) fn is_redirection(token: &str) -> bool {
    matches!(token, "<" | ">")
}

pub(crate) fn apply_redirection<'a, I>(
    current: &mut CommandSpec,
    op: Token<'a>,
    iter: &mut I,
) -> ShellResult<()>
where
    I: Iterator<Item = Token<'a>>,
{
    let (slot, stream) = match op.text {
        "<" => (&mut current.stdin, "input"),
        ">" => (&mut current.stdout, "output"),
        other => {
            return Err(ShellError::new(
                ErrorKind::Parse,
                format!("unsupported redirection '{other}'"),
            )
            .with_position(op.offset));
        }
    };
    let missing = || {
        ShellError::new(
            ErrorKind::Parse,
            format!("missing {stream} file after '{}'", op.text),
        )
        .with_context(format!("Expected: cmd {} filename", op.text))
        .with_position(op.offset)
    };
    let target = iter.next().ok_or_else(missing)?;
    if is_redirection(target.text) {
        return Err(missing());
    }
    if slot.is_some() {
        return Err(
            ShellError::new(ErrorKind::Parse, format!("multiple {stream} redirections"))
                .with_position(op.offset),
        );
    }
    *slot = Some(target.text.to_string());
    Ok(())
}
