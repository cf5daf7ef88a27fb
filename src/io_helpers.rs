use std::io::{self, Write};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Read one line without its line ending. `None` means end of input.
///
/// With an editor the prompt is drawn by rustyline and Ctrl-C yields an
/// empty line. Without one the prompt is written and flushed before the
/// blocking read.
pub fn read_input_line(
    editor: Option<&mut DefaultEditor>,
    prompt: &str,
) -> io::Result<Option<String>> {
    if let Some(editor) = editor {
        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => return Ok(Some(String::new())),
            Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => return Err(io::Error::other(err)),
        };
        Ok(Some(line))
    } else {
        let mut stdout = io::stdout();
        stdout.write_all(prompt.as_bytes())?;
        stdout.flush()?;
        let mut line = String::new();
        let bytes = io::stdin().read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }
        Ok(Some(strip_line_ending(line)))
    }
}

pub fn strip_line_ending(mut line: String) -> String {
    while line.ends_with(['\n', '\r']) {
        line.pop();
    }
    line
}

/// Blank lines and `#` comments never reach the parser.
pub fn is_ignorable(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with('#')
}
