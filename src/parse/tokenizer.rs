/// A word of the command line and its byte offset, kept for error carets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub offset: usize,
}

/// Split on single spaces. Runs of spaces produce no empty tokens, so
/// `"ls   -l"` and `"ls -l"` tokenize the same way. Tabs are ordinary
/// characters.
pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut offset = 0usize;
    for piece in line.split(' ') {
        if !piece.is_empty() {
            tokens.push(Token {
                text: piece,
                offset,
            });
        }
        offset += piece.len() + 1;
    }
    tokens
}
