//! Marker expansion runs once per line, before tokenizing, so the
//! expanded text can land anywhere: arguments, redirection paths, even
//! the program name.

/// Expands to the shell's own process id.
pub const PID_MARKER: &str = "$$";

/// Replace every occurrence of `marker` in `line` with `value`.
///
/// Occurrences are matched left to right without overlap, and text
/// produced by a replacement is never rescanned: `"$$$"` becomes
/// `"<value>$"`.
pub fn expand_marker(line: &mut String, marker: &str, value: u32) {
    if marker.is_empty() || !line.contains(marker) {
        return;
    }
    let value = value.to_string();
    let mut out = String::with_capacity(line.len() + value.len());
    let mut last = 0;
    for (idx, _) in line.match_indices(marker) {
        out.push_str(&line[last..idx]);
        out.push_str(&value);
        last = idx + marker.len();
    }
    out.push_str(&line[last..]);
    *line = out;
}

pub fn expand_pid(line: &mut String, pid: u32) {
    expand_marker(line, PID_MARKER, pid);
}
