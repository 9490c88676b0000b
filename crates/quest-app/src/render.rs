//! Plain-text rendering of shell output for an ANSI terminal.

use quest_core::types::{LineKind, OutputLine};

const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const REVERSE: &str = "\x1b[7m";
const RESET: &str = "\x1b[0m";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Render one line. `color` enables ANSI escapes.
pub fn render_line(line: &OutputLine, color: bool) -> String {
    if !color {
        return match line.kind {
            LineKind::Clear => "----".to_string(),
            _ => line.text.clone(),
        };
    }
    match line.kind {
        LineKind::Clear => CLEAR_SCREEN.to_string(),
        LineKind::Error => format!("{RED}{}{RESET}", line.text),
        LineKind::Notice => format!("{CYAN}{}{RESET}", line.text),
        LineKind::Echo => format!("{BOLD}{}{RESET}", line.text),
        LineKind::Output | LineKind::Pager => match &line.highlight {
            Some(term) => highlight(&line.text, term),
            None => line.text.clone(),
        },
    }
}

/// Wrap every case-insensitive occurrence of `term` in reverse video.
fn highlight(text: &str, term: &str) -> String {
    if term.is_empty() {
        return text.to_string();
    }
    let lower = text.to_lowercase();
    let needle = term.to_lowercase();
    // Lowercasing may change byte offsets for non-ASCII text.
    if lower.len() != text.len() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 16);
    let mut pos = 0;
    while let Some(found) = lower[pos..].find(&needle) {
        let start = pos + found;
        let end = start + needle.len();
        out.push_str(&text[pos..start]);
        out.push_str(REVERSE);
        out.push_str(&text[start..end]);
        out.push_str(RESET);
        pos = end;
    }
    out.push_str(&text[pos..]);
    out
}
