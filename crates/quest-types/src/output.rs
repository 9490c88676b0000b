//! Output records handed to a renderer.

use serde::Serialize;

/// How a renderer should present a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Normal command output.
    Output,
    /// An error message.
    Error,
    /// Informational hint or status message.
    Notice,
    /// A line inside the pager window (including its footer).
    Pager,
    /// The prompt line the user submitted.
    Echo,
    /// Signal to clear the screen. Carries no text.
    Clear,
}

/// One rendered line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputLine {
    pub text: String,
    pub kind: LineKind,
    /// Search term a renderer may mark inside `text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
}

impl OutputLine {
    pub fn new(text: impl Into<String>, kind: LineKind) -> Self {
        Self {
            text: text.into(),
            kind,
            highlight: None,
        }
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Output)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Error)
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Notice)
    }

    pub fn pager(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Pager)
    }

    pub fn echo(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Echo)
    }

    pub fn clear() -> Self {
        Self::new(String::new(), LineKind::Clear)
    }

    /// Attach a highlight term.
    pub fn with_highlight(mut self, term: Option<String>) -> Self {
        self.highlight = term;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind() {
        assert_eq!(OutputLine::output("a").kind, LineKind::Output);
        assert_eq!(OutputLine::error("a").kind, LineKind::Error);
        assert_eq!(OutputLine::notice("a").kind, LineKind::Notice);
        assert_eq!(OutputLine::pager("a").kind, LineKind::Pager);
        assert_eq!(OutputLine::echo("a").kind, LineKind::Echo);
        assert_eq!(OutputLine::clear().kind, LineKind::Clear);
        assert!(OutputLine::clear().text.is_empty());
    }

    #[test]
    fn serializes_without_empty_highlight() {
        let json = serde_json::to_string(&OutputLine::output("hi")).unwrap();
        assert_eq!(json, r#"{"text":"hi","kind":"output"}"#);
    }

    #[test]
    fn serializes_highlight_when_present() {
        let line = OutputLine::output("404 error").with_highlight(Some("404".into()));
        let json = serde_json::to_string(&line).unwrap();
        assert!(json.contains(r#""highlight":"404""#));
    }
}
