//! The `edit`/`nano` line editor.
//!
//! While an editor is open every submitted line is appended to the buffer,
//! unless it is one of the colon commands below. The editor never touches
//! the file tree itself: a write hands the buffer back to the shell, which
//! saves it.

use quest_types::OutputLine;
use quest_vfs::split_parent;

const HELP: &str = ":w save, :wq save and quit, :q quit, :q! discard, :d delete last line, :p show";

/// One submitted editor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorInput {
    Write,
    WriteQuit,
    Quit,
    /// Quit even with unsaved changes.
    ForceQuit,
    DeleteLast,
    Show,
    Text(String),
}

impl EditorInput {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            ":w" | "^O" => Self::Write,
            ":wq" | ":x" => Self::WriteQuit,
            ":q" | "^X" => Self::Quit,
            ":q!" => Self::ForceQuit,
            ":d" => Self::DeleteLast,
            ":p" => Self::Show,
            _ => Self::Text(input.to_string()),
        }
    }
}

/// An open buffer over one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    path: String,
    lines: Vec<String>,
    modified: bool,
}

impl Editor {
    /// Open a buffer on absolute `path` holding `content`.
    pub fn open(path: &str, content: &str) -> Self {
        Self {
            path: path.to_string(),
            lines: content.lines().map(String::from).collect(),
            modified: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        split_parent(&self.path).1
    }

    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub fn push(&mut self, line: &str) {
        self.lines.push(line.to_string());
        self.modified = true;
    }

    pub fn delete_last(&mut self) -> OutputLine {
        match self.lines.pop() {
            Some(line) => {
                self.modified = true;
                OutputLine::notice(format!("deleted: {line}"))
            },
            None => OutputLine::error("buffer is empty"),
        }
    }

    /// The buffer with line numbers.
    pub fn show(&self) -> Vec<OutputLine> {
        if self.lines.is_empty() {
            return vec![OutputLine::notice("(empty buffer)")];
        }
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| OutputLine::output(format!("{:>4}  {line}", i + 1)))
            .collect()
    }

    /// Header, current content, then the command summary.
    pub fn banner(&self) -> Vec<OutputLine> {
        let mut out = vec![OutputLine::notice(format!("--- editing {} ---", self.name()))];
        if !self.lines.is_empty() {
            out.extend(self.show());
        }
        out.push(OutputLine::notice(HELP));
        out
    }
}
