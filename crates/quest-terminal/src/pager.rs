//! The `less` pager.
//!
//! While a pager is open every submitted line is a pager key instead of a
//! command. Each transition returns the full set of lines to show, starting
//! with a clear signal so the window replaces what was on screen.

use log::debug;

use quest_types::OutputLine;

/// A key (or typed line) understood by the pager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerKey {
    Quit,
    /// Empty input or a single space.
    NextPage,
    PrevPage,
    Top,
    Bottom,
    /// `/term`; an empty term clears the current highlight.
    Search(String),
    Unknown(String),
}

impl PagerKey {
    pub fn parse(input: &str) -> Self {
        if input.is_empty() || input == " " {
            return Self::NextPage;
        }
        if let Some(term) = input.strip_prefix('/') {
            return Self::Search(term.trim().to_string());
        }
        match input.trim() {
            "q" | "Q" => Self::Quit,
            "" => Self::NextPage,
            "b" => Self::PrevPage,
            "g" => Self::Top,
            "G" => Self::Bottom,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// An open pager window over a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    title: String,
    lines: Vec<String>,
    start: usize,
    page_size: usize,
    search: Option<String>,
}

impl Pager {
    pub fn new(title: &str, content: &str, page_size: usize) -> Self {
        Self {
            title: title.to_string(),
            lines: content.lines().map(String::from).collect(),
            start: 0,
            page_size: page_size.max(1),
            search: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Index of the first visible line.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last visible line.
    pub fn end(&self) -> usize {
        (self.start + self.page_size).min(self.lines.len())
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    fn last_start(&self) -> usize {
        self.lines.len().saturating_sub(self.page_size)
    }

    /// `round(100 * end / len)%` followed by `(end/len)`.
    pub fn footer(&self) -> String {
        let len = self.lines.len();
        let end = self.end();
        if len == 0 {
            return "100% (0/0)".to_string();
        }
        let pct = (200 * end + len) / (2 * len);
        format!("{pct}% ({end}/{len})")
    }

    /// The current window: a clear signal, the visible lines, then the footer.
    pub fn render(&self) -> Vec<OutputLine> {
        let mut out = Vec::with_capacity(self.page_size + 2);
        out.push(OutputLine::clear());
        let needle = self.search.as_ref().map(|t| t.to_lowercase());
        for line in &self.lines[self.start..self.end()] {
            let hit = needle
                .as_ref()
                .is_some_and(|n| line.to_lowercase().contains(n.as_str()));
            let highlight = if hit { self.search.clone() } else { None };
            out.push(OutputLine::pager(line.as_str()).with_highlight(highlight));
        }
        out.push(OutputLine::notice(self.footer()));
        out
    }

    /// The first render, with a key-binding header.
    fn open(&self) -> Vec<OutputLine> {
        let mut out = self.render();
        out.insert(
            1,
            OutputLine::notice(format!(
                "--- viewing {} (space: next, b: back, /term: search, q: quit) ---",
                self.title
            )),
        );
        out
    }

    fn next_page(&mut self) -> Vec<OutputLine> {
        let next = (self.start + self.page_size).min(self.last_start());
        if next <= self.start {
            return vec![OutputLine::notice("--- end of file ---")];
        }
        self.start = next;
        self.render()
    }

    fn prev_page(&mut self) -> Vec<OutputLine> {
        if self.start == 0 {
            return vec![OutputLine::notice("--- start of file ---")];
        }
        self.start = self.start.saturating_sub(self.page_size);
        self.render()
    }

    fn search(&mut self, term: String) -> Vec<OutputLine> {
        if term.is_empty() {
            self.search = None;
            return self.render();
        }
        let needle = term.to_lowercase();
        let found = self
            .lines
            .iter()
            .enumerate()
            .skip(self.start + 1)
            .find(|(_, line)| line.to_lowercase().contains(&needle))
            .map(|(i, _)| i);
        match found {
            Some(i) => {
                debug!("pager match for '{term}' at line {}", i + 1);
                self.start = i.saturating_sub(2);
                let notice = format!("pattern found: {term}");
                self.search = Some(term);
                let mut out = self.render();
                out.push(OutputLine::notice(notice));
                out
            },
            None => vec![OutputLine::error(format!("pattern not found: {term}"))],
        }
    }
}

/// Whether the session is inside `less`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PagerState {
    #[default]
    Closed,
    Viewing(Pager),
}

impl PagerState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Viewing(_))
    }

    /// Enter the pager and return its first window.
    pub fn open(&mut self, pager: Pager) -> Vec<OutputLine> {
        let out = pager.open();
        *self = Self::Viewing(pager);
        out
    }

    /// Apply one key. Nothing happens while closed.
    pub fn handle(&mut self, key: PagerKey) -> Vec<OutputLine> {
        let Self::Viewing(pager) = self else {
            return Vec::new();
        };
        match key {
            PagerKey::Quit => {
                *self = Self::Closed;
                vec![OutputLine::notice("--- less closed ---")]
            },
            PagerKey::NextPage => pager.next_page(),
            PagerKey::PrevPage => pager.prev_page(),
            PagerKey::Top => {
                pager.start = 0;
                pager.render()
            },
            PagerKey::Bottom => {
                pager.start = pager.last_start();
                pager.render()
            },
            PagerKey::Search(term) => pager.search(term),
            PagerKey::Unknown(other) => vec![OutputLine::notice(format!(
                "unknown key '{other}' (space: next, b: back, g/G: top/bottom, /term: search, q: quit)"
            ))],
        }
    }
}
