//! Shared test utilities for the terminal crate.
//!
//! [`Fixture`] owns everything an [`Environment`] borrows, so a test can run
//! several lines against the same tree and inspect it afterwards.

use std::collections::HashMap;

use quest_types::{Clock, FixedClock, Result};
use quest_vfs::{FileTree, SeedEntry};

use crate::interpreter::ListingEntry;
use crate::{CommandOutput, CommandRegistry, Environment, register_builtins};

pub const HOME: &str = "/home/quest";

pub struct Fixture {
    pub reg: CommandRegistry,
    pub tree: FileTree,
    pub cwd: String,
    pub vars: HashMap<String, String>,
    pub history: Vec<String>,
    pub clock: FixedClock,
}

impl Fixture {
    /// Every built-in registered, empty home directory.
    pub fn new() -> Self {
        Self::with_seed(&[])
    }

    pub fn with_seed(entries: &[SeedEntry]) -> Self {
        let mut reg = CommandRegistry::new();
        register_builtins(&mut reg);
        let clock = FixedClock::default();
        let tree = FileTree::from_seed(HOME, "quest", "quest", entries, clock.now()).unwrap();
        Self {
            reg,
            tree,
            cwd: HOME.to_string(),
            vars: HashMap::new(),
            history: Vec::new(),
            clock,
        }
    }

    /// Add a file to the home directory.
    pub fn file(mut self, name: &str, content: &str) -> Self {
        self.tree
            .write_file(HOME, name, content, quest_vfs::WriteMode::Overwrite, self.clock.now())
            .unwrap();
        self
    }

    pub fn exec(&mut self, line: &str) -> Result<CommandOutput> {
        self.history.push(line.to_string());
        let mut env = Environment {
            cwd: self.cwd.clone(),
            home: HOME.to_string(),
            user: "quest".to_string(),
            tree: &mut self.tree,
            variables: &mut self.vars,
            history: &self.history,
            now: self.clock.now(),
            page_size: 10,
            stdin: None,
        };
        let result = self.reg.execute(line, &mut env);
        self.cwd = env.cwd;
        result
    }

    /// Run a line and return its text output, panicking on anything else.
    pub fn text(&mut self, line: &str) -> String {
        match self.exec(line) {
            Ok(CommandOutput::Text(s)) => s,
            Ok(CommandOutput::Lines { lines, .. }) => lines.join("\n"),
            Ok(CommandOutput::Listing(entries)) => entries
                .iter()
                .map(ListingEntry::display)
                .collect::<Vec<_>>()
                .join("\n"),
            other => panic!("expected text from `{line}`, got {other:?}"),
        }
    }

    /// Run a line and return its error.
    pub fn err(&mut self, line: &str) -> quest_types::QuestError {
        match self.exec(line) {
            Err(e) => e,
            Ok(out) => panic!("expected error from `{line}`, got {out:?}"),
        }
    }

    pub fn content(&self, path: &str) -> String {
        self.tree.file(path).unwrap().content.clone()
    }
}
