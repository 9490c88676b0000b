//! Command interpreter and terminal subsystem.
//!
//! The terminal is a registry-based dispatch system. Commands implement the
//! `Command` trait and are registered by name. The interpreter parses input
//! lines, threads pipelines, and dispatches `execute()`.

mod commands;
pub mod editor;
mod interpreter;
mod lesson_commands;
pub mod pager;
pub mod script;
mod text_commands;

#[cfg(test)]
mod test_utils;

/// Register all built-in commands (files, permissions, scripting, text) into a registry.
pub use commands::register_builtins;
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command (text, notices, signals).
pub use interpreter::CommandOutput;
/// Registry of available commands with dispatch.
pub use interpreter::CommandRegistry;
/// Shared mutable environment passed to every command.
pub use interpreter::Environment;
/// One entry of a directory listing.
pub use interpreter::ListingEntry;
/// A tokenized input line: pipeline stages plus optional redirect.
pub use interpreter::{ParsedLine, PipelineRole, Redirect, strip_quotes, tokenize};
/// The `edit`/`nano` buffer.
pub use editor::{Editor, EditorInput};
/// Register `demo` and `admin` into a registry.
pub use lesson_commands::register_lesson_commands;
/// The `less` submachine.
pub use pager::{Pager, PagerKey, PagerState};
/// Register text filter commands (grep, sort, uniq, wc, cut, head, tail) into a registry.
pub use text_commands::register_text_commands;
