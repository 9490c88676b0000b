//! Command trait, registry, line parsing and the pipeline evaluator.
//!
//! A line is split on the first `>`/`>>` into a command part and an optional
//! redirect target, and the command part is then split on `|` into stages.
//! Tokenizing is whitespace-only; quotes are only stripped by the commands
//! that care about them.

use std::collections::{HashMap, HashSet};

use log::debug;

use quest_types::{QuestError, Result, Timestamp};
use quest_vfs::{FileTree, WriteMode, resolve_path, split_parent};

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Lines carrying a search term a renderer may highlight.
    Lines {
        lines: Vec<String>,
        highlight: Option<String>,
    },
    /// Directory entries. Shown with a `/` after directories, piped or
    /// redirected as bare names.
    Listing(Vec<ListingEntry>),
    /// An informational message (no data).
    Notice(String),
    /// Command produced no visible output.
    None,
    /// Signal to clear the terminal output buffer.
    Clear,
    /// Signal to open the pager on `content`.
    Pager { title: String, content: String },
    /// Signal to open the line editor on the file at absolute `path`.
    Editor { path: String, content: String },
}

/// One name in a [`CommandOutput::Listing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

impl ListingEntry {
    /// The name as shown on the terminal.
    pub fn display(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl CommandOutput {
    /// The text that flows into the next pipeline stage or a redirect target.
    /// Notices and signals carry no data.
    pub fn into_data(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Lines { lines, .. } => lines.join("\n"),
            Self::Listing(entries) => entries
                .into_iter()
                .map(|e| e.name)
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

/// Shared mutable environment passed to every command.
pub struct Environment<'a> {
    /// Current working directory.
    pub cwd: String,
    /// Home directory; `cd` never rises above it.
    pub home: String,
    /// Name of the simulated user.
    pub user: String,
    /// The session's file tree.
    pub tree: &'a mut FileTree,
    /// Shell variables, shared with scripts.
    pub variables: &'a mut HashMap<String, String>,
    /// Every submitted line, oldest first.
    pub history: &'a [String],
    /// Time of the current submission.
    pub now: Timestamp,
    /// Lines per pager window.
    pub page_size: usize,
    /// Piped input from a previous command in a pipeline.
    pub stdin: Option<String>,
}

/// Where a command may appear in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineRole {
    /// Only runs on its own (no pipes, no redirect).
    Standalone,
    /// Produces data; may start a pipeline.
    Source,
    /// Consumes piped input; may appear at any stage.
    Filter,
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "ls \[-l\] \[path\]").
    fn usage(&self) -> &str;

    /// Command category for grouping in `help` output.
    fn category(&self) -> &str {
        "general"
    }

    /// Minimum number of arguments; fewer yields a usage error.
    fn min_args(&self) -> usize {
        0
    }

    fn role(&self) -> PipelineRole {
        PipelineRole::Standalone
    }

    /// Whether the command may change the file tree.
    fn mutates_filesystem(&self) -> bool {
        false
    }

    /// Execute the command with the given arguments and environment.
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput>;
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Output redirection parsed from the end of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub append: bool,
}

/// A tokenized input line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLine {
    /// Tokens of each pipeline stage, in order.
    pub stages: Vec<Vec<String>>,
    pub redirect: Option<Redirect>,
}

impl ParsedLine {
    /// Parse a raw input line. An empty line yields no stages.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::default());
        }
        let (command_part, redirect, trailing) = split_redirect(line)?;
        if command_part.trim().is_empty() {
            return Err(QuestError::InvalidArgument(
                "syntax error: missing command".to_string(),
            ));
        }
        let mut stages = Vec::new();
        for segment in command_part.split('|') {
            let tokens = tokenize(segment);
            if tokens.is_empty() {
                return Err(QuestError::InvalidArgument(
                    "syntax error near unexpected token '|'".to_string(),
                ));
            }
            stages.push(tokens);
        }
        // Words after the redirect target belong to the last command, as in bash.
        if let Some(last) = stages.last_mut() {
            last.extend(trailing);
        }
        Ok(Self { stages, redirect })
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Whether the line goes through the pipeline evaluator.
    pub fn is_pipeline(&self) -> bool {
        self.stages.len() > 1 || self.redirect.is_some()
    }

    /// First token of the first stage.
    pub fn command(&self) -> Option<&str> {
        self.stages
            .first()
            .and_then(|s| s.first())
            .map(String::as_str)
    }

    /// Arguments of the first stage.
    pub fn args(&self) -> &[String] {
        match self.stages.first() {
            Some(stage) => &stage[1..],
            None => &[],
        }
    }
}

/// Split on the first unescaped `>` or `>>`. Quotes are not recognized, so
/// a `>` inside quoted echo text is still a redirect.
///
/// Returns the command part, the redirect, and any words that follow the
/// redirect target. Only one redirect per line is supported, and nothing
/// may be piped after it.
fn split_redirect(line: &str) -> Result<(&str, Option<Redirect>, Vec<String>)> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'>' => {
                let append = bytes.get(i + 1) == Some(&b'>');
                let rest = &line[i + if append { 2 } else { 1 }..];
                let mut words = rest.split_whitespace();
                let target = words.next().ok_or_else(|| {
                    QuestError::InvalidArgument(
                        "syntax error near unexpected token 'newline'".to_string(),
                    )
                })?;
                let trailing: Vec<String> = words.map(String::from).collect();
                if let Some(bad) = std::iter::once(target)
                    .chain(trailing.iter().map(String::as_str))
                    .find(|w| w.contains('|') || w.contains('>'))
                {
                    let token = if bad.contains('|') { "|" } else { ">" };
                    return Err(QuestError::InvalidArgument(format!(
                        "syntax error near unexpected token '{token}'"
                    )));
                }
                let redirect = Redirect {
                    target: target.to_string(),
                    append,
                };
                return Ok((&line[..i], Some(redirect), trailing));
            },
            _ => {},
        }
        i += 1;
    }
    Ok((line, None, Vec::new()))
}

/// Whitespace-only tokenizer.
pub fn tokenize(input: &str) -> Vec<String> {
    input.split_whitespace().map(String::from).collect()
}

/// Strip one pair of matching surrounding quotes (`"` or `'`).
pub fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry of available commands with dispatch.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
    /// `None` means every registered command is enabled.
    enabled: Option<HashSet<String>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            enabled: None,
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    /// Enable only the named commands. An empty list enables everything.
    /// `help` is always available.
    pub fn restrict<S: AsRef<str>>(&mut self, names: &[S]) {
        self.enabled = if names.is_empty() {
            None
        } else {
            Some(
                names
                    .iter()
                    .map(|n| n.as_ref().to_ascii_lowercase())
                    .collect(),
            )
        };
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        name == "help"
            || (self.commands.contains_key(&name)
                && self.enabled.as_ref().is_none_or(|set| set.contains(&name)))
    }

    /// Look up an enabled command by name.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        let key = name.to_ascii_lowercase();
        if !self.is_enabled(&key) {
            return None;
        }
        self.commands.get(&key).map(|c| c.as_ref())
    }

    /// Enabled commands sorted by name.
    pub fn enabled_commands(&self) -> Vec<&dyn Command> {
        let mut cmds: Vec<&dyn Command> = self
            .commands
            .values()
            .map(|c| c.as_ref())
            .filter(|c| self.is_enabled(c.name()))
            .collect();
        cmds.sort_by(|a, b| a.name().cmp(b.name()));
        cmds
    }

    /// Parse and execute a command line.
    pub fn execute(&self, line: &str, env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = ParsedLine::parse(line)?;
        self.run(&parsed, env)
    }

    /// Execute an already parsed line.
    ///
    /// A single stage without redirect is dispatched directly. Anything else
    /// goes through the pipeline evaluator, which commits nothing unless
    /// every stage succeeds.
    pub fn run(&self, parsed: &ParsedLine, env: &mut Environment<'_>) -> Result<CommandOutput> {
        if parsed.is_empty() {
            return Ok(CommandOutput::None);
        }
        if !parsed.is_pipeline() {
            return self.dispatch(&parsed.stages[0], env);
        }

        let data = self.run_pipeline(&parsed.stages, env)?;
        match &parsed.redirect {
            Some(redirect) => {
                let path = resolve_path(&env.cwd, &redirect.target);
                let (dir, name) = split_parent(&path);
                let mode = if redirect.append {
                    WriteMode::Append
                } else {
                    WriteMode::Overwrite
                };
                debug!("redirect {} bytes to {path} ({mode:?})", data.len());
                env.tree.write_file(dir, name, &data, mode, env.now)?;
                Ok(CommandOutput::None)
            },
            None => Ok(CommandOutput::Text(data)),
        }
    }

    /// Thread data through every stage and return the final stage's data.
    fn run_pipeline(&self, stages: &[Vec<String>], env: &mut Environment<'_>) -> Result<String> {
        let mut data = String::new();
        for (i, tokens) in stages.iter().enumerate() {
            let stage = i + 1;
            let (cmd, args) = self
                .resolve_command(tokens)
                .map_err(|e| e.in_stage(stage))?;
            let allowed = match cmd.role() {
                PipelineRole::Source => i == 0,
                PipelineRole::Filter => true,
                PipelineRole::Standalone => false,
            };
            if !allowed {
                return Err(QuestError::UnsupportedInPipeline(cmd.name().to_string()).in_stage(stage));
            }
            check_arity(cmd, &args).map_err(|e| e.in_stage(stage))?;

            env.stdin = if i == 0 {
                None
            } else {
                let lines: Vec<&str> = data.lines().filter(|l| !l.is_empty()).collect();
                if lines.is_empty() {
                    return Err(QuestError::InvalidArgument(
                        "no input from previous stage".to_string(),
                    )
                    .in_stage(stage));
                }
                Some(lines.join("\n"))
            };

            debug!("pipeline stage {stage}: {} {args:?}", cmd.name());
            let result = cmd.execute(&args, env);
            env.stdin = None;
            data = result.map_err(|e| e.in_stage(stage))?.into_data();
        }
        Ok(data)
    }

    /// Execute a single command outside any pipeline.
    fn dispatch(&self, tokens: &[String], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if tokens[0].eq_ignore_ascii_case("help") {
            return self.execute_help(&tokens[1..]);
        }
        let (cmd, args) = self.resolve_command(tokens)?;
        check_arity(cmd, &args)?;
        debug!("dispatch {} {args:?}", cmd.name());
        cmd.execute(&args, env)
    }

    /// Map the first token to an enabled command. `./name` runs the script
    /// executor with `name` as its first argument. Names are case-insensitive.
    fn resolve_command<'s, 't>(
        &'s self,
        tokens: &'t [String],
    ) -> Result<(&'s dyn Command, Vec<&'t str>)> {
        let first = tokens[0].as_str();
        let mut args: Vec<&str> = tokens[1..].iter().map(String::as_str).collect();
        let key = match first.strip_prefix("./") {
            Some(script) if !script.is_empty() => {
                args.insert(0, script);
                "./".to_string()
            },
            _ => first.to_ascii_lowercase(),
        };
        match self.commands.get(&key) {
            Some(cmd) if self.is_enabled(&key) => Ok((cmd.as_ref(), args)),
            _ => Err(QuestError::CommandNotFound(first.to_string())),
        }
    }

    /// Built-in help with access to the registry.
    fn execute_help(&self, args: &[String]) -> Result<CommandOutput> {
        if let Some(name) = args.first() {
            return match self.get(name) {
                Some(cmd) => Ok(CommandOutput::Text(format!(
                    "{} ({})\n  {}\n  Usage: {}",
                    cmd.name(),
                    cmd.category(),
                    cmd.description(),
                    cmd.usage()
                ))),
                None if name.eq_ignore_ascii_case("help") => Ok(CommandOutput::Text(
                    "help (general)\n  List available commands\n  Usage: help [command]"
                        .to_string(),
                )),
                None => Err(QuestError::InvalidArgument(format!("no help for '{name}'"))),
            };
        }

        let mut categories: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
        categories
            .entry("general")
            .or_default()
            .push(("help", "List available commands"));
        for cmd in self.enabled_commands() {
            categories
                .entry(cmd.category())
                .or_default()
                .push((cmd.name(), cmd.description()));
        }
        let mut cats: Vec<&str> = categories.keys().copied().collect();
        cats.sort();

        let total: usize = categories.values().map(Vec::len).sum();
        let mut out = format!("Commands ({total}):\n");
        for cat in &cats {
            let mut cmds = categories[cat].clone();
            cmds.sort_by_key(|(name, _)| *name);
            out.push_str(&format!("\n  [{cat}]\n"));
            for (name, desc) in &cmds {
                out.push_str(&format!("    {name:12} {desc}\n"));
            }
        }
        out.push_str("\nType 'help <command>' for details.");
        Ok(CommandOutput::Text(out))
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject calls with fewer arguments than the command requires.
fn check_arity(cmd: &dyn Command, args: &[&str]) -> Result<()> {
    if args.len() < cmd.min_args() {
        return Err(QuestError::InvalidArgument(format!("usage: {}", cmd.usage())));
    }
    Ok(())
}
