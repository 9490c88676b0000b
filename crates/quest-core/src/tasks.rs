//! Task tracking: what the shell reports after each command, and the
//! trackers that turn those reports into completed lesson tasks.

use log::info;
use serde::{Deserialize, Serialize};

use quest_terminal::ParsedLine;
use quest_vfs::{Access, FileTree, ModeSpec, resolve_path};

/// Redirect part of a [`CommandEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectEvent {
    pub target: String,
    pub append: bool,
}

/// Description of one executed command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandEvent {
    /// The line as submitted (trimmed).
    pub line: String,
    /// First command name, lowercased. Empty when the line did not parse.
    pub command: String,
    /// Arguments of the first stage.
    pub args: Vec<String>,
    /// Command name of every pipeline stage.
    pub stages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectEvent>,
    pub succeeded: bool,
    /// Working directory after the command ran.
    pub cwd: String,
    /// Absolute path of the last operand of the first stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl CommandEvent {
    pub fn new(line: &str, parsed: Option<&ParsedLine>, succeeded: bool, cwd: &str) -> Self {
        let stages: Vec<String> = parsed
            .map(|p| {
                p.stages
                    .iter()
                    .filter_map(|s| s.first())
                    .map(|c| command_name(c))
                    .collect()
            })
            .unwrap_or_default();
        let mut args: Vec<String> = parsed.map(|p| p.args().to_vec()).unwrap_or_default();
        // `./name` runs the script executor with `name` as its operand.
        if let Some(script) = parsed
            .and_then(ParsedLine::command)
            .and_then(|c| c.strip_prefix("./"))
            .filter(|s| !s.is_empty())
        {
            args.insert(0, script.to_string());
        }
        Self {
            line: line.to_string(),
            command: stages.first().cloned().unwrap_or_default(),
            args,
            stages,
            redirect: parsed.and_then(|p| p.redirect.as_ref()).map(|r| RedirectEvent {
                target: r.target.clone(),
                append: r.append,
            }),
            succeeded,
            cwd: cwd.to_string(),
            target: None,
        }
    }

    /// Resolve [`CommandEvent::target`] against the directory the command
    /// started in. Flags do not count as operands; a script run targets the
    /// script itself.
    pub fn with_target(mut self, start_cwd: &str) -> Self {
        let operand = if self.command == "./" {
            self.args.first()
        } else {
            self.args.iter().rev().find(|a| !a.starts_with('-'))
        };
        self.target = operand.map(|a| resolve_path(start_cwd, a));
        self
    }

    /// The event reported when the editor writes `path`.
    pub fn saved(path: &str, cwd: &str) -> Self {
        Self {
            line: format!("save {path}"),
            command: "save".to_string(),
            args: vec![path.to_string()],
            stages: vec!["save".to_string()],
            redirect: None,
            succeeded: true,
            cwd: cwd.to_string(),
            target: Some(path.to_string()),
        }
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

/// Registry name of a stage's first token.
fn command_name(token: &str) -> String {
    match token.strip_prefix("./") {
        Some(script) if !script.is_empty() => "./".to_string(),
        _ => token.to_ascii_lowercase(),
    }
}

/// Something that watches executed commands.
pub trait TaskTracker {
    /// Inspect one event and the tree it left behind. Returns the ids of
    /// tasks this event completed.
    fn observe(&mut self, event: &CommandEvent, tree: &FileTree) -> Vec<String>;
}

/// Ids of completed tasks in completion order. Only grows, except through
/// [`CompletedTasks::reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletedTasks {
    ids: Vec<String>,
}

impl CompletedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`. Returns false if it was already complete.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn reset(&mut self) {
        self.ids.clear();
    }
}

/// Redirect requirement of a [`TaskRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectRule {
    /// Any redirect.
    Any,
    Overwrite,
    Append,
}

/// Form of a chmod mode operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    /// Three octal digits such as `755`.
    Octal,
    /// Clauses such as `u+x` or `go-w`.
    Symbolic,
}

impl ModeKind {
    /// Classify a mode operand. `None` if it is not a valid mode.
    pub fn of(operand: &str) -> Option<Self> {
        match operand.parse::<ModeSpec>().ok()? {
            ModeSpec::Octal(_) => Some(Self::Octal),
            ModeSpec::Symbolic(_) => Some(Self::Symbolic),
        }
    }
}

/// Requirement on a file after the command ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileRule {
    /// Absolute path. Defaults to the event's target.
    #[serde(default)]
    pub path: Option<String>,
    /// Substrings that must all appear, ignoring case.
    #[serde(default)]
    pub contains: Vec<String>,
    /// Substrings of which at least one must appear, ignoring case.
    #[serde(default)]
    pub contains_any: Vec<String>,
    /// Required state of the owner execute bit.
    #[serde(default)]
    pub executable: Option<bool>,
}

impl FileRule {
    pub fn matches(&self, event: &CommandEvent, tree: &FileTree) -> bool {
        let Some(path) = self.path.as_ref().or(event.target.as_ref()) else {
            return false;
        };
        let Some(file) = tree.file(path) else {
            return false;
        };
        let content = file.content.to_lowercase();
        let found = |needle: &String| content.contains(&needle.to_lowercase());
        self.contains.iter().all(found)
            && (self.contains_any.is_empty() || self.contains_any.iter().any(found))
            && self
                .executable
                .is_none_or(|x| file.meta.permissions.owner.contains(Access::EXEC) == x)
    }
}

fn one() -> usize {
    1
}

/// Declarative task predicate, as written in lesson files. Every condition
/// that is set must hold, and the command must have succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskRule {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Name of the first command.
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments that must all appear in the first stage.
    #[serde(default)]
    pub args: Vec<String>,
    /// Arguments that must not appear in the first stage.
    #[serde(default)]
    pub not_args: Vec<String>,
    /// Absolute path the last operand must resolve to.
    #[serde(default)]
    pub target: Option<String>,
    /// Form of the first argument, read as a chmod mode.
    #[serde(default)]
    pub mode: Option<ModeKind>,
    #[serde(default)]
    pub file: Option<FileRule>,
    /// Substring of the submitted line.
    #[serde(default)]
    pub line_contains: Option<String>,
    /// Commands that must appear somewhere in the pipeline.
    #[serde(default)]
    pub uses: Vec<String>,
    #[serde(default = "one")]
    pub min_stages: usize,
    #[serde(default)]
    pub redirect: Option<RedirectRule>,
    /// Absolute path that must exist afterwards.
    #[serde(default)]
    pub path_exists: Option<String>,
    /// Absolute path the shell must be in afterwards.
    #[serde(default)]
    pub cwd: Option<String>,
}

impl TaskRule {
    pub fn matches(&self, event: &CommandEvent, tree: &FileTree) -> bool {
        let redirect_ok = match (self.redirect, &event.redirect) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(RedirectRule::Any), Some(_)) => true,
            (Some(RedirectRule::Overwrite), Some(r)) => !r.append,
            (Some(RedirectRule::Append), Some(r)) => r.append,
        };
        event.succeeded
            && redirect_ok
            && event.stages.len() >= self.min_stages
            && self
                .command
                .as_ref()
                .is_none_or(|c| c.eq_ignore_ascii_case(&event.command))
            && self.args.iter().all(|a| event.has_arg(a))
            && !self.not_args.iter().any(|a| event.has_arg(a))
            && self
                .target
                .as_ref()
                .is_none_or(|t| event.target.as_ref() == Some(t))
            && self
                .mode
                .is_none_or(|m| event.args.first().and_then(|a| ModeKind::of(a)) == Some(m))
            && self.uses.iter().all(|u| event.stages.contains(u))
            && self
                .line_contains
                .as_ref()
                .is_none_or(|s| event.line.contains(s.as_str()))
            && self.path_exists.as_ref().is_none_or(|p| tree.exists(p))
            && self.cwd.as_ref().is_none_or(|c| *c == event.cwd)
            && self.file.as_ref().is_none_or(|f| f.matches(event, tree))
    }
}

type Predicate = Box<dyn Fn(&CommandEvent, &FileTree) -> bool>;

/// A tracker holding named predicates. Each task completes at most once.
#[derive(Default)]
pub struct TaskBoard {
    tasks: Vec<(String, String, Predicate)>,
    completed: CompletedTasks,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: &[TaskRule]) -> Self {
        let mut board = Self::new();
        for rule in rules {
            let description = rule.description.clone();
            let id = rule.id.clone();
            let rule = rule.clone();
            board.add(&id, &description, move |event, tree| rule.matches(event, tree));
        }
        board
    }

    /// Add a task. A later task with the same id replaces the earlier one.
    pub fn add<F>(&mut self, id: &str, description: &str, predicate: F)
    where
        F: Fn(&CommandEvent, &FileTree) -> bool + 'static,
    {
        self.tasks.retain(|(existing, _, _)| existing != id);
        self.tasks
            .push((id.to_string(), description.to_string(), Box::new(predicate)));
    }

    pub fn completed(&self) -> &CompletedTasks {
        &self.completed
    }

    /// Task ids with their descriptions, in the order they were added.
    pub fn tasks(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tasks.iter().map(|(id, desc, _)| (id.as_str(), desc.as_str()))
    }

    pub fn description(&self, id: &str) -> Option<&str> {
        self.tasks()
            .find(|(task, _)| *task == id)
            .map(|(_, desc)| desc)
    }

    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|(id, _, _)| self.completed.contains(id))
    }

    pub fn reset(&mut self) {
        self.completed.reset();
    }
}

impl TaskTracker for TaskBoard {
    fn observe(&mut self, event: &CommandEvent, tree: &FileTree) -> Vec<String> {
        let mut newly = Vec::new();
        for (id, _, predicate) in &self.tasks {
            if !self.completed.contains(id) && predicate(event, tree) && self.completed.insert(id) {
                info!("task completed: {id}");
                newly.push(id.clone());
            }
        }
        newly
    }
}
