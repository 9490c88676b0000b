//! Built-in commands for the Linux Quest terminal.

use quest_types::{QuestError, Result};
use quest_vfs::{Access, ModeSpec, Node, resolve_path, split_parent};

use crate::interpreter::{
    Command, CommandOutput, CommandRegistry, Environment, ListingEntry, PipelineRole, strip_quotes,
};
use crate::script;

/// Register all built-in commands into a registry.
///
/// `help` is not registered here; the registry answers it itself.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(PwdCmd));
    reg.register(Box::new(CdCmd));
    reg.register(Box::new(LsCmd));
    reg.register(Box::new(MkdirCmd));
    reg.register(Box::new(TouchCmd));
    reg.register(Box::new(CatCmd));
    reg.register(Box::new(EchoCmd));
    reg.register(Box::new(ChmodCmd));
    reg.register(Box::new(HistoryCmd));
    reg.register(Box::new(ClearCmd));
    reg.register(Box::new(LessCmd));
    reg.register(Box::new(BashCmd));
    reg.register(Box::new(ExecCmd));
    reg.register(Box::new(EditCmd { name: "edit" }));
    reg.register(Box::new(EditCmd { name: "nano" }));
    crate::register_text_commands(reg);
    crate::register_lesson_commands(reg);
}

/// Read a file operand relative to the cwd. Requires the owner read bit.
pub(crate) fn read_operand(env: &Environment<'_>, operand: &str) -> Result<String> {
    let path = resolve_path(&env.cwd, operand);
    let (dir, name) = split_parent(&path);
    env.tree.read_file(dir, name).map(str::to_string)
}

/// One `ls -l` line.
pub(crate) fn long_line(name: &str, node: &Node) -> String {
    let meta = node.meta();
    format!(
        "{}{} {} {} {:>5} {} {name}",
        node.type_char(),
        meta.permissions.symbolic(),
        meta.owner,
        meta.group,
        node.size(),
        node.modified_at().format("%b %d %H:%M"),
    )
}

// ---------------------------------------------------------------------------
// pwd
// ---------------------------------------------------------------------------

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn category(&self) -> &str {
        "files"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(env.cwd.clone()))
    }
}

// ---------------------------------------------------------------------------
// cd
// ---------------------------------------------------------------------------

struct CdCmd;
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "Change working directory"
    }
    fn usage(&self) -> &str {
        "cd [path]"
    }
    fn category(&self) -> &str {
        "files"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let Some(&arg) = args.first() else {
            env.cwd = env.home.clone();
            return Ok(CommandOutput::None);
        };
        let mut target = resolve_path(&env.cwd, arg);
        // Never rise above home: any ancestor of it lands on home itself.
        let above_home = target == "/" || env.home.starts_with(&format!("{target}/"));
        if above_home {
            target = env.home.clone();
        }
        match env.tree.get(&target) {
            Some(node) if node.is_dir() => {
                env.cwd = target;
                Ok(CommandOutput::None)
            },
            Some(_) => Err(QuestError::NotADirectory(arg.to_string())),
            None => Err(QuestError::NotFound(arg.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "ls [-l] [-d] [path]"
    }
    fn category(&self) -> &str {
        "files"
    }
    fn role(&self) -> PipelineRole {
        PipelineRole::Source
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut long = false;
        let mut itself = false;
        let mut operand = None;
        for &arg in args {
            if let Some(flags) = arg.strip_prefix('-')
                && !flags.is_empty()
            {
                for c in flags.chars() {
                    match c {
                        'l' => long = true,
                        'd' => itself = true,
                        'a' => {},
                        other => {
                            return Err(QuestError::InvalidArgument(format!(
                                "invalid option -- '{other}'"
                            )));
                        },
                    }
                }
            } else {
                operand = Some(arg);
            }
        }

        let path = operand.map_or_else(|| env.cwd.clone(), |p| resolve_path(&env.cwd, p));
        let display = operand.unwrap_or(".");
        let node = env
            .tree
            .get(&path)
            .ok_or_else(|| QuestError::NotFound(display.to_string()))?;

        if itself || !node.is_dir() {
            let line = if long {
                long_line(display, node)
            } else {
                display.to_string()
            };
            return Ok(CommandOutput::Text(line));
        }

        let entries = env.tree.list(&path)?;
        if !long {
            let listing = entries
                .iter()
                .map(|(name, node)| ListingEntry {
                    name: name.to_string(),
                    is_dir: node.is_dir(),
                })
                .collect();
            return Ok(CommandOutput::Listing(listing));
        }
        let mut lines = Vec::with_capacity(entries.len() + 1);
        lines.push(format!("total {}", entries.len()));
        for (name, node) in &entries {
            lines.push(long_line(name, node));
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// mkdir
// ---------------------------------------------------------------------------

struct MkdirCmd;
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create a directory"
    }
    fn usage(&self) -> &str {
        "mkdir <dir...>"
    }
    fn category(&self) -> &str {
        "files"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn mutates_filesystem(&self) -> bool {
        true
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        for arg in args {
            let path = resolve_path(&env.cwd, arg);
            let (dir, name) = split_parent(&path);
            env.tree.create_directory(dir, name, env.now)?;
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// touch
// ---------------------------------------------------------------------------

struct TouchCmd;
impl Command for TouchCmd {
    fn name(&self) -> &str {
        "touch"
    }
    fn description(&self) -> &str {
        "Create an empty file or refresh its timestamp"
    }
    fn usage(&self) -> &str {
        "touch <file...>"
    }
    fn category(&self) -> &str {
        "files"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn mutates_filesystem(&self) -> bool {
        true
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        for arg in args {
            let path = resolve_path(&env.cwd, arg);
            let (dir, name) = split_parent(&path);
            env.tree.create_file(dir, name, "", env.now)?;
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

struct CatCmd;
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Display file contents"
    }
    fn usage(&self) -> &str {
        "cat [-n] <file...>"
    }
    fn category(&self) -> &str {
        "files"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn role(&self) -> PipelineRole {
        PipelineRole::Source
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let number = args.contains(&"-n");
        let files: Vec<&str> = args.iter().copied().filter(|a| *a != "-n").collect();
        if files.is_empty() {
            return Err(QuestError::InvalidArgument(format!("usage: {}", self.usage())));
        }
        let mut parts = Vec::with_capacity(files.len());
        for file in files {
            parts.push(read_operand(env, file)?);
        }
        let text = parts.join("\n");
        if !number {
            return Ok(CommandOutput::Text(text));
        }
        let numbered: Vec<String> = text
            .lines()
            .enumerate()
            .map(|(i, line)| format!("{:>6} {line}", i + 1))
            .collect();
        Ok(CommandOutput::Text(numbered.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print text"
    }
    fn usage(&self) -> &str {
        "echo [text...]"
    }
    fn role(&self) -> PipelineRole {
        PipelineRole::Source
    }
    fn execute(&self, args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        let text = args.join(" ");
        Ok(CommandOutput::Text(strip_quotes(&text).to_string()))
    }
}

// ---------------------------------------------------------------------------
// chmod
// ---------------------------------------------------------------------------

struct ChmodCmd;
impl Command for ChmodCmd {
    fn name(&self) -> &str {
        "chmod"
    }
    fn description(&self) -> &str {
        "Change file permissions (octal or symbolic)"
    }
    fn usage(&self) -> &str {
        "chmod <mode> <file...>"
    }
    fn category(&self) -> &str {
        "permissions"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn mutates_filesystem(&self) -> bool {
        true
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let spec: ModeSpec = args[0].parse()?;
        let mut report = Vec::new();
        for file in &args[1..] {
            let path = resolve_path(&env.cwd, file);
            let (dir, name) = split_parent(&path);
            let perms = env.tree.change_permissions(dir, name, &spec)?;
            report.push(format!(
                "mode of '{file}' is now {} ({})",
                perms.octal(),
                perms.symbolic()
            ));
        }
        Ok(CommandOutput::Notice(report.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// history
// ---------------------------------------------------------------------------

struct HistoryCmd;
impl Command for HistoryCmd {
    fn name(&self) -> &str {
        "history"
    }
    fn description(&self) -> &str {
        "Show command history"
    }
    fn usage(&self) -> &str {
        "history"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let lines: Vec<String> = env
            .history
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}: {line}", i + 1))
            .collect();
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear terminal output"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Clear)
    }
}

// ---------------------------------------------------------------------------
// less
// ---------------------------------------------------------------------------

struct LessCmd;
impl Command for LessCmd {
    fn name(&self) -> &str {
        "less"
    }
    fn description(&self) -> &str {
        "View a file one page at a time"
    }
    fn usage(&self) -> &str {
        "less <file>"
    }
    fn category(&self) -> &str {
        "files"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let content = read_operand(env, args[0])?;
        Ok(CommandOutput::Pager {
            title: args[0].to_string(),
            content,
        })
    }
}

// ---------------------------------------------------------------------------
// bash
// ---------------------------------------------------------------------------

struct BashCmd;
impl Command for BashCmd {
    fn name(&self) -> &str {
        "bash"
    }
    fn description(&self) -> &str {
        "Run a shell script"
    }
    fn usage(&self) -> &str {
        "bash <script>"
    }
    fn category(&self) -> &str {
        "scripting"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let source = read_operand(env, args[0])?;
        let lines = script::run_script(args[0], &source, env);
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// ./script
// ---------------------------------------------------------------------------

/// Runs `./name`; the registry passes `name` as the first argument.
struct ExecCmd;
impl Command for ExecCmd {
    fn name(&self) -> &str {
        "./"
    }
    fn description(&self) -> &str {
        "Run an executable script"
    }
    fn usage(&self) -> &str {
        "./<script>"
    }
    fn category(&self) -> &str {
        "scripting"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let operand = args[0];
        let shown = format!("./{operand}");
        let path = resolve_path(&env.cwd, operand);
        match env.tree.get(&path) {
            None => return Err(QuestError::NotFound(shown)),
            Some(Node::Directory(_)) => return Err(QuestError::IsADirectory(shown)),
            Some(Node::File(f)) if !f.meta.permissions.owner.contains(Access::EXEC) => {
                return Err(QuestError::PermissionDenied(shown));
            },
            Some(Node::File(_)) => {},
        }
        let source = read_operand(env, operand)?;
        let lines = script::run_script(operand, &source, env);
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// edit / nano
// ---------------------------------------------------------------------------

/// Opens the line editor. A missing file starts empty and is created on save.
struct EditCmd {
    name: &'static str,
}
impl Command for EditCmd {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        "Edit a file line by line"
    }
    fn usage(&self) -> &str {
        if self.name == "nano" {
            "nano <file>"
        } else {
            "edit <file>"
        }
    }
    fn category(&self) -> &str {
        "files"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let path = resolve_path(&env.cwd, args[0]);
        let (dir, _) = split_parent(&path);
        let content = match env.tree.get(&path) {
            Some(_) => read_operand(env, args[0])?,
            None if env.tree.get(dir).is_some_and(Node::is_dir) => String::new(),
            None => return Err(QuestError::NotFound(args[0].to_string())),
        };
        Ok(CommandOutput::Editor { path, content })
    }
}
