//! Lesson helpers: `demo` writes example scripts, `admin` runs the
//! functions of the day 7 administration tool.

use quest_types::{QuestError, Result};
use quest_vfs::{Access, ModeSpec, Node, Permissions, WriteMode, join};

use crate::commands::long_line;
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};

/// Register `demo` and `admin` into a registry.
pub fn register_lesson_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(DemoCmd));
    reg.register(Box::new(AdminCmd));
}

// ---------------------------------------------------------------------------
// demo
// ---------------------------------------------------------------------------

const DEMOS: &[(&str, &str)] = &[
    (
        "basic",
        r#"#!/bin/bash
# a basic script
echo "=== basic script demo ==="
echo "Welcome to the world of scripts!"
echo "Current time: $(date)"
echo "Current user: $USER""#,
    ),
    (
        "variables",
        r#"#!/bin/bash
# using variables
NAME="Linux adventurer"
LEVEL=5
EXPERIENCE=1000

echo "=== variables demo ==="
echo "Name: $NAME"
echo "Level: $LEVEL"
echo "Experience: $EXPERIENCE""#,
    ),
    (
        "conditions",
        r#"#!/bin/bash
# branching
echo "=== conditions demo ==="
SCORE=85

if [ $SCORE -ge 90 ]; then
    echo "Excellent! Rank A"
elif [ $SCORE -ge 70 ]; then
    echo "Well done! Rank B"
else
    echo "Keep practicing"
fi"#,
    ),
    (
        "loops",
        r#"#!/bin/bash
# loops
echo "=== loops demo ==="

echo "Countdown:"
for i in 5 4 3 2 1; do
    echo "$i..."
done
echo "Done!""#,
    ),
    (
        "functions",
        r#"#!/bin/bash
# functions
greet_user() {
    local name=$1
    echo "Hello, $name!"
}

echo "=== functions demo ==="
greet_user "script learner""#,
    ),
];

fn demo_names() -> String {
    DEMOS.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ")
}

/// Writes `<type>_demo.sh` into the cwd with mode `rwxr-xr-x`.
struct DemoCmd;
impl Command for DemoCmd {
    fn name(&self) -> &str {
        "demo"
    }
    fn description(&self) -> &str {
        "Create an example script"
    }
    fn usage(&self) -> &str {
        "demo <basic|variables|conditions|loops|functions>"
    }
    fn category(&self) -> &str {
        "scripting"
    }
    fn mutates_filesystem(&self) -> bool {
        true
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let Some(kind) = args.first() else {
            return Ok(CommandOutput::Notice(format!(
                "demo: available demos: {}",
                demo_names()
            )));
        };
        let Some((_, source)) = DEMOS.iter().find(|(name, _)| name == kind) else {
            return Err(QuestError::InvalidArgument(format!(
                "unknown demo '{kind}' (available: {})",
                demo_names()
            )));
        };
        let file = format!("{kind}_demo.sh");
        env.tree
            .write_file(&env.cwd, &file, source, WriteMode::Overwrite, env.now)?;
        let mode = ModeSpec::Octal(Permissions::from_octal("755")?);
        env.tree.change_permissions(&env.cwd, &file, &mode)?;
        Ok(CommandOutput::Text(format!(
            "created demo script {file}\ncat {file} to view it, ./{file} to run it"
        )))
    }
}

// ---------------------------------------------------------------------------
// admin
// ---------------------------------------------------------------------------

const ADMIN_TOOL: &str = "scripts/admin_tool.sh";

const FUNCTIONS: &[&str] = &[
    "system-info",
    "process-monitor",
    "log-analysis",
    "backup",
    "file-manager",
];

/// Runs one function of the admin tool. The tool must be executable.
struct AdminCmd;
impl Command for AdminCmd {
    fn name(&self) -> &str {
        "admin"
    }
    fn description(&self) -> &str {
        "Run a function of the admin tool"
    }
    fn usage(&self) -> &str {
        "admin <system-info|process-monitor|log-analysis|backup|file-manager>"
    }
    fn category(&self) -> &str {
        "scripting"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn mutates_filesystem(&self) -> bool {
        true
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let tool = join(&env.home, ADMIN_TOOL);
        let ready = env
            .tree
            .file(&tool)
            .is_some_and(|f| f.meta.permissions.owner.contains(Access::EXEC));
        if !ready {
            return Err(QuestError::InvalidArgument(format!(
                "~/{ADMIN_TOOL} is not executable yet (try chmod +x)"
            )));
        }
        let lines = match args[0] {
            "system-info" => system_info(env),
            "process-monitor" => process_monitor(),
            "log-analysis" => log_analysis(env)?,
            "backup" => backup(env)?,
            "file-manager" => file_manager(env)?,
            other => {
                return Err(QuestError::InvalidArgument(format!(
                    "unknown function '{other}' (available: {})",
                    FUNCTIONS.join(", ")
                )));
            },
        };
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

/// Files and directories below `path`, not counting `path` itself.
fn count_nodes(env: &Environment<'_>, path: &str) -> (usize, usize) {
    let Ok(entries) = env.tree.list(path) else {
        return (0, 0);
    };
    entries.iter().fold((0, 0), |(files, dirs), (name, node)| {
        if node.is_dir() {
            let (f, d) = count_nodes(env, &join(path, name));
            (files + f, dirs + d + 1)
        } else {
            (files + 1, dirs)
        }
    })
}

fn system_info(env: &Environment<'_>) -> Vec<String> {
    let (files, dirs) = count_nodes(env, &env.home);
    vec![
        "=== system information ===".to_string(),
        "os:        Linux Quest OS 1.0".to_string(),
        format!("user:      {}", env.user),
        format!("home:      {}", env.home),
        format!("cwd:       {}", env.cwd),
        format!("time:      {}", env.now.format("%Y-%m-%d %H:%M")),
        format!("files:     {files}"),
        format!("dirs:      {dirs}"),
    ]
}

fn process_monitor() -> Vec<String> {
    [
        "=== process monitor ===",
        "  PID USER     %CPU %MEM COMMAND",
        "    1 root      0.1  0.4 init",
        "  412 root      0.3  1.2 sshd",
        "  988 quest     1.5  2.8 bash",
        " 1024 quest     0.0  0.6 admin_tool.sh",
    ]
    .iter()
    .map(|line| line.to_string())
    .collect()
}

/// INFO, WARN and ERROR counts for each `.log` file in `~/logs`.
fn log_analysis(env: &Environment<'_>) -> Result<Vec<String>> {
    let dir = join(&env.home, "logs");
    let mut out = vec!["=== log analysis ===".to_string()];
    for (name, node) in env.tree.list(&dir)? {
        let Node::File(file) = node else { continue };
        if !name.ends_with(".log") {
            continue;
        }
        let count = |level: &str| file.content.lines().filter(|l| l.contains(level)).count();
        out.push(format!(
            "{name}: {} info, {} warnings, {} errors",
            count("INFO"),
            count("WARN"),
            count("ERROR")
        ));
    }
    if out.len() == 1 {
        out.push("no log files found".to_string());
    }
    Ok(out)
}

/// Copy the regular files of the home directory into `~/backup`.
fn backup(env: &mut Environment<'_>) -> Result<Vec<String>> {
    let target = join(&env.home, "backup");
    if !env.tree.exists(&target) {
        env.tree.create_directory(&env.home, "backup", env.now)?;
    }
    let files: Vec<(String, String)> = env
        .tree
        .list(&env.home)?
        .into_iter()
        .filter_map(|(name, node)| match node {
            Node::File(f) => Some((name.to_string(), f.content.clone())),
            Node::Directory(_) => None,
        })
        .collect();
    let mut out = vec!["=== backup ===".to_string()];
    for (name, content) in &files {
        env.tree
            .write_file(&target, name, content, WriteMode::Overwrite, env.now)?;
        out.push(format!("backed up {name}"));
    }
    out.push(format!("{} file(s) copied to ~/backup", files.len()));
    Ok(out)
}

fn file_manager(env: &Environment<'_>) -> Result<Vec<String>> {
    let mut out = vec![format!("=== files in {} ===", env.cwd)];
    out.extend(
        env.tree
            .list(&env.cwd)?
            .into_iter()
            .map(|(name, node)| long_line(name, node)),
    );
    Ok(out)
}
