//! The per-session virtual shell.
//!
//! [`VirtualShell::submit`] is the only entry point a front-end needs: it
//! takes one typed line and returns the records to render. Errors never
//! escape; they become `Error` records.

use std::collections::HashMap;

use log::{debug, info};

use quest_terminal::{
    CommandOutput, CommandRegistry, Editor, EditorInput, Environment, ParsedLine, Pager, PagerKey,
    PagerState, register_builtins,
};
use quest_types::{Clock, OutputLine, QuestError, Result, SystemClock};
use quest_vfs::{FileTree, WriteMode, resolve_path, split_parent};

use crate::lesson::LessonConfig;
use crate::tasks::{CommandEvent, TaskBoard, TaskTracker};

pub struct VirtualShell {
    tree: FileTree,
    cwd: String,
    home: String,
    user: String,
    hostname: String,
    page_size: usize,
    history: Vec<String>,
    variables: HashMap<String, String>,
    pager: PagerState,
    editor: Option<Editor>,
    registry: CommandRegistry,
    clock: Box<dyn Clock>,
    tasks: TaskBoard,
    trackers: Vec<Box<dyn TaskTracker>>,
}

impl VirtualShell {
    /// Start a session for `lesson` on the system clock.
    pub fn new(lesson: &LessonConfig) -> Result<Self> {
        Self::with_clock(lesson, SystemClock)
    }

    pub fn with_clock(lesson: &LessonConfig, clock: impl Clock + 'static) -> Result<Self> {
        let tree = FileTree::from_seed(
            &lesson.home,
            &lesson.user,
            &lesson.group,
            &lesson.tree,
            clock.now(),
        )?;
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry);
        registry.restrict(&lesson.commands);
        info!(
            "session started: '{}' ({} commands, {} tasks)",
            lesson.title,
            registry.enabled_commands().len(),
            lesson.tasks.len()
        );
        Ok(Self {
            tree,
            cwd: lesson.home.clone(),
            home: lesson.home.clone(),
            user: lesson.user.clone(),
            hostname: lesson.hostname.clone(),
            page_size: lesson.page_size,
            history: Vec::new(),
            variables: HashMap::new(),
            pager: PagerState::default(),
            editor: None,
            registry,
            clock: Box::new(clock),
            tasks: TaskBoard::from_rules(&lesson.tasks),
            trackers: Vec::new(),
        })
    }

    /// `user@host:dir$`, with the home directory shown as `~`.
    pub fn prompt(&self) -> String {
        let dir = match self.cwd.strip_prefix(&self.home) {
            Some("") => "~".to_string(),
            Some(rest) if rest.starts_with('/') => format!("~{rest}"),
            _ => self.cwd.clone(),
        };
        format!("{}@{}:{dir}$", self.user, self.hostname)
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    pub fn in_pager(&self) -> bool {
        self.pager.is_open()
    }

    pub fn in_editor(&self) -> bool {
        self.editor.is_some()
    }

    /// The open editor buffer, if any.
    pub fn editor(&self) -> Option<&Editor> {
        self.editor.as_ref()
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// The lesson's own tasks.
    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut TaskBoard {
        &mut self.tasks
    }

    /// Register an extra tracker; it sees every event after the lesson's tasks.
    pub fn add_tracker(&mut self, tracker: Box<dyn TaskTracker>) {
        self.trackers.push(tracker);
    }

    /// Write a file relative to the cwd on behalf of an editor. Trackers see
    /// the write as a `save` event.
    pub fn save_file(&mut self, name: &str, content: &str) -> Result<Vec<OutputLine>> {
        let path = resolve_path(&self.cwd, name);
        let (dir, file) = split_parent(&path);
        debug!("editor save: {path}");
        self.tree
            .write_file(dir, file, content, WriteMode::Overwrite, self.clock.now())?;
        let mut out = vec![OutputLine::notice(format!("saved {file}"))];
        self.emit(&CommandEvent::saved(&path, &self.cwd), &mut out);
        Ok(out)
    }

    /// Submit one line and return what to render.
    pub fn submit(&mut self, line: &str) -> Vec<OutputLine> {
        if self.pager.is_open() {
            return self.pager.handle(PagerKey::parse(line));
        }
        if self.editor.is_some() {
            return self.edit(EditorInput::parse(line));
        }

        let line = line.trim();
        let mut out = vec![OutputLine::echo(format!("{} {line}", self.prompt()))];
        if line.is_empty() {
            return out;
        }
        self.history.push(line.to_string());

        let parsed = match ParsedLine::parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                out.push(OutputLine::error(format!("bash: {e}")));
                let event = CommandEvent::new(line, None, false, &self.cwd);
                self.emit(&event, &mut out);
                return out;
            },
        };

        let start_cwd = self.cwd.clone();
        let result = self.run(&parsed);
        let succeeded = result.is_ok();
        match result {
            Ok(output) => self.render(output, &mut out),
            Err(e) => out.extend(error_lines(&e, &parsed)),
        }
        let event =
            CommandEvent::new(line, Some(&parsed), succeeded, &self.cwd).with_target(&start_cwd);
        self.emit(&event, &mut out);
        out
    }

    /// Apply one editor line. Typed text is buffered silently.
    fn edit(&mut self, input: EditorInput) -> Vec<OutputLine> {
        let Some(editor) = self.editor.as_mut() else {
            return Vec::new();
        };
        match input {
            EditorInput::Text(text) => {
                editor.push(&text);
                Vec::new()
            },
            EditorInput::Show => editor.show(),
            EditorInput::DeleteLast => vec![editor.delete_last()],
            EditorInput::Quit if editor.is_modified() => vec![OutputLine::error(
                "unsaved changes: use :wq to save or :q! to discard",
            )],
            EditorInput::Quit | EditorInput::ForceQuit => self.close_editor(),
            EditorInput::Write => self.write_buffer().unwrap_or_else(|out| out),
            EditorInput::WriteQuit => match self.write_buffer() {
                Ok(mut out) => {
                    out.extend(self.close_editor());
                    out
                },
                Err(out) => out,
            },
        }
    }

    /// Save the open buffer. Both arms carry the lines to render.
    fn write_buffer(&mut self) -> std::result::Result<Vec<OutputLine>, Vec<OutputLine>> {
        let Some(editor) = self.editor.as_ref() else {
            return Ok(Vec::new());
        };
        let (path, content) = (editor.path().to_string(), editor.content());
        match self.save_file(&path, &content) {
            Ok(out) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.mark_saved();
                }
                Ok(out)
            },
            Err(e) => Err(vec![OutputLine::error(format!("save failed: {e}"))]),
        }
    }

    fn close_editor(&mut self) -> Vec<OutputLine> {
        if let Some(editor) = self.editor.take() {
            info!("editor closed on {}", editor.path());
        }
        vec![OutputLine::notice("--- editor closed ---")]
    }

    fn run(&mut self, parsed: &ParsedLine) -> Result<CommandOutput> {
        let mut env = Environment {
            cwd: self.cwd.clone(),
            home: self.home.clone(),
            user: self.user.clone(),
            tree: &mut self.tree,
            variables: &mut self.variables,
            history: &self.history,
            now: self.clock.now(),
            page_size: self.page_size,
            stdin: None,
        };
        let result = self.registry.run(parsed, &mut env);
        self.cwd = env.cwd;
        result
    }

    fn render(&mut self, output: CommandOutput, out: &mut Vec<OutputLine>) {
        match output {
            CommandOutput::Text(text) => out.extend(text.lines().map(OutputLine::output)),
            CommandOutput::Lines { lines, highlight } => out.extend(
                lines
                    .into_iter()
                    .map(|l| OutputLine::output(l).with_highlight(highlight.clone())),
            ),
            CommandOutput::Listing(entries) => {
                out.extend(entries.iter().map(|e| OutputLine::output(e.display())));
            },
            CommandOutput::Notice(text) => out.extend(text.lines().map(OutputLine::notice)),
            CommandOutput::None => {},
            CommandOutput::Clear => out.push(OutputLine::clear()),
            CommandOutput::Pager { title, content } => {
                info!("pager opened on {title}");
                out.extend(
                    self.pager
                        .open(Pager::new(&title, &content, self.page_size)),
                );
            },
            CommandOutput::Editor { path, content } => {
                info!("editor opened on {path}");
                let editor = Editor::open(&path, &content);
                out.extend(editor.banner());
                self.editor = Some(editor);
            },
        }
    }

    /// Report an event to every tracker and announce tasks it completed.
    fn emit(&mut self, event: &CommandEvent, out: &mut Vec<OutputLine>) {
        debug!("command event: {event:?}");
        let mut completed = self.tasks.observe(event, &self.tree);
        for tracker in &mut self.trackers {
            completed.extend(tracker.observe(event, &self.tree));
        }
        for id in completed {
            let label = match self.tasks.description(&id) {
                Some(desc) if !desc.is_empty() => desc.to_string(),
                _ => id,
            };
            out.push(OutputLine::notice(format!("task complete: {label}")));
        }
    }
}

/// `<command>: <error>` plus any hint that helps the learner.
fn error_lines(err: &QuestError, parsed: &ParsedLine) -> Vec<OutputLine> {
    let stage_command = |stage: usize| {
        parsed
            .stages
            .get(stage.saturating_sub(1))
            .and_then(|s| s.first())
            .map_or("bash", String::as_str)
    };
    let (command, inner, stage) = match err {
        QuestError::PipelineAborted { stage, source } => {
            (stage_command(*stage), source.as_ref(), Some(*stage))
        },
        other => (stage_command(1), other, None),
    };

    let mut lines = Vec::with_capacity(3);
    match inner {
        QuestError::CommandNotFound(_) => lines.push(OutputLine::error(inner.to_string())),
        _ if command.starts_with("./") => {
            lines.push(OutputLine::error(format!("bash: {inner}")));
        },
        _ => lines.push(OutputLine::error(format!("{command}: {inner}"))),
    }
    if let Some(stage) = stage {
        lines.push(OutputLine::notice(format!(
            "pipeline stopped at stage {stage}; nothing was written"
        )));
    }
    match inner {
        QuestError::CommandNotFound(_) => {
            lines.push(OutputLine::notice("Type 'help' to see available commands"));
        },
        QuestError::PermissionDenied(_) if command.starts_with("./") => {
            let script = command.trim_start_matches("./");
            lines.push(OutputLine::notice(format!(
                "hint: make it executable with 'chmod u+x {script}'"
            )));
        },
        _ => {},
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use quest_types::{FixedClock, LineKind};
    use quest_vfs::SeedEntry;

    use crate::lessons;

    fn lesson(tree: Vec<SeedEntry>) -> LessonConfig {
        LessonConfig {
            tree,
            ..LessonConfig::default()
        }
    }

    fn shell(tree: Vec<SeedEntry>) -> VirtualShell {
        VirtualShell::with_clock(&lesson(tree), FixedClock::default()).unwrap()
    }

    /// Output records, without the echoed prompt.
    fn run(sh: &mut VirtualShell, line: &str) -> Vec<OutputLine> {
        let out = sh.submit(line);
        assert_eq!(out[0].kind, LineKind::Echo);
        out[1..].to_vec()
    }

    fn texts(lines: &[OutputLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn prompt_tracks_cwd() {
        let mut sh = shell(vec![SeedEntry::directory("docs", vec![])]);
        assert_eq!(sh.prompt(), "quest@linux:~$");
        sh.submit("cd docs");
        assert_eq!(sh.prompt(), "quest@linux:~/docs$");
        assert_eq!(sh.cwd(), "/home/quest/docs");
    }

    #[test]
    fn echo_line_and_history() {
        let mut sh = shell(vec![]);
        let out = sh.submit("  pwd  ");
        assert_eq!(out[0], OutputLine::echo("quest@linux:~$ pwd"));
        assert_eq!(out[1], OutputLine::output("/home/quest"));
        sh.submit("");
        assert_eq!(sh.history(), ["pwd"]);
    }

    #[test]
    fn errors_become_one_error_record() {
        let mut sh = shell(vec![]);
        let out = run(&mut sh, "cat ghost.txt");
        assert_eq!(out, [OutputLine::error("cat: ghost.txt: No such file or directory")]);
    }

    #[test]
    fn unknown_command_gets_a_hint() {
        let mut sh = shell(vec![]);
        let out = run(&mut sh, "sl");
        assert_eq!(
            texts(&out),
            ["sl: command not found", "Type 'help' to see available commands"]
        );
        assert_eq!(out[1].kind, LineKind::Notice);
    }

    #[test]
    fn syntax_errors_use_bash_prefix() {
        let mut sh = shell(vec![]);
        let out = run(&mut sh, "cat f |");
        assert_eq!(out, [OutputLine::error("bash: syntax error near unexpected token '|'")]);
        assert_eq!(sh.history(), ["cat f |"]);
    }

    #[test]
    fn script_permission_hint() {
        let mut sh = shell(vec![SeedEntry::file("hello.sh", "echo \"Hello World!\"")]);
        let out = run(&mut sh, "./hello.sh");
        assert_eq!(
            texts(&out),
            [
                "bash: ./hello.sh: Permission denied",
                "hint: make it executable with 'chmod u+x hello.sh'"
            ]
        );
        run(&mut sh, "chmod u+x hello.sh");
        let out = run(&mut sh, "./hello.sh");
        assert_eq!(
            texts(&out),
            ["--- running hello.sh ---", "Hello World!", "--- hello.sh finished ---"]
        );
    }

    #[test]
    fn pipeline_abort_names_failing_stage() {
        let mut sh = shell(vec![SeedEntry::file("f", "abc")]);
        let out = run(&mut sh, "cat f | grep zzz | wc -l > out.txt");
        assert_eq!(out[0].kind, LineKind::Error);
        assert_eq!(out[0].text, "wc: no input from previous stage");
        assert!(out[1].text.contains("stage 3"));
        assert!(!sh.tree().exists("/home/quest/out.txt"));
    }

    #[test]
    fn empty_result_shows_nothing() {
        let mut sh = shell(vec![SeedEntry::directory("empty", vec![])]);
        assert!(run(&mut sh, "ls empty").is_empty());
    }

    #[test]
    fn grep_lines_carry_highlight() {
        let mut sh = shell(vec![SeedEntry::file("f", "alpha\nbeta")]);
        let out = run(&mut sh, "grep alp f");
        assert_eq!(out, [OutputLine::output("1:alpha").with_highlight(Some("alp".into()))]);
    }

    #[test]
    fn clear_signal_record() {
        let mut sh = shell(vec![]);
        assert_eq!(run(&mut sh, "clear"), [OutputLine::clear()]);
    }

    #[test]
    fn pager_takes_over_input() {
        let story: Vec<String> = (1..=25).map(|i| format!("line {i}")).collect();
        let mut sh = shell(vec![SeedEntry::file("long_story.txt", &story.join("\n"))]);
        let out = run(&mut sh, "less long_story.txt");
        assert!(sh.in_pager());
        assert_eq!(out.last().unwrap().text, "40% (10/25)");

        // Keys are not commands and are not recorded.
        let out = sh.submit("b");
        assert_eq!(out, [OutputLine::notice("--- start of file ---")]);
        sh.submit(" ");
        let out = sh.submit("q");
        assert_eq!(out, [OutputLine::notice("--- less closed ---")]);
        assert!(!sh.in_pager());
        assert_eq!(sh.history(), ["less long_story.txt"]);
    }

    #[test]
    fn less_respects_lesson_page_size() {
        let config = LessonConfig {
            page_size: 5,
            tree: vec![SeedEntry::file("f", "1\n2\n3\n4\n5\n6\n7\n8\n9\n10")],
            ..LessonConfig::default()
        };
        let mut sh = VirtualShell::with_clock(&config, FixedClock::default()).unwrap();
        let out = sh.submit("less f");
        assert_eq!(out.last().unwrap().text, "50% (5/10)");
    }

    #[test]
    fn allowlist_restricts_commands() {
        let config = LessonConfig {
            commands: vec!["pwd".to_string()],
            ..LessonConfig::default()
        };
        let mut sh = VirtualShell::with_clock(&config, FixedClock::default()).unwrap();
        assert_eq!(run(&mut sh, "ls")[0].text, "ls: command not found");
        assert_eq!(run(&mut sh, "pwd")[0].text, "/home/quest");
    }

    #[test]
    fn save_file_writes_in_cwd() {
        let mut sh = shell(vec![SeedEntry::directory("src", vec![])]);
        sh.submit("cd src");
        let out = sh.save_file("script.sh", "echo saved").unwrap();
        assert_eq!(out, [OutputLine::notice("saved script.sh")]);
        assert_eq!(sh.tree().file("/home/quest/src/script.sh").unwrap().content, "echo saved");
        sh.save_file("script.sh", "echo again").unwrap();
        assert_eq!(sh.tree().file("/home/quest/src/script.sh").unwrap().content, "echo again");
        assert!(sh.save_file("../..", "x").is_err());
    }

    #[test]
    fn script_variables_persist_in_session() {
        let mut sh = shell(vec![SeedEntry::file("vars.sh", "NAME=Ada")]);
        sh.submit("bash vars.sh");
        assert_eq!(sh.variables()["NAME"], "Ada");
    }

    #[test]
    fn ls_dates_follow_the_clock() {
        let clock = FixedClock::at(2025, 1, 5, 9, 30);
        let mut sh = VirtualShell::with_clock(&lesson(vec![]), clock.clone()).unwrap();
        clock.advance(60);
        sh.submit("touch new.txt");
        let out = run(&mut sh, "ls -l");
        assert_eq!(out[1].text, "-rw-r--r-- quest quest     0 Jan 05 09:31 new.txt");
    }

    #[test]
    fn lesson_tasks_complete_once() {
        let mut sh = VirtualShell::with_clock(&lessons::builtin(1).unwrap(), FixedClock::default())
            .unwrap();
        let out = run(&mut sh, "pwd");
        assert_eq!(
            out.last().unwrap(),
            &OutputLine::notice("task complete: Find out where you are with pwd")
        );
        let out = run(&mut sh, "pwd");
        assert_eq!(out.len(), 1);
        assert!(sh.tasks().completed().contains("task-pwd"));
        assert!(!sh.tasks().is_complete());
    }

    #[test]
    fn failed_commands_do_not_complete_tasks() {
        let mut sh = VirtualShell::with_clock(&lessons::builtin(2).unwrap(), FixedClock::default())
            .unwrap();
        sh.submit("cat missing.txt");
        assert!(!sh.tasks().completed().contains("task-cat"));
        sh.submit("mkdir adventure");
        sh.submit("cd adventure");
        assert!(sh.tasks().completed().contains("task-mkdir"));
        assert!(sh.tasks().completed().contains("task-cd"));
    }

    struct Recorder(Rc<RefCell<Vec<CommandEvent>>>);

    impl TaskTracker for Recorder {
        fn observe(&mut self, event: &CommandEvent, _tree: &FileTree) -> Vec<String> {
            self.0.borrow_mut().push(event.clone());
            Vec::new()
        }
    }

    #[test]
    fn external_trackers_see_every_command() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut sh = shell(vec![SeedEntry::file("f", "x")]);
        sh.add_tracker(Box::new(Recorder(Rc::clone(&seen))));
        sh.submit("cat f | wc -l");
        sh.submit("nope");
        sh.submit("");
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].stages, ["cat", "wc"]);
        assert!(seen[0].succeeded);
        assert_eq!(seen[1].command, "nope");
        assert!(!seen[1].succeeded);
    }

    #[test]
    fn day6_pipeline_counts_successful_requests() {
        let mut sh = VirtualShell::with_clock(&lessons::builtin(6).unwrap(), FixedClock::default())
            .unwrap();
        let out = run(&mut sh, "cat access.log | grep \"200\" | wc -l");
        assert_eq!(out[0], OutputLine::output("6"));
        assert!(sh.tasks().completed().contains("task-multiple-pipes"));
        assert!(sh.tasks().completed().contains("task-grep-pipe"));
    }

    fn day(n: u8) -> VirtualShell {
        VirtualShell::with_clock(&lessons::builtin(n).unwrap(), FixedClock::default()).unwrap()
    }

    fn done(sh: &VirtualShell, id: &str) -> bool {
        sh.tasks().completed().contains(id)
    }

    #[test]
    fn piped_ls_is_listed_with_suffix() {
        let mut sh = shell(vec![SeedEntry::file("a.txt", ""), SeedEntry::directory("docs", vec![])]);
        assert_eq!(texts(&run(&mut sh, "ls")), ["a.txt", "docs/"]);
        assert_eq!(texts(&run(&mut sh, "ls | grep docs")), ["docs"]);
    }

    #[test]
    fn editor_buffers_lines_and_saves_through_shell() {
        let mut sh = shell(vec![]);
        let out = run(&mut sh, "nano hello.sh");
        assert!(sh.in_editor());
        assert_eq!(out[0], OutputLine::notice("--- editing hello.sh ---"));

        // Buffered lines are neither echoed nor recorded.
        assert!(sh.submit("#!/bin/bash").is_empty());
        assert!(sh.submit("echo hi").is_empty());
        assert!(!sh.tree().exists("/home/quest/hello.sh"));
        assert_eq!(sh.submit(":w"), [OutputLine::notice("saved hello.sh")]);
        assert_eq!(
            sh.tree().file("/home/quest/hello.sh").unwrap().content,
            "#!/bin/bash\necho hi"
        );
        assert_eq!(sh.submit(":q"), [OutputLine::notice("--- editor closed ---")]);
        assert!(!sh.in_editor());
        assert_eq!(sh.history(), ["nano hello.sh"]);
    }

    #[test]
    fn editor_refuses_to_drop_unsaved_changes() {
        let mut sh = shell(vec![SeedEntry::file("notes.txt", "one")]);
        sh.submit("edit notes.txt");
        sh.submit("two");
        assert_eq!(sh.submit(":p").len(), 2);
        assert_eq!(sh.submit(":q")[0].kind, LineKind::Error);
        assert!(sh.in_editor());
        sh.submit(":q!");
        assert!(!sh.in_editor());
        assert_eq!(sh.tree().file("/home/quest/notes.txt").unwrap().content, "one");

        sh.submit("edit notes.txt");
        sh.submit("three");
        let out = sh.submit(":wq");
        assert_eq!(texts(&out), ["saved notes.txt", "--- editor closed ---"]);
        assert_eq!(sh.tree().file("/home/quest/notes.txt").unwrap().content, "one\nthree");
    }

    #[test]
    fn day3_full_cat_and_editor_tasks() {
        let mut sh = day(3);
        sh.submit("cat -n long_story.txt");
        assert!(done(&sh, "task-cat-n"));
        assert!(!done(&sh, "task-cat-full"));
        sh.submit("cat config.txt");
        assert!(!done(&sh, "task-cat-full"));
        sh.submit("cat long_story.txt");
        assert!(done(&sh, "task-cat-full"));
        sh.submit("nano adventure_log.txt");
        assert!(done(&sh, "task-nano"));
        sh.submit(":q");
    }

    #[test]
    fn day4_accepts_any_octal_or_symbolic_mode() {
        let mut sh = day(4);
        sh.submit("chmod 700 secret.txt");
        assert!(done(&sh, "task-chmod-number"));
        assert!(!done(&sh, "task-chmod-letter"));
        sh.submit("chmod o-r notes.txt");
        assert!(done(&sh, "task-chmod-letter"));
        assert!(!done(&sh, "task-script-execute"));
        sh.submit("chmod u=rwx my_script.sh");
        assert!(done(&sh, "task-script-execute"));
        sh.submit("mkdir private");
        assert!(done(&sh, "task-directory-permission"));
        sh.submit("./my_script.sh");
        assert!(done(&sh, "task-run-script"));
    }

    #[test]
    fn day4_script_task_needs_the_execute_bit() {
        let mut sh = day(4);
        sh.submit("chmod 644 my_script.sh");
        assert!(!done(&sh, "task-script-execute"));
        sh.submit("chmod 755 my_script.sh");
        assert!(done(&sh, "task-script-execute"));
    }

    #[test]
    fn day5_tasks_follow_saved_content() {
        let mut sh = day(5);
        sh.submit("nano adventure.sh");
        for line in [
            "#!/bin/bash",
            "NAME=\"quest\"",
            "echo \"Hi $NAME\"",
            "read ANSWER",
        ] {
            sh.submit(line);
        }
        sh.submit(":w");
        for id in ["task-create-script", "task-variables", "task-user-input"] {
            assert!(done(&sh, id), "{id}");
        }
        assert!(!done(&sh, "task-if-statement"));

        for line in [
            "if [ \"$ANSWER\" = yes ]; then",
            "  echo ok",
            "fi",
            "for i in 1 2; do",
            "  echo $i",
            "done",
            "cheer() {",
            "  echo go",
            "}",
        ] {
            sh.submit(line);
        }
        let out = sh.submit(":wq");
        assert!(texts(&out).contains(&"task complete: Branch with if, then and fi"));
        for id in ["task-if-statement", "task-for-loop", "task-function"] {
            assert!(done(&sh, id), "{id}");
        }

        assert!(!done(&sh, "task-practical-script"));
        sh.submit("chmod +x adventure.sh");
        sh.submit("./adventure.sh");
        assert!(done(&sh, "task-practical-script"));
        assert!(sh.tasks().is_complete());
    }

    #[test]
    fn day5_demo_scripts_run() {
        let mut sh = day(5);
        let out = run(&mut sh, "demo conditions");
        assert_eq!(out[0].text, "created demo script conditions_demo.sh");
        let out = run(&mut sh, "./conditions_demo.sh");
        assert!(texts(&out).contains(&"[conditional executed]"));
    }

    #[test]
    fn day7_admin_functions_complete_tasks() {
        let mut sh = day(7);
        assert_eq!(run(&mut sh, "admin system-info")[0].kind, LineKind::Error);
        sh.submit("chmod +x scripts/admin_tool.sh");
        assert!(done(&sh, "task-create-admin-tool"));
        for (function, id) in [
            ("system-info", "task-system-info"),
            ("process-monitor", "task-process-monitor"),
            ("file-manager", "task-file-management"),
        ] {
            sh.submit(&format!("admin {function}"));
            assert!(done(&sh, id), "{id}");
        }
        let out = run(&mut sh, "admin log-analysis");
        assert!(texts(&out).contains(&"system.log: 4 info, 2 warnings, 1 errors"));
    }
}
