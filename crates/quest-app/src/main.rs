//! Linux Quest terminal entry point.
//!
//! Loads a lesson (a day number, `dayN`, or a lesson file path) from the
//! first argument or `LINUX_QUEST_LESSON`, then reads commands from stdin.
//! Type `exit` or send EOF to quit. Set `NO_COLOR` to disable ANSI escapes.

mod render;

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use quest_core::types::LineKind;
use quest_core::{VirtualShell, resolve_lesson};

const DEFAULT_LESSON: &str = "7";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let lesson_name = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("LINUX_QUEST_LESSON").ok())
        .unwrap_or_else(|| DEFAULT_LESSON.to_string());
    let lesson = resolve_lesson(&lesson_name)
        .with_context(|| format!("loading lesson '{lesson_name}'"))?;
    log::info!("Loaded lesson: {} ({} tasks)", lesson.title, lesson.tasks.len());

    let mut shell = VirtualShell::new(&lesson).context("building the shell")?;
    let color = std::env::var_os("NO_COLOR").is_none();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", lesson.title)?;
    for (_, description) in shell.tasks().tasks() {
        writeln!(out, "  [ ] {description}")?;
    }
    writeln!(out)?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if shell.in_pager() {
            write!(out, ": ")?;
        } else if shell.in_editor() {
            write!(out, "> ")?;
        } else {
            write!(out, "{} ", shell.prompt())?;
        }
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line.context("reading stdin")?;
        let raw_input = shell.in_pager() || shell.in_editor();
        if !raw_input && line.trim() == "exit" {
            break;
        }

        // The prompt echo is already on screen.
        let outputs = shell.submit(&line);
        for output in outputs.iter().skip_while(|l| l.kind == LineKind::Echo) {
            log::debug!("{}", serde_json::to_string(output)?);
            writeln!(out, "{}", render::render_line(output, color))?;
        }
    }

    let board = shell.tasks();
    log::info!(
        "Session finished: {}/{} tasks complete",
        board.completed().len(),
        board.tasks().count()
    );
    Ok(())
}
