//! Text filters: head, tail, wc, grep, sort, uniq, cut.
//!
//! Every filter reads a file operand when given one, else piped input.

use std::cmp::Ordering;
use std::collections::HashMap;

use quest_types::{QuestError, Result};

use crate::commands::read_operand;
use crate::interpreter::{Command, CommandOutput, Environment, PipelineRole};

// ---------------------------------------------------------------------------
// head
// ---------------------------------------------------------------------------

struct HeadCmd;
impl Command for HeadCmd {
    fn name(&self) -> &str {
        "head"
    }
    fn description(&self) -> &str {
        "Show first N lines"
    }
    fn usage(&self) -> &str {
        "head [-n N | -N] [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn role(&self) -> PipelineRole {
        PipelineRole::Filter
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (n, file) = parse_n_flag(args, 10)?;
        let text = read_text_input(file, env, self.usage())?;
        let result: Vec<&str> = text.lines().take(n).collect();
        Ok(CommandOutput::Text(result.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// tail
// ---------------------------------------------------------------------------

struct TailCmd;
impl Command for TailCmd {
    fn name(&self) -> &str {
        "tail"
    }
    fn description(&self) -> &str {
        "Show last N lines"
    }
    fn usage(&self) -> &str {
        "tail [-n N | -N] [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn role(&self) -> PipelineRole {
        PipelineRole::Filter
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (n, file) = parse_n_flag(args, 10)?;
        let text = read_text_input(file, env, self.usage())?;
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(n);
        Ok(CommandOutput::Text(lines[start..].join("\n")))
    }
}

// ---------------------------------------------------------------------------
// wc
// ---------------------------------------------------------------------------

struct WcCmd;
impl Command for WcCmd {
    fn name(&self) -> &str {
        "wc"
    }
    fn description(&self) -> &str {
        "Count lines, words, and characters"
    }
    fn usage(&self) -> &str {
        "wc [-l|-w|-c] [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn role(&self) -> PipelineRole {
        PipelineRole::Filter
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut mode = "all";
        let mut file_arg = None;
        for &arg in args {
            match arg {
                "-l" => mode = "lines",
                "-w" => mode = "words",
                "-c" => mode = "chars",
                _ => file_arg = Some(arg),
            }
        }
        let text = read_text_input(file_arg, env, self.usage())?;
        let lines: Vec<&str> = text.lines().collect();
        let words = text.split_whitespace().count();
        let chars = lines.join("\n").chars().count();
        let out = match mode {
            "lines" => lines.len().to_string(),
            "words" => words.to_string(),
            "chars" => chars.to_string(),
            _ => format!("{} {words} {chars}", lines.len()),
        };
        Ok(CommandOutput::Text(out))
    }
}

// ---------------------------------------------------------------------------
// grep
// ---------------------------------------------------------------------------

struct GrepCmd;
impl Command for GrepCmd {
    fn name(&self) -> &str {
        "grep"
    }
    fn description(&self) -> &str {
        "Search for a pattern (case-insensitive)"
    }
    fn usage(&self) -> &str {
        "grep [-n] [-v] [-c] <pattern> [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn min_args(&self) -> usize {
        1
    }
    fn role(&self) -> PipelineRole {
        PipelineRole::Filter
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut show_numbers = false;
        let mut invert = false;
        let mut count_only = false;
        let mut positional = Vec::new();

        for &arg in args {
            match arg {
                // Matching is always case-insensitive.
                "-i" => {},
                "-n" => show_numbers = true,
                "-v" => invert = true,
                "-c" => count_only = true,
                _ => positional.push(arg),
            }
        }
        let Some(&raw_pattern) = positional.first() else {
            return Err(QuestError::InvalidArgument(format!("usage: {}", self.usage())));
        };
        let pattern = raw_pattern.replace(['"', '\''], "");
        let file = positional.get(1).copied();
        let text = read_text_input(file, env, self.usage())?;
        // Searching a named file numbers its matches.
        let show_numbers = show_numbers || file.is_some();

        let needle = pattern.to_lowercase();
        let mut matches = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.to_lowercase().contains(&needle) != invert {
                if show_numbers {
                    matches.push(format!("{}:{line}", i + 1));
                } else {
                    matches.push(line.to_string());
                }
            }
        }

        if count_only {
            return Ok(CommandOutput::Text(matches.len().to_string()));
        }
        if matches.is_empty() {
            return Ok(match file {
                Some(file) => CommandOutput::Notice(format!("\"{pattern}\" not found in {file}")),
                None => CommandOutput::Text(String::new()),
            });
        }
        Ok(CommandOutput::Lines {
            lines: matches,
            highlight: (!invert && !pattern.is_empty()).then_some(pattern),
        })
    }
}

// ---------------------------------------------------------------------------
// sort
// ---------------------------------------------------------------------------

struct SortCmd;
impl Command for SortCmd {
    fn name(&self) -> &str {
        "sort"
    }
    fn description(&self) -> &str {
        "Sort lines of text"
    }
    fn usage(&self) -> &str {
        "sort [-r] [-n] [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn role(&self) -> PipelineRole {
        PipelineRole::Filter
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut reverse = false;
        let mut numeric = false;
        let mut file_arg = None;
        for &arg in args {
            match arg.strip_prefix('-') {
                Some(flags) if !flags.is_empty() => {
                    for c in flags.chars() {
                        match c {
                            'r' => reverse = true,
                            'n' => numeric = true,
                            other => {
                                return Err(QuestError::InvalidArgument(format!(
                                    "invalid option -- '{other}'"
                                )));
                            },
                        }
                    }
                },
                _ => file_arg = Some(arg),
            }
        }
        let text = read_text_input(file_arg, env, self.usage())?;
        let mut lines: Vec<&str> = text.lines().collect();

        // `sort_by` is stable, so equal keys keep their input order.
        if numeric {
            lines.sort_by(|a, b| {
                numeric_key(a)
                    .partial_cmp(&numeric_key(b))
                    .unwrap_or(Ordering::Equal)
            });
        } else {
            lines.sort();
        }
        if reverse {
            lines.reverse();
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

/// Leading number of a line; lines without one sort as zero.
fn numeric_key(line: &str) -> f64 {
    line.split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// uniq
// ---------------------------------------------------------------------------

/// Collapses duplicates across the whole input, keyed by content, and keeps
/// first-seen order.
struct UniqCmd;
impl Command for UniqCmd {
    fn name(&self) -> &str {
        "uniq"
    }
    fn description(&self) -> &str {
        "Remove duplicate lines"
    }
    fn usage(&self) -> &str {
        "uniq [-c] [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn role(&self) -> PipelineRole {
        PipelineRole::Filter
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut show_count = false;
        let mut file_arg = None;
        for &arg in args {
            match arg {
                "-c" => show_count = true,
                _ => file_arg = Some(arg),
            }
        }
        let text = read_text_input(file_arg, env, self.usage())?;

        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for line in text.lines() {
            let count = counts.entry(line).or_insert(0);
            if *count == 0 {
                order.push(line);
            }
            *count += 1;
        }

        let result: Vec<String> = order
            .into_iter()
            .map(|line| {
                if show_count {
                    format!("{:>7} {line}", counts[line])
                } else {
                    line.to_string()
                }
            })
            .collect();
        Ok(CommandOutput::Text(result.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// cut
// ---------------------------------------------------------------------------

struct CutCmd;
impl Command for CutCmd {
    fn name(&self) -> &str {
        "cut"
    }
    fn description(&self) -> &str {
        "Extract delimited fields"
    }
    fn usage(&self) -> &str {
        "cut -d<delim> -f<fields> [file]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn role(&self) -> PipelineRole {
        PipelineRole::Filter
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut delim = "\t".to_string();
        let mut fields_str = "1";
        let mut file_arg = None;
        let mut i = 0;
        while i < args.len() {
            let arg = args[i];
            if let Some(rest) = arg.strip_prefix("-d") {
                let value = if rest.is_empty() {
                    i += 1;
                    args.get(i).copied().unwrap_or("")
                } else {
                    rest
                };
                // `-d" "` reaches us as two lone quote tokens.
                if (value == "\"" || value == "'") && args.get(i + 1) == Some(&value) {
                    i += 1;
                    delim = " ".to_string();
                } else {
                    delim = value.replace(['"', '\''], "");
                }
            } else if let Some(rest) = arg.strip_prefix("-f") {
                fields_str = if rest.is_empty() {
                    i += 1;
                    args.get(i).copied().unwrap_or("")
                } else {
                    rest
                };
            } else {
                file_arg = Some(arg);
            }
            i += 1;
        }
        if delim.is_empty() {
            return Err(QuestError::InvalidArgument(
                "the delimiter must be a single character".to_string(),
            ));
        }
        let fields = parse_field_spec(fields_str)?;
        let text = read_text_input(file_arg, env, self.usage())?;

        let mut result = Vec::new();
        for line in text.lines() {
            let parts: Vec<&str> = line.split(delim.as_str()).collect();
            let selected: Vec<&str> = match fields {
                FieldSpec::Single(f) => vec![parts.get(f - 1).copied().unwrap_or("")],
                FieldSpec::List(ref list) => list
                    .iter()
                    .filter_map(|f| f.select(&parts))
                    .flatten()
                    .copied()
                    .collect(),
            };
            result.push(selected.join(&delim));
        }
        Ok(CommandOutput::Text(result.join("\n")))
    }
}

/// One element of a field list: `3`, `2-4`, `2-` or `-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldRange {
    start: usize,
    end: Option<usize>,
}

impl FieldRange {
    fn select<'p, 'a>(&self, parts: &'p [&'a str]) -> Option<&'p [&'a str]> {
        let start = self.start - 1;
        let end = self.end.map_or(parts.len(), |e| e.min(parts.len()));
        (start < end).then(|| &parts[start..end])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldSpec {
    /// A lone field; a missing one yields an empty string.
    Single(usize),
    /// Lists and ranges skip fields a line does not have.
    List(Vec<FieldRange>),
}

fn parse_field_spec(spec: &str) -> Result<FieldSpec> {
    let bad = || QuestError::InvalidArgument(format!("invalid field list: '{spec}'"));
    let index = |s: &str| -> Result<usize> {
        match s.parse::<usize>() {
            Ok(0) | Err(_) => Err(bad()),
            Ok(n) => Ok(n),
        }
    };
    if spec.is_empty() {
        return Err(bad());
    }
    if !spec.contains([',', '-']) {
        return Ok(FieldSpec::Single(index(spec)?));
    }
    let mut list = Vec::new();
    for part in spec.split(',') {
        let range = match part.split_once('-') {
            Some(("", "")) => return Err(bad()),
            Some(("", b)) => FieldRange {
                start: 1,
                end: Some(index(b)?),
            },
            Some((a, "")) => FieldRange {
                start: index(a)?,
                end: None,
            },
            Some((a, b)) => FieldRange {
                start: index(a)?,
                end: Some(index(b)?),
            },
            None => {
                let n = index(part)?;
                FieldRange {
                    start: n,
                    end: Some(n),
                }
            },
        };
        list.push(range);
    }
    Ok(FieldSpec::List(list))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse `-n N`, `-nN` or `-N` from args, returning (count, optional file).
fn parse_n_flag<'a>(args: &[&'a str], default: usize) -> Result<(usize, Option<&'a str>)> {
    let parse = |s: &str| {
        s.parse::<usize>()
            .map_err(|_| QuestError::InvalidArgument(format!("invalid number of lines: '{s}'")))
    };
    let mut n = default;
    let mut file = None;
    let mut i = 0;
    while i < args.len() {
        let arg = args[i];
        if arg == "-n" {
            i += 1;
            let value = args.get(i).copied().unwrap_or("");
            n = parse(value)?;
        } else if let Some(value) = arg.strip_prefix("-n") {
            n = parse(value)?;
        } else if let Some(value) = arg.strip_prefix('-')
            && !value.is_empty()
        {
            n = parse(value)?;
        } else {
            file = Some(arg);
        }
        i += 1;
    }
    Ok((n, file))
}

/// Read text from a file operand, else from piped input.
fn read_text_input(file: Option<&str>, env: &Environment<'_>, usage: &str) -> Result<String> {
    match (file, &env.stdin) {
        (Some(path), _) => read_operand(env, path),
        (None, Some(stdin)) => Ok(stdin.clone()),
        (None, None) => Err(QuestError::InvalidArgument(format!("usage: {usage}"))),
    }
}

/// Register text processing commands.
pub fn register_text_commands(reg: &mut crate::CommandRegistry) {
    reg.register(Box::new(HeadCmd));
    reg.register(Box::new(TailCmd));
    reg.register(Box::new(WcCmd));
    reg.register(Box::new(GrepCmd));
    reg.register(Box::new(SortCmd));
    reg.register(Box::new(UniqCmd));
    reg.register(Box::new(CutCmd));
}
