//! A line-by-line walker for the shell scripts in the scripting lesson.
//!
//! This is not an interpreter. It prints what `echo` lines would print,
//! records simple assignments, and acknowledges control flow and function
//! calls with a placeholder instead of branching or looping.

use log::debug;

use crate::interpreter::Environment;

const KEYWORDS: &[&str] = &[
    "if", "then", "else", "elif", "fi", "for", "while", "until", "do", "done", "case", "esac",
    "function", "return", "exit", "local", "in",
];

/// Value `read` assigns, since there is nobody to type one.
pub const DEMO_INPUT: &str = "demo input";

/// Walk `source` and return the lines it prints, framed by start and finish
/// markers. Variables assigned by the script persist in `env.variables`.
pub fn run_script(name: &str, source: &str, env: &mut Environment<'_>) -> Vec<String> {
    let mut out = vec![format!("--- running {name} ---")];
    for raw in source.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(printed) = walk_line(line, env) {
            out.push(printed);
        }
    }
    out.push(format!("--- {name} finished ---"));
    out
}

fn walk_line(line: &str, env: &mut Environment<'_>) -> Option<String> {
    if let Some((lhs, rhs)) = assignment(line) {
        env.variables
            .insert(lhs.to_string(), rhs.replace('"', ""));
        return None;
    }

    let words: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|w| !w.is_empty())
        .collect();
    let has = |w: &str| words.contains(&w);

    let conditional = (has("if") || has("elif")) && has("then");
    let looping = (has("for") || has("while") || has("until")) && has("do");

    match words.first().copied() {
        Some("echo") => {
            let text = line.strip_prefix("echo").unwrap_or_default().trim();
            Some(expand(&text.replace('"', ""), env))
        },
        Some("read") => {
            if let Some(var) = words.get(1) {
                env.variables.insert(var.to_string(), DEMO_INPUT.to_string());
            }
            Some(format!("[user input: {DEMO_INPUT}]"))
        },
        _ if conditional => Some("[conditional executed]".to_string()),
        _ if looping => Some("[loop executed]".to_string()),
        Some(first) if is_function_call(first, &words) => Some("[function executed]".to_string()),
        _ => {
            debug!("script line skipped: {line}");
            None
        },
    }
}

/// `name=value` with an identifier on the left and no `$` or `;` anywhere.
fn assignment(line: &str) -> Option<(&str, &str)> {
    if line.contains(['$', ';']) {
        return None;
    }
    let (lhs, rhs) = line.split_once('=')?;
    is_identifier(lhs).then_some((lhs, rhs))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A bare `name`, or a definition line `name()` / `name() {`.
fn is_function_call(first: &str, words: &[&str]) -> bool {
    let name = first.strip_suffix("()").unwrap_or(first);
    let rest_ok = match words {
        [_] => true,
        [_, "{"] => first.ends_with("()"),
        _ => false,
    };
    rest_ok && is_identifier(name) && !KEYWORDS.contains(&name)
}

/// Replace `$(date)`, `$(pwd)`, `${NAME}` and `$NAME`.
fn expand(text: &str, env: &Environment<'_>) -> String {
    let text = text
        .replace(
            "$(date)",
            &env.now.format("%a %b %e %H:%M:%S UTC %Y").to_string(),
        )
        .replace("$(pwd)", &env.cwd);

    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (name, consumed) = match after.strip_prefix('{').and_then(|s| s.split_once('}')) {
            Some((name, _)) => (name, name.len() + 2),
            None => {
                let len = after
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (&after[..len], len)
            },
        };
        if name.is_empty() {
            out.push('$');
        } else {
            out.push_str(&lookup(name, env));
        }
        rest = &after[consumed..];
    }
    out.push_str(rest);
    out
}

/// Script variables first, then the session's USER, HOME and PWD.
fn lookup(name: &str, env: &Environment<'_>) -> String {
    if let Some(value) = env.variables.get(name) {
        return value.clone();
    }
    match name {
        "USER" => env.user.clone(),
        "HOME" => env.home.clone(),
        "PWD" => env.cwd.clone(),
        _ => String::new(),
    }
}
