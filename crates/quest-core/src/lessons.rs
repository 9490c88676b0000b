//! The seven built-in lessons.
//!
//! Each lesson is an embedded TOML file, so the binary works without any
//! files on disk.

use std::path::Path;

use quest_types::{QuestError, Result};

use crate::lesson::LessonConfig;

const DAYS: [&str; 7] = [
    include_str!("../lessons/day1.toml"),
    include_str!("../lessons/day2.toml"),
    include_str!("../lessons/day3.toml"),
    include_str!("../lessons/day4.toml"),
    include_str!("../lessons/day5.toml"),
    include_str!("../lessons/day6.toml"),
    include_str!("../lessons/day7.toml"),
];

/// Number of built-in lessons.
pub const LESSON_COUNT: u8 = DAYS.len() as u8;

/// Load built-in lesson `day` (1-based).
pub fn builtin(day: u8) -> Result<LessonConfig> {
    let src = day
        .checked_sub(1)
        .and_then(|i| DAYS.get(usize::from(i)))
        .ok_or_else(|| {
            QuestError::Config(format!("no built-in lesson for day {day} (1-{LESSON_COUNT})"))
        })?;
    LessonConfig::from_toml(src)
        .map_err(|e| QuestError::Config(format!("built-in lesson day{day}: {e}")))
}

/// Resolve a lesson by day or path.
///
/// Resolution order:
/// 1. A day number (`"3"`) or name (`"day3"`)
/// 2. A path to a TOML or JSON lesson file
pub fn resolve_lesson(name_or_path: &str) -> Result<LessonConfig> {
    let trimmed = name_or_path.trim();
    let day = trimmed
        .strip_prefix("day")
        .unwrap_or(trimmed)
        .parse::<u8>()
        .ok();
    if let Some(day) = day {
        return builtin(day);
    }
    let path = Path::new(trimmed);
    if path.is_file() {
        return LessonConfig::from_file(path);
    }
    Err(QuestError::Config(format!(
        "unknown lesson '{name_or_path}': expected a day (1-{LESSON_COUNT}) or a lesson file"
    )))
}
