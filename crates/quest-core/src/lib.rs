//! Linux Quest session layer.
//!
//! A [`VirtualShell`] owns one learner's file tree and shell state for a
//! lesson. Lessons are [`LessonConfig`] values, either built in (one per
//! day) or loaded from TOML/JSON. Every executed line is reported to task
//! trackers as a [`CommandEvent`].

pub mod lesson;
pub mod lessons;
pub mod shell;
pub mod tasks;

pub use lesson::LessonConfig;
pub use lessons::{LESSON_COUNT, builtin, resolve_lesson};
pub use shell::VirtualShell;
pub use tasks::{
    CommandEvent, CompletedTasks, FileRule, ModeKind, RedirectEvent, RedirectRule, TaskBoard,
    TaskRule, TaskTracker,
};

// Re-export the lower layers so front-ends need only this crate.
pub use quest_terminal as terminal;
pub use quest_types as types;
pub use quest_vfs as vfs;
