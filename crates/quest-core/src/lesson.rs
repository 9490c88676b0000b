//! Lesson configuration loaded from TOML (or JSON).

use std::path::Path;

use serde::Deserialize;

use quest_types::{QuestError, Result};
use quest_vfs::{SeedEntry, seed};

use crate::tasks::TaskRule;

/// Everything that distinguishes one lesson's shell from another.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LessonConfig {
    pub title: String,
    #[serde(default)]
    pub day: u8,
    #[serde(default = "default_home")]
    pub home: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_user")]
    pub group: String,
    #[serde(default = "default_hostname")]
    pub hostname: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Enabled commands. Empty enables every built-in.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Initial contents of the home directory.
    #[serde(default)]
    pub tree: Vec<SeedEntry>,
    #[serde(default)]
    pub tasks: Vec<TaskRule>,
}

fn default_home() -> String {
    "/home/quest".to_string()
}
fn default_user() -> String {
    "quest".to_string()
}
fn default_hostname() -> String {
    "linux".to_string()
}
fn default_page_size() -> usize {
    10
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            title: "Linux Quest".to_string(),
            day: 0,
            home: default_home(),
            user: default_user(),
            group: default_user(),
            hostname: default_hostname(),
            page_size: default_page_size(),
            commands: Vec::new(),
            tree: Vec::new(),
            tasks: Vec::new(),
        }
    }
}

impl LessonConfig {
    /// Parse and validate a TOML lesson.
    pub fn from_toml(src: &str) -> Result<Self> {
        let config: Self = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON lesson.
    pub fn from_json(src: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a lesson file; `.json` files are read as JSON, anything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .map_err(|e| QuestError::Config(format!("{}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json(&src)
        } else {
            Self::from_toml(&src)
        };
        parsed.map_err(|e| QuestError::Config(format!("{}: {e}", path.display())))
    }

    /// Replace the seed tree with a JSON array of entries.
    pub fn with_json_tree(mut self, json: &str) -> Result<Self> {
        self.tree = seed::parse_json(json)?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if !self.home.starts_with('/') {
            return Err(QuestError::Config(format!(
                "home must be an absolute path, got '{}'",
                self.home
            )));
        }
        if self.page_size == 0 {
            return Err(QuestError::Config("page_size must be at least 1".to_string()));
        }
        for (i, task) in self.tasks.iter().enumerate() {
            if self.tasks[..i].iter().any(|t| t.id == task.id) {
                return Err(QuestError::Config(format!("duplicate task id '{}'", task.id)));
            }
        }
        Ok(())
    }
}
