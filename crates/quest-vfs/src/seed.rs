//! Seed snapshots: the initial tree a lesson starts from.

use serde::{Deserialize, Serialize};

use quest_types::Result;

/// Kind of a seed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    #[default]
    File,
    Directory,
}

/// One node of a seed snapshot, relative to its parent directory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeedEntry {
    pub name: String,
    #[serde(default)]
    pub kind: SeedKind,
    #[serde(default)]
    pub content: Option<String>,
    /// Octal mode string such as `"600"`.
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub children: Vec<SeedEntry>,
}

impl SeedEntry {
    pub fn file(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            content: Some(content.to_string()),
            ..Self::default()
        }
    }

    pub fn directory(name: &str, children: Vec<SeedEntry>) -> Self {
        Self {
            name: name.to_string(),
            kind: SeedKind::Directory,
            children,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: &str) -> Self {
        self.mode = Some(mode.to_string());
        self
    }
}

/// Parse a JSON array of seed entries.
pub fn parse_json(json: &str) -> Result<Vec<SeedEntry>> {
    Ok(serde_json::from_str(json)?)
}
