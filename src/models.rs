// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// --- `pyproject.toml` MODELS (What is read from the [tool.toolpin] section) ---

/// The requirements of a tool context as written by the user.
///
/// All three shapes are accepted:
///
/// ```toml
/// [tool.toolpin]
/// inline = "black\nisort"
/// list = ["black", "isort"]
/// table = { requirements = ["black"], post-install = "black --version", dir = "@PROJECT_DIR/venv" }
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequirementsValue {
    Inline(String),
    List(Vec<String>),
    Table(RequirementsTable),
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementsTable {
    #[serde(default)]
    pub requirements: Option<RequirementLines>,
    #[serde(rename = "post-install", default)]
    pub post_install: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
}

/// The `requirements` key of a table-form context, which is itself inline or a list.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum RequirementLines {
    Inline(String),
    List(Vec<String>),
}

impl RequirementLines {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Inline(text) => split_lines(&text),
            Self::List(list) => list,
        }
    }
}

/// Splits a multi-line requirements string into one requirement per non-blank line.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// --- NORMALIZED MODELS (What the rest of the application works with) ---

/// The canonical form of a context's dependency specification.
///
/// `requirements` is always sorted so that fingerprints and environment paths do not
/// depend on the order used in the manifest.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSet {
    pub requirements: Vec<String>,
    pub post_install: Option<String>,
    pub dir: Option<String>,
}

impl RequirementSet {
    pub fn new(mut requirements: Vec<String>, post_install: Option<String>, dir: Option<String>) -> Self {
        requirements.sort();
        Self {
            requirements,
            post_install,
            dir,
        }
    }
}

impl From<RequirementsValue> for RequirementSet {
    fn from(value: RequirementsValue) -> Self {
        match value {
            RequirementsValue::Inline(text) => Self::new(split_lines(&text), None, None),
            RequirementsValue::List(list) => Self::new(list, None, None),
            RequirementsValue::Table(table) => Self::new(
                table
                    .requirements
                    .map(RequirementLines::into_vec)
                    .unwrap_or_default(),
                table.post_install.filter(|s| !s.trim().is_empty()),
                table.dir.filter(|s| !s.trim().is_empty()),
            ),
        }
    }
}

/// A single, fully resolved command of an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasCommand {
    /// The command text, without any `ctx:` prefix.
    pub cmd: String,
    /// The working directory, with `@PROJECT_DIR` already substituted.
    pub cwd: String,
    /// A shell that runs the command as `<shell> -c <cmd>`. `None` means the host shell.
    pub shell: Option<String>,
    pub env: BTreeMap<String, String>,
    /// The tool context the command runs in. `None` means the host environment.
    pub ctx: Option<String>,
}

// --- `tp.lock` MODELS ---

/// One locked context inside `tp.lock`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LockEntry {
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(rename = "post-install", default, skip_serializing_if = "Option::is_none")]
    pub post_install: Option<String>,
}

/// The whole lock cache. Entries are keyed by context name.
pub type LockFile = BTreeMap<String, LockEntry>;
