// src/core/config.rs

//! # Config
//!
//! Loads the `[tool.toolpin]` section of the project manifest once per invocation and
//! answers every question about it: which tool contexts exist and what they require, what
//! an alias expands to, which scripts are available and which names an abbreviation matches.
//!
//! Reserved keys (`aliases`, `env`, `cwd`, `shell`, `scripts_dir`, `scripts_ctx`,
//! `prerelease`, `lock-python-version`, `os`) are taken out of the section first; every
//! remaining key is a tool context. `venvs` is not a valid context name, since the
//! install directory already uses it.

use crate::constants::{
    DEFAULT_SCRIPTS_DIR, DEFAULT_TOOLS, LOCK_FILENAME, MAIN_CONTEXT, PROJECT_DIR_TOKEN,
    TOOL_SECTION, VENVS_DIRNAME,
};
use crate::core::abbrev;
use crate::core::paths::{self, PathError};
use crate::models::{AliasCommand, RequirementSet, RequirementsValue};
use colored::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml::{Table, Value};

lazy_static! {
    /// `ctx: command` or `@ctx: command` at the start of an alias command.
    static ref CTX_PREFIX_RE: Regex = Regex::new(r"^@?([\w-]+)\s*:\s*").unwrap();
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Invalid tool context '{name}': {reason}")]
    InvalidContext { name: String, reason: String },
    #[error("Invalid alias {alias}: {reason}")]
    InvalidAlias { alias: String, reason: String },
    #[error("Invalid ctx: '{0}' is not defined in [tool.{section}]", section = TOOL_SECTION)]
    UnknownContext(String),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// What a name refers to, as reported by `--info`.
#[derive(Debug, Clone, PartialEq)]
pub enum Description {
    Alias {
        name: String,
        commands: Vec<AliasCommand>,
    },
    Script {
        name: String,
        path: PathBuf,
    },
    Context {
        name: String,
        requirements: RequirementSet,
    },
    /// The name (if any) is not configured; lists everything that is.
    Overview {
        name: Option<String>,
        has_main: bool,
        aliases: Vec<String>,
        scripts: Vec<String>,
        contexts: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    manifest_path: PathBuf,
    project_dir: String,
    contexts: BTreeMap<String, RequirementSet>,
    aliases: BTreeMap<String, Value>,
    env: BTreeMap<String, String>,
    cwd: String,
    shell: Option<String>,
    scripts_dir: PathBuf,
    scripts_ctx: Option<String>,
    prerelease: Option<String>,
    lock_python_version: Option<String>,
}

/// The platform name matched against the keys of `[tool.toolpin.os]`.
pub fn platform_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

impl Config {
    /// Loads the configuration from the manifest at `manifest_path` for the running platform.
    ///
    /// A missing manifest is reported on stderr and treated as empty.
    pub fn load(manifest_path: &Path) -> Result<Self, ConfigError> {
        Self::load_for_platform(manifest_path, platform_name())
    }

    pub fn load_for_platform(manifest_path: &Path, platform: &str) -> Result<Self, ConfigError> {
        let manifest_path = paths::absolute(manifest_path)?;
        let text = match fs::read_to_string(&manifest_path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                eprintln!(
                    "{} {}",
                    manifest_path.display().to_string().cyan(),
                    "does not exist".blue()
                );
                String::new()
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: manifest_path,
                    source: e,
                });
            }
        };
        Self::parse(&text, &manifest_path, platform)
    }

    /// Builds the configuration from manifest text. `manifest_path` must be absolute.
    pub fn parse(text: &str, manifest_path: &Path, platform: &str) -> Result<Self, ConfigError> {
        let document: Table = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: manifest_path.to_path_buf(),
            source: e,
        })?;
        let mut section = match document.get("tool").and_then(|tool| tool.get(TOOL_SECTION)) {
            Some(Value::Table(section)) => section.clone(),
            Some(_) => {
                return Err(ConfigError::Invalid(format!(
                    "[tool.{}] must be a table",
                    TOOL_SECTION
                )));
            }
            None => Table::new(),
        };

        let project_path = manifest_path.parent().unwrap_or(Path::new("."));
        let project_dir = project_path.display().to_string();

        let mut aliases = match section.remove("aliases") {
            None => BTreeMap::new(),
            Some(Value::Table(table)) => table.into_iter().collect(),
            Some(_) => return Err(invalid("'aliases' must be a dictionary")),
        };
        let env = match section.remove("env") {
            None => BTreeMap::new(),
            Some(Value::Table(table)) => string_map(table)
                .ok_or_else(|| invalid("'env' values must be strings, numbers or booleans"))?,
            Some(_) => return Err(invalid("'env' must be a dictionary")),
        };
        let cwd = optional_string(&mut section, "cwd")?.unwrap_or_else(|| project_dir.clone());
        let mut shell = optional_string(&mut section, "shell")?;
        let scripts_dir = optional_string(&mut section, "scripts_dir")?
            .unwrap_or_else(|| DEFAULT_SCRIPTS_DIR.to_string());
        let scripts_ctx = optional_string(&mut section, "scripts_ctx")
            .map_err(|_| invalid("'scripts_ctx' must be the name of a tool context"))?;
        let prerelease = optional_string(&mut section, "prerelease")?;
        let lock_python_version = optional_string(&mut section, "lock-python-version")?;

        if let Some(Value::Table(os_overrides)) = section.remove("os") {
            for (os_key, overrides) in os_overrides {
                let Value::Table(mut overrides) = overrides else {
                    continue;
                };
                if !platform.starts_with(os_key.as_str()) {
                    continue;
                }
                log::debug!("Applying configuration overrides for platform '{}'", os_key);
                if let Some(os_shell) = optional_string(&mut overrides, "shell")? {
                    shell = Some(os_shell);
                }
                if let Some(Value::Table(os_aliases)) = overrides.remove("aliases") {
                    aliases.extend(os_aliases);
                }
            }
        }

        let mut contexts = BTreeMap::new();
        for (name, value) in section {
            if name.eq_ignore_ascii_case(VENVS_DIRNAME) {
                return Err(ConfigError::InvalidContext {
                    name,
                    reason: "the name is reserved for the environments directory".to_string(),
                });
            }
            let parsed: RequirementsValue =
                value
                    .try_into()
                    .map_err(|e: toml::de::Error| ConfigError::InvalidContext {
                        name: name.clone(),
                        reason: e.message().to_string(),
                    })?;
            let mut set = RequirementSet::from(parsed);
            if let Some(dir) = set.dir.take() {
                let expanded = paths::expand_path_template_lenient(&dir, Some(project_dir.as_str()));
                set.dir = Some(project_path.join(expanded).display().to_string());
            }
            contexts.insert(name, set);
        }

        let scripts_ctx = match scripts_ctx {
            Some(ctx) if !contexts.contains_key(&ctx) => {
                return Err(invalid("'scripts_ctx' must be the name of a tool context"));
            }
            Some(ctx) => Some(ctx),
            None if contexts.contains_key(MAIN_CONTEXT) => Some(MAIN_CONTEXT.to_string()),
            None => None,
        };

        if contexts.is_empty() {
            eprintln!(
                "{} {} {} {}",
                "No configuration found, providing".blue(),
                MAIN_CONTEXT.cyan(),
                "context with default tools:".blue(),
                format!("{:?}", DEFAULT_TOOLS).cyan()
            );
            contexts.insert(
                MAIN_CONTEXT.to_string(),
                RequirementSet::new(
                    DEFAULT_TOOLS.iter().map(|t| t.to_string()).collect(),
                    None,
                    None,
                ),
            );
        }

        Ok(Self {
            manifest_path: manifest_path.to_path_buf(),
            scripts_dir: project_path.join(scripts_dir),
            project_dir,
            contexts,
            aliases,
            env,
            cwd,
            shell,
            scripts_ctx,
            prerelease,
            lock_python_version,
        })
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// The lock cache, next to the manifest.
    pub fn lock_path(&self) -> PathBuf {
        Path::new(&self.project_dir).join(LOCK_FILENAME)
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn prerelease(&self) -> Option<&str> {
        self.prerelease.as_deref()
    }

    pub fn lock_python_version(&self) -> Option<&str> {
        self.lock_python_version.as_deref()
    }

    pub fn scripts_ctx(&self) -> Option<&str> {
        self.scripts_ctx.as_deref()
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    pub fn is_ctx(&self, name: &str) -> bool {
        self.contexts.contains_key(name)
    }

    pub fn context_names(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }

    /// The normalized requirements of a context. Unknown names yield an empty set.
    pub fn get_requirements(&self, name: &str) -> RequirementSet {
        self.contexts.get(name).cloned().unwrap_or_default()
    }

    /// Returns `ctx` if it is a declared context, otherwise `main` if that is declared.
    pub fn get_ctx_or_main(&self, ctx: Option<&str>) -> Option<String> {
        match ctx {
            Some(ctx) if self.is_ctx(ctx) => Some(ctx.to_string()),
            _ if self.is_ctx(MAIN_CONTEXT) => Some(MAIN_CONTEXT.to_string()),
            _ => None,
        }
    }

    /// The working directory for commands: `cwd` if given, else the global `cwd`, with
    /// `@PROJECT_DIR` substituted.
    pub fn get_cwd(&self, cwd: Option<&str>) -> String {
        cwd.unwrap_or(&self.cwd)
            .replace(PROJECT_DIR_TOKEN, &self.project_dir)
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.get(name).is_some_and(|value| !is_empty_value(value))
    }

    pub fn alias_names(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }

    /// Expands an alias into the commands it runs, in order. Unknown names yield no commands.
    pub fn get_alias(&self, name: &str) -> Result<Vec<AliasCommand>, ConfigError> {
        let Some(alias) = self.aliases.get(name).filter(|v| !is_empty_value(v)) else {
            return Ok(Vec::new());
        };
        let alias_error = |reason: &str| ConfigError::InvalidAlias {
            alias: name.to_string(),
            reason: reason.to_string(),
        };

        let mut ctx = None;
        let mut env = BTreeMap::new();
        let mut cwd = None;
        let mut shell = self.shell.clone();
        let cmd_value = match alias {
            Value::Table(table) => {
                if let Some(value) = table.get("ctx") {
                    ctx = Some(
                        value
                            .as_str()
                            .ok_or_else(|| alias_error("'ctx' must be a string"))?
                            .to_string(),
                    );
                }
                if let Some(value) = table.get("env") {
                    env = value
                        .as_table()
                        .and_then(|t| string_map(t.clone()))
                        .ok_or_else(|| alias_error("'env' must be a dictionary"))?;
                }
                if let Some(value) = table.get("cwd") {
                    cwd = Some(
                        value
                            .as_str()
                            .ok_or_else(|| alias_error("'cwd' must be a string"))?
                            .to_string(),
                    );
                }
                if let Some(value) = table.get("shell") {
                    shell = Some(
                        value
                            .as_str()
                            .ok_or_else(|| alias_error("'shell' must be a string"))?
                            .to_string(),
                    );
                }
                table.get("cmd")
            }
            other => Some(other),
        };

        let commands: Vec<&str> = match cmd_value {
            None => Vec::new(),
            Some(Value::String(cmd)) => vec![cmd.as_str()],
            Some(Value::Array(cmds)) => cmds
                .iter()
                .map(|c| c.as_str().ok_or_else(|| alias_error("commands must be strings")))
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(alias_error("'cmd' must be a string or a list of strings")),
        };

        let cwd = self.get_cwd(cwd.as_deref());
        commands
            .into_iter()
            .map(|cmd| -> Result<AliasCommand, ConfigError> {
                let (ctx, cmd) = self.bind_context(name, cmd, ctx.as_deref())?;
                Ok(AliasCommand {
                    cmd,
                    cwd: cwd.clone(),
                    shell: shell.clone(),
                    env: env.clone(),
                    ctx,
                })
            })
            .collect()
    }

    /// Decides the context of one alias command: an explicit `ctx:` prefix, then the
    /// alias' `ctx` field, then a first word naming a context, then `main`.
    fn bind_context(
        &self,
        alias: &str,
        cmd: &str,
        explicit: Option<&str>,
    ) -> Result<(Option<String>, String), ConfigError> {
        let prefix = CTX_PREFIX_RE
            .captures(cmd)
            .and_then(|caps| Some((caps.get(1)?.as_str(), caps.get(0)?.end())));
        let (ctx, cmd) = if let Some((name, end)) = prefix {
            let rest = cmd.get(end..).unwrap_or_default();
            (Some(name.to_string()), rest.to_string())
        } else if let Some(explicit) = explicit {
            (Some(explicit.to_string()), cmd.to_string())
        } else {
            let first_word = cmd.split_whitespace().next().filter(|w| self.is_ctx(w));
            let ctx = match first_word {
                Some(word) => Some(word.to_string()),
                None => self.get_ctx_or_main(None),
            };
            (ctx, cmd.to_string())
        };

        if let Some(ctx) = &ctx
            && !self.is_ctx(ctx)
        {
            return Err(ConfigError::InvalidAlias {
                alias: alias.to_string(),
                reason: format!("'{}' is not defined in [tool.{}]", ctx, TOOL_SECTION),
            });
        }
        Ok((ctx, cmd))
    }

    pub fn get_script_path(&self, name: &str) -> PathBuf {
        self.scripts_dir.join(format!("{}.py", name))
    }

    pub fn is_script(&self, name: &str) -> bool {
        self.get_script_path(name).is_file()
    }

    /// The names (without `.py`) of the scripts in the scripts directory, sorted.
    pub fn scripts(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.scripts_dir) else {
            return Vec::new();
        };
        let mut scripts: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "py"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        scripts.sort();
        scripts
    }

    /// Finds the aliases and scripts an abbreviation refers to.
    pub fn find_aliases_or_scripts(&self, abbrev: &str) -> Vec<String> {
        let scripts = self.scripts();
        let names = self
            .aliases
            .keys()
            .map(String::as_str)
            .chain(scripts.iter().map(String::as_str));
        abbrev::find_matches(abbrev, names)
    }

    /// Describes what `name` refers to, or everything that is available.
    pub fn describe(&self, name: Option<&str>) -> Result<Description, ConfigError> {
        if let Some(name) = name {
            let commands = self.get_alias(name)?;
            if !commands.is_empty() {
                return Ok(Description::Alias {
                    name: name.to_string(),
                    commands,
                });
            }
            if self.is_script(name) {
                return Ok(Description::Script {
                    name: name.to_string(),
                    path: self.get_script_path(name),
                });
            }
            if self.is_ctx(name) {
                return Ok(Description::Context {
                    name: name.to_string(),
                    requirements: self.get_requirements(name),
                });
            }
        }
        Ok(Description::Overview {
            name: name.map(str::to_string),
            has_main: self.is_ctx(MAIN_CONTEXT),
            aliases: self.alias_names().map(str::to_string).collect(),
            scripts: self.scripts(),
            contexts: self.context_names().map(str::to_string).collect(),
        })
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid(reason.to_string())
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Table(t) => t.is_empty(),
        _ => false,
    }
}

/// Removes `key` from `table`, requiring a string if it is present.
fn optional_string(table: &mut Table, key: &str) -> Result<Option<String>, ConfigError> {
    match table.remove(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ConfigError::Invalid(format!("'{}' must be a string", key))),
    }
}

/// Converts a table of string-like values into strings.
fn string_map(table: Table) -> Option<BTreeMap<String, String>> {
    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Integer(i) => i.to_string(),
                Value::Float(f) => f.to_string(),
                Value::Boolean(b) => b.to_string(),
                _ => return None,
            };
            Some((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = if cfg!(windows) { "C:\\project" } else { "/project" };

    fn manifest() -> PathBuf {
        Path::new(PROJECT).join("pyproject.toml")
    }

    fn parse(text: &str) -> Config {
        Config::parse(text, &manifest(), "linux").unwrap()
    }

    const TOML: &str = r#"
[tool.toolpin]
main = ["uv", "ruff"]
tool-1 = ["req2", "req1"]
tool-2 = "black\nisort\n"
tool-3 = { requirements = ["pkg"], post-install = "pkg --init", dir = "@PROJECT_DIR/venv" }
env = { GLOBAL = "1", NUM = 3 }
shell = "bash"

[tool.toolpin.aliases]
alias-1 = "tool-1 arg"
alias-2 = "tool-2: black ."
alias-3 = "@tool-3 : pkg run"
alias-4 = { cmd = "run-it", ctx = "tool-2", env = { LOCAL = "x" }, cwd = "@PROJECT_DIR/sub" }
alias-5 = ["echo one", "tool-1 two"]
alias-6 = "echo host"
empty = ""

[tool.toolpin.os.win]
shell = "pwsh"
[tool.toolpin.os.linux.aliases]
alias-6 = "echo linux"
"#;

    #[test]
    fn test_contexts_are_normalized() {
        let config = parse(TOML);
        assert!(config.is_ctx("tool-1"));
        assert!(!config.is_ctx("aliases"));
        assert!(!config.is_ctx("env"));
        assert_eq!(config.get_requirements("tool-1").requirements, vec!["req1", "req2"]);
        assert_eq!(config.get_requirements("tool-2").requirements, vec!["black", "isort"]);

        let tool_3 = config.get_requirements("tool-3");
        assert_eq!(tool_3.post_install.as_deref(), Some("pkg --init"));
        assert_eq!(
            tool_3.dir.as_deref(),
            Some(Path::new(PROJECT).join("venv").display().to_string().as_str())
        );
        assert_eq!(config.get_requirements("unknown"), RequirementSet::default());
    }

    #[test]
    fn test_context_binding_rules() {
        let config = parse(TOML);
        let first_word = &config.get_alias("alias-1").unwrap()[0];
        assert_eq!(first_word.ctx.as_deref(), Some("tool-1"));
        assert_eq!(first_word.cmd, "tool-1 arg");
        assert_eq!(first_word.cwd, PROJECT);
        assert_eq!(first_word.shell.as_deref(), Some("bash"));

        let prefixed = &config.get_alias("alias-2").unwrap()[0];
        assert_eq!(prefixed.ctx.as_deref(), Some("tool-2"));
        assert_eq!(prefixed.cmd, "black .");

        let at_prefixed = &config.get_alias("alias-3").unwrap()[0];
        assert_eq!(at_prefixed.ctx.as_deref(), Some("tool-3"));
        assert_eq!(at_prefixed.cmd, "pkg run");

        let explicit = &config.get_alias("alias-4").unwrap()[0];
        assert_eq!(explicit.ctx.as_deref(), Some("tool-2"));
        assert_eq!(explicit.env.get("LOCAL").map(String::as_str), Some("x"));
        assert_eq!(explicit.cwd, format!("{}/sub", PROJECT));

        let multi = config.get_alias("alias-5").unwrap();
        assert_eq!(multi.len(), 2);
        assert_eq!(multi[0].ctx.as_deref(), Some("main"));
        assert_eq!(multi[1].ctx.as_deref(), Some("tool-1"));

        assert!(config.get_alias("empty").unwrap().is_empty());
        assert!(!config.is_alias("empty"));
        assert!(config.get_alias("nope").unwrap().is_empty());
    }

    #[test]
    fn test_unbound_alias_without_main_context() {
        let config = parse(
            r#"
[tool.toolpin]
tool = "pkg"
aliases = { hello = "echo hello" }
"#,
        );
        assert_eq!(config.get_alias("hello").unwrap()[0].ctx, None);
        assert_eq!(config.scripts_ctx(), None);
    }

    #[test]
    fn test_alias_bound_to_undeclared_context_is_an_error() {
        let config = parse(
            r#"
[tool.toolpin]
tool = "pkg"
aliases = { a = "missing: run", b = { cmd = "run", ctx = "missing" }, c = { cmd = "x", env = "no" } }
"#,
        );
        assert!(matches!(config.get_alias("a"), Err(ConfigError::InvalidAlias { .. })));
        assert!(matches!(config.get_alias("b"), Err(ConfigError::InvalidAlias { .. })));
        assert!(matches!(config.get_alias("c"), Err(ConfigError::InvalidAlias { .. })));
    }

    #[test]
    fn test_os_overrides_merge_for_matching_platform() {
        let linux = Config::parse(TOML, &manifest(), "linux").unwrap();
        assert_eq!(linux.get_alias("alias-6").unwrap()[0].cmd, "echo linux");
        assert_eq!(linux.get_alias("alias-6").unwrap()[0].shell.as_deref(), Some("bash"));

        let windows = Config::parse(TOML, &manifest(), "win32").unwrap();
        assert_eq!(windows.get_alias("alias-6").unwrap()[0].cmd, "echo host");
        assert_eq!(windows.get_alias("alias-6").unwrap()[0].shell.as_deref(), Some("pwsh"));
    }

    #[test]
    fn test_global_values() {
        let config = parse(TOML);
        assert_eq!(config.env().get("NUM").map(String::as_str), Some("3"));
        assert_eq!(config.scripts_ctx(), Some("main"));
        assert_eq!(config.lock_path(), Path::new(PROJECT).join("tp.lock"));
        assert_eq!(config.get_ctx_or_main(Some("tool-1")).as_deref(), Some("tool-1"));
        assert_eq!(config.get_ctx_or_main(Some("ls")).as_deref(), Some("main"));
    }

    #[test]
    fn test_invalid_global_values_are_rejected() {
        let cases = [
            "[tool.toolpin]\nenv = \"x\"",
            "[tool.toolpin]\ncwd = 1",
            "[tool.toolpin]\nshell = []",
            "[tool.toolpin]\nscripts_dir = false",
            "[tool.toolpin]\ntool = \"x\"\nscripts_ctx = \"missing\"",
            "[tool.toolpin]\ntool = 42",
        ];
        for case in cases {
            assert!(
                Config::parse(case, &manifest(), "linux").is_err(),
                "expected error for {:?}",
                case
            );
        }
        assert!(matches!(
            Config::parse("[tool", &manifest(), "linux"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_unknown_context_message_names_the_section() {
        assert_eq!(
            ConfigError::UnknownContext("lint".to_string()).to_string(),
            "Invalid ctx: 'lint' is not defined in [tool.toolpin]"
        );
    }

    #[test]
    fn test_python_is_an_ordinary_context_name() {
        let config = parse("[tool.toolpin]\npython = [\"ipython\"]\nrepl = \"ptpython\"\n");
        assert!(config.is_ctx("python"));
        assert_eq!(config.get_requirements("python").requirements, vec!["ipython"]);

        let config = parse("[tool.toolpin]\npython = \"ipython\"\n");
        assert_eq!(config.get_requirements("python").requirements, vec!["ipython"]);
    }

    #[test]
    fn test_venvs_is_a_reserved_context_name() {
        for name in ["venvs", "Venvs"] {
            let text = format!("[tool.toolpin]\n{} = [\"pkg\"]\n", name);
            assert!(matches!(
                Config::parse(&text, &manifest(), "linux"),
                Err(ConfigError::InvalidContext { .. })
            ));
        }
    }

    #[test]
    fn test_unresolved_variable_in_dir_does_not_break_other_contexts() {
        let config = parse(
            "[tool.toolpin]\nmain = \"uv\"\nother = { requirements = [\"pkg\"], dir = \"$TOOLPIN_SURELY_UNDEFINED_VAR/venv\" }\n",
        );
        assert_eq!(config.get_requirements("main").requirements, vec!["uv"]);
        let dir = config.get_requirements("other").dir.unwrap_or_default();
        assert!(dir.contains("$TOOLPIN_SURELY_UNDEFINED_VAR"));
    }

    #[test]
    fn test_empty_config_provides_main_with_default_tools() {
        let config = parse("[project]\nname = \"x\"");
        assert_eq!(config.context_names().collect::<Vec<_>>(), vec!["main"]);
        assert_eq!(config.get_requirements("main").requirements, vec!["uv"]);
    }

    #[test]
    fn test_missing_manifest_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("pyproject.toml")).unwrap();
        assert!(config.is_ctx("main"));
    }

    #[test]
    fn test_find_aliases_or_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("pyproject.toml");
        fs::write(
            &manifest,
            r#"
[tool.toolpin]
main = "pycowsay"
[tool.toolpin.aliases]
pycowsay-hi = "pycowsay hi"
pycowsay-hello = "pycowsay hello"
"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("bin")).unwrap();
        fs::write(dir.path().join("bin").join("pycowsay.py"), "print('moo')").unwrap();
        fs::write(dir.path().join("bin").join("notes.txt"), "").unwrap();

        let config = Config::load(&manifest).unwrap();
        assert_eq!(config.scripts(), vec!["pycowsay"]);
        assert!(config.is_script("pycowsay"));
        assert_eq!(config.find_aliases_or_scripts("pHe"), vec!["pycowsay-hello"]);
        assert_eq!(
            config.find_aliases_or_scripts("pycow"),
            vec!["pycowsay", "pycowsay-hello", "pycowsay-hi"]
        );
        assert_eq!(config.find_aliases_or_scripts("pycowsay"), vec!["pycowsay"]);
        assert!(config.find_aliases_or_scripts("zzz").is_empty());
    }

    #[test]
    fn test_describe() {
        let config = parse(TOML);
        assert!(matches!(config.describe(Some("alias-1")).unwrap(), Description::Alias { .. }));
        assert!(matches!(config.describe(Some("tool-2")).unwrap(), Description::Context { .. }));
        assert!(matches!(
            config.describe(Some("nothing")).unwrap(),
            Description::Overview { has_main: true, ref contexts, .. }
                if contexts == &["main", "tool-1", "tool-2", "tool-3"]
        ));
    }
}
