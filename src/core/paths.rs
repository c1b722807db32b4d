// src/core/paths.rs

use crate::constants::{
    DEFAULT_INSTALL_DIRNAME, DEFAULT_MANIFEST_FILENAME, INSTALL_DIR_ENV_VAR, PROJECT_DIR_TOKEN,
};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not determine the current directory: {0}")]
    CurrentDir(#[from] std::io::Error),
    #[error("Failed to expand path template '{template}': {reason}")]
    Expansion { template: String, reason: String },
}

/// Makes a path absolute against the current directory without touching the filesystem.
pub fn absolute(path: &Path) -> Result<PathBuf, PathError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Resolves the manifest path: the explicit `--toml` value, or `pyproject.toml` in the
/// current directory.
pub fn resolve_manifest_path(explicit: Option<&Path>) -> Result<PathBuf, PathError> {
    match explicit {
        Some(path) => absolute(path),
        None => absolute(Path::new(DEFAULT_MANIFEST_FILENAME)),
    }
}

/// Resolves the install directory.
///
/// Priority: the explicit `--install-dir` value, then the `TOOLPIN_INSTALL_DIR`
/// environment variable, then `.toolpin` next to the manifest.
pub fn resolve_install_dir(
    explicit: Option<&Path>,
    manifest_path: &Path,
) -> Result<PathBuf, PathError> {
    if let Some(path) = explicit {
        return absolute(path);
    }
    if let Ok(from_env) = env::var(INSTALL_DIR_ENV_VAR)
        && !from_env.trim().is_empty()
    {
        return absolute(&expand_path_template(&from_env, None)?);
    }
    let base = manifest_path.parent().unwrap_or(Path::new("."));
    Ok(base.join(DEFAULT_INSTALL_DIRNAME))
}

/// Expands a path template string, resolving `@PROJECT_DIR`, the home directory and
/// environment variables.
///
/// # Arguments
/// * `template` - The template string (e.g., "@PROJECT_DIR/.venv" or "~/venvs/tool").
/// * `project_dir` - The directory substituted for `@PROJECT_DIR`, if known.
pub fn expand_path_template(template: &str, project_dir: Option<&str>) -> Result<PathBuf, PathError> {
    let with_project_dir = match project_dir {
        Some(dir) => template.replace(PROJECT_DIR_TOKEN, dir),
        None => template.to_string(),
    };
    // `shellexpand::full` handles both `~` and `$VAR` / `${VAR}`.
    let expanded = shellexpand::full(&with_project_dir).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Like `expand_path_template`, but an undefined variable is left in place instead of
/// failing, so one context with a bad `dir` does not break the whole manifest.
pub fn expand_path_template_lenient(template: &str, project_dir: Option<&str>) -> PathBuf {
    let with_project_dir = match project_dir {
        Some(dir) => template.replace(PROJECT_DIR_TOKEN, dir),
        None => template.to_string(),
    };
    let with_home = shellexpand::tilde(&with_project_dir);
    let expanded = shellexpand::env_with_context_no_errors(&with_home, |var| env::var(var).ok());
    if expanded.contains('$') {
        log::warn!("Unresolved variable in path '{}'", template);
    }
    PathBuf::from(expanded.into_owned())
}
