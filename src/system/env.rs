// src/system/env.rs

//! Isolated environments, one per tool context and requirement fingerprint.

use crate::constants::{ENV_PROMPT_PREFIX, VENVS_DIRNAME};
use crate::core::hash::fingerprint;
use crate::models::RequirementSet;
use crate::system::executor::{self, CommandLine, ExecutionError, Invocation};
use crate::system::installer::{InstallRequest, PackageInstaller};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref ENV_VAR_RE: Regex = Regex::new(r"\$\{([A-Z0-9_]+)\}").unwrap();
    static ref FILE_REQUIREMENT_RE: Regex = Regex::new(r"^-r\s+(.+)$").unwrap();
}

#[cfg(windows)]
const SCRIPTS_DIRNAME: &str = "Scripts";
#[cfg(not(windows))]
const SCRIPTS_DIRNAME: &str = "bin";

#[cfg(windows)]
const PYTHON_EXE: &str = "python.exe";
#[cfg(not(windows))]
const PYTHON_EXE: &str = "python3";

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Failed to install tool context '{name}' (exit code {code})")]
    Installation {
        name: String,
        code: i32,
        #[source]
        source: ExecutionError,
    },
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EnvError {
    pub fn installation(name: &str, source: ExecutionError) -> Self {
        Self::Installation {
            name: name.to_string(),
            code: source.exit_code().unwrap_or(1),
            source,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The location and installation state of the environment of one tool context.
#[derive(Debug, Clone)]
pub struct IsolatedEnv {
    name: String,
    path: PathBuf,
    requirements: Vec<String>,
    prerelease: Option<String>,
}

impl IsolatedEnv {
    /// Describes the environment of context `name` holding `set`.
    ///
    /// The path is the `dir` override of the set when there is one, otherwise
    /// `<venvs_dir>/<name>-<fingerprint>-py<python_version>` with the name lower-cased.
    pub fn new(
        venvs_dir: &Path,
        name: &str,
        set: &RequirementSet,
        python_version: &str,
        prerelease: Option<&str>,
    ) -> Self {
        let path = match &set.dir {
            Some(dir) => PathBuf::from(dir),
            None => venvs_dir.join(format!(
                "{}-{}-py{}",
                name.to_lowercase(),
                fingerprint(set),
                python_version
            )),
        };
        Self {
            name: name.to_string(),
            path,
            requirements: set.requirements.clone(),
            prerelease: prerelease.map(str::to_string),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scripts_path(&self) -> PathBuf {
        self.path.join(SCRIPTS_DIRNAME)
    }

    pub fn python_path(&self) -> PathBuf {
        self.scripts_path().join(PYTHON_EXE)
    }

    pub fn is_installed(&self) -> bool {
        self.scripts_path().is_dir()
    }

    /// Creates the environment and installs the requirements into it.
    ///
    /// When `install_dir` is given, the scripts directory is also made available as
    /// `<install_dir>/<name>`.
    pub fn install(
        &self,
        installer: &dyn PackageInstaller,
        python_version: &str,
        quiet: bool,
        install_dir: Option<&Path>,
    ) -> Result<(), EnvError> {
        log::debug!("Installing isolated environment in {}", self.path.display());
        installer
            .create_env(
                &self.path,
                &format!("{}{}", ENV_PROMPT_PREFIX, self.name),
                python_version,
                quiet,
            )
            .map_err(|e| EnvError::installation(&self.name, e))?;
        self.install_requirements(installer, quiet)?;

        if let Some(install_dir) = install_dir
            && self.scripts_path().exists()
        {
            self.expose_scripts(install_dir)?;
        }
        Ok(())
    }

    fn install_requirements(
        &self,
        installer: &dyn PackageInstaller,
        quiet: bool,
    ) -> Result<(), EnvError> {
        log::info!(
            "Installing packages in isolated environment... ({})",
            self.requirements.join(", ")
        );
        let (file_requirements, regular): (Vec<&String>, Vec<&String>) = self
            .requirements
            .iter()
            .partition(|r| FILE_REQUIREMENT_RE.is_match(r));
        let regular: Vec<String> = regular.into_iter().map(|r| expand_env_variables(r)).collect();
        let extra_args: Vec<String> = file_requirements
            .into_iter()
            .flat_map(|r| {
                shlex::split(r).unwrap_or_else(|| r.split_whitespace().map(str::to_string).collect())
            })
            .collect();

        let request = InstallRequest {
            requirements: &regular,
            extra_args: &extra_args,
            quiet,
            prerelease: self.prerelease.as_deref(),
        };
        installer
            .install(&self.python_path(), &request)
            .map_err(|e| EnvError::installation(&self.name, e))
    }

    /// Dry-runs an install of `specs` into this environment.
    pub fn check_is_installable(
        &self,
        installer: &dyn PackageInstaller,
        specs: &[String],
        quiet: bool,
    ) -> Result<(), ExecutionError> {
        installer.check_installable(&self.python_path(), specs, quiet)
    }

    /// Makes the scripts directory available as `<install_dir>/<name>`: a symlink where the
    /// platform allows one, a copy otherwise.
    ///
    /// A context named like the environments directory is never exposed.
    fn expose_scripts(&self, install_dir: &Path) -> Result<(), EnvError> {
        if self.name.eq_ignore_ascii_case(VENVS_DIRNAME) {
            log::warn!("Not exposing the scripts of '{}': the name is reserved", self.name);
            return Ok(());
        }
        let scripts = self.scripts_path();
        let target = install_dir.join(&self.name);
        remove_entry(&target)?;

        match link_dir(&scripts, &target) {
            Ok(()) => return Ok(()),
            Err(e) => log::debug!(
                "Could not create symlink to {}, copy instead: {}",
                scripts.display(),
                e
            ),
        }

        fs::create_dir_all(&target).map_err(|e| EnvError::io(&target, e))?;
        let entries = fs::read_dir(&scripts).map_err(|e| EnvError::io(&scripts, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| EnvError::io(&scripts, e))?;
            let source = entry.path();
            if !source.is_file() {
                continue;
            }
            let dest = target.join(entry.file_name());
            if entry.file_name() == "activate.ps1" {
                // The PowerShell activation script only works from its own location.
                let forward = format!(". '{}'", source.display());
                fs::write(&dest, forward).map_err(|e| EnvError::io(&dest, e))?;
            } else {
                fs::copy(&source, &dest).map_err(|e| EnvError::io(&dest, e))?;
            }
        }
        Ok(())
    }

    /// Deletes the environment. A missing directory is not an error.
    pub fn remove(&self) -> Result<(), EnvError> {
        log::info!("Removing isolated environment in {}", self.path.display());
        match fs::remove_dir_all(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(EnvError::io(&self.path, e)),
            _ => Ok(()),
        }
    }

    /// Builds the invocation of `command` inside the environment: the scripts directory
    /// is prepended to the host `PATH` and `env` is layered on top.
    pub fn invocation(
        &self,
        command: CommandLine,
        env: &BTreeMap<String, String>,
        cwd: &Path,
    ) -> Result<Invocation, ExecutionError> {
        let scripts = self.scripts_path();
        log::debug!("Adding scripts path to PATH: {}", scripts.display());
        let path = executor::prepend_to_path(&scripts, std::env::var_os("PATH"))?;
        Ok(Invocation::new(command)
            .env("PATH", path)
            .envs(env)
            .cwd(cwd))
    }

    /// Runs `command` inside the environment with its output streamed to the terminal.
    pub fn run(
        &self,
        command: CommandLine,
        env: &BTreeMap<String, String>,
        cwd: &Path,
    ) -> Result<(), ExecutionError> {
        log::info!("Running command in isolated environment {}: {}", self.name, command);
        self.invocation(command, env, cwd)?.run()
    }
}

fn remove_entry(path: &Path) -> Result<(), EnvError> {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return Ok(());
    };
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| EnvError::io(path, e))
}

#[cfg(unix)]
fn link_dir(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(not(unix))]
fn link_dir(_source: &Path, _target: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        ErrorKind::Unsupported,
        "directory symlinks are not used on this platform",
    ))
}

/// Replaces `${NAME}` with the value of the host environment variable `NAME`.
pub fn expand_env_variables(line: &str) -> String {
    expand_env_variables_with(line, |name| std::env::var(name).ok())
}

/// Replaces `${NAME}` using `lookup`. Unset or empty variables are left verbatim.
pub fn expand_env_variables_with<F>(line: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_VAR_RE
        .replace_all(line, |caps: &regex::Captures<'_>| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            match lookup(name) {
                Some(value) if !value.is_empty() => value,
                _ => caps.get(0).map_or_else(String::new, |m| m.as_str().to_string()),
            }
        })
        .into_owned()
}
