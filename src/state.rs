// src/state.rs

use crate::constants::VENVS_DIRNAME;
use crate::core::config::Config;
use crate::core::references;
use crate::system::installer::PackageInstaller;
use crate::system::interpreter::{self, InterpreterError};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Everything decided from the command line, with paths already made absolute.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub manifest_path: PathBuf,
    pub install_dir: PathBuf,
    pub force_install: bool,
    pub clean: bool,
    pub lock: bool,
    pub info: bool,
    pub install_context: Option<String>,
    pub add: Option<String>,
    pub quiet: bool,
    pub verbosity: u8,
    /// The command line that re-invokes the wrapper, substituted for `tp@`.
    pub wrapper_args: Vec<String>,
    pub cmd: Option<String>,
    pub cmd_args: Vec<String>,
}

impl Options {
    pub fn venvs_dir(&self) -> PathBuf {
        self.install_dir.join(VENVS_DIRNAME)
    }
}

/// The state shared by all handlers of one invocation.
#[derive(Debug)]
pub struct AppState {
    pub options: Options,
    pub config: Config,
    installer: Box<dyn PackageInstaller>,
    python_version: OnceLock<String>,
}

impl AppState {
    pub fn new(options: Options, config: Config, installer: Box<dyn PackageInstaller>) -> Self {
        Self {
            options,
            config,
            installer,
            python_version: OnceLock::new(),
        }
    }

    /// Fixes the interpreter version instead of detecting it on first use.
    pub fn with_python_version(self, version: impl Into<String>) -> Self {
        let _ = self.python_version.set(version.into());
        self
    }

    pub fn installer(&self) -> &dyn PackageInstaller {
        self.installer.as_ref()
    }

    /// The interpreter version (`major.minor`), detected once per invocation.
    pub fn python_version(&self) -> Result<&str, InterpreterError> {
        if let Some(version) = self.python_version.get() {
            return Ok(version.as_str());
        }
        let detected = interpreter::python_version()?;
        log::debug!("Using Python {}", detected);
        Ok(self.python_version.get_or_init(|| detected).as_str())
    }

    /// Expands `@alias` and `tp@` references in a command.
    pub fn resolve_references(&self, cmd: &str) -> String {
        references::resolve_references(cmd, &self.options.wrapper_args, |name| {
            self.config.is_alias(name) || self.config.is_script(name)
        })
    }
}
