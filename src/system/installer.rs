// src/system/installer.rs

//! The boundary to the external package installer.
//!
//! The rest of the crate only needs four operations: create an environment, install
//! requirements into it, freeze requirements to exact versions, and dry-run an install.
//! `UvInstaller` implements them by shelling out to `uv`.

use crate::constants::UV_ENV_VAR;
use crate::system::executor::{ExecutionError, Invocation};
use std::env;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Parameters of an install into an existing environment.
#[derive(Debug, Clone, Default)]
pub struct InstallRequest<'a> {
    /// Regular requirement lines, fed to the installer on stdin.
    pub requirements: &'a [String],
    /// Extra arguments, such as `-r requirements.txt` lines split into words.
    pub extra_args: &'a [String],
    pub quiet: bool,
    pub prerelease: Option<&'a str>,
}

/// Parameters of a freeze (lock) operation.
#[derive(Debug, Clone, Default)]
pub struct FreezeRequest<'a> {
    pub requirements: &'a [String],
    pub python_version: Option<&'a str>,
    pub prerelease: Option<&'a str>,
    pub quiet: bool,
}

pub trait PackageInstaller: Debug {
    /// Creates an empty isolated environment at `path`.
    fn create_env(
        &self,
        path: &Path,
        prompt: &str,
        python_version: &str,
        quiet: bool,
    ) -> Result<(), ExecutionError>;

    /// Installs requirements into the environment owning the `python` executable.
    fn install(&self, python: &Path, request: &InstallRequest<'_>) -> Result<(), ExecutionError>;

    /// Resolves requirements to exact versions and returns the installer's raw output,
    /// one requirement per line.
    fn freeze(&self, request: &FreezeRequest<'_>) -> Result<String, ExecutionError>;

    /// Fails if the given specs cannot be installed into the environment.
    fn check_installable(
        &self,
        python: &Path,
        specs: &[String],
        quiet: bool,
    ) -> Result<(), ExecutionError>;
}

#[derive(Debug, Clone)]
pub struct UvInstaller {
    uv: PathBuf,
}

impl UvInstaller {
    pub fn new(uv: impl Into<PathBuf>) -> Self {
        Self { uv: uv.into() }
    }

    /// Finds `uv` via `TOOLPIN_UV`, then the `PATH`. When neither works the bare name is
    /// kept, so the failure surfaces as a "could not be executed" error on first use.
    pub fn locate() -> Self {
        if let Ok(explicit) = env::var(UV_ENV_VAR)
            && !explicit.trim().is_empty()
        {
            return Self::new(explicit);
        }
        match which::which("uv") {
            Ok(path) => Self::new(path),
            Err(_) => {
                log::debug!("uv not found in PATH");
                Self::new("uv")
            }
        }
    }

    fn uv_command(&self, args: &[&str]) -> Vec<String> {
        std::iter::once(self.uv.to_string_lossy().into_owned())
            .chain(args.iter().map(|s| s.to_string()))
            .collect()
    }
}

impl PackageInstaller for UvInstaller {
    fn create_env(
        &self,
        path: &Path,
        prompt: &str,
        python_version: &str,
        quiet: bool,
    ) -> Result<(), ExecutionError> {
        let path = path.to_string_lossy();
        let mut cmd = self.uv_command(&["venv", &*path, "--prompt", prompt, "--python", python_version]);
        if quiet {
            cmd.push("--quiet".to_string());
        }
        log::debug!("Calling uv: {}", cmd.join(" "));
        Invocation::argv(cmd).run_to_stderr()
    }

    fn install(&self, python: &Path, request: &InstallRequest<'_>) -> Result<(), ExecutionError> {
        let python = python.to_string_lossy();
        let mut cmd = self.uv_command(&["pip", "install", "-r", "-", "--python", &*python]);
        cmd.extend(request.extra_args.iter().cloned());
        if request.quiet {
            cmd.push("--quiet".to_string());
        }
        if let Some(prerelease) = request.prerelease {
            cmd.push("--prerelease".to_string());
            cmd.push(prerelease.to_string());
        }
        log::debug!("Calling uv: {}", cmd.join(" "));
        Invocation::argv(cmd)
            .input(request.requirements.join("\n"))
            .run_to_stderr()
    }

    fn freeze(&self, request: &FreezeRequest<'_>) -> Result<String, ExecutionError> {
        let mut cmd = self.uv_command(&[
            "pip",
            "compile",
            "--universal",
            "--no-annotate",
            "--no-header",
        ]);
        if let Some(version) = request.python_version {
            cmd.push("--python-version".to_string());
            cmd.push(version.to_string());
        }
        if let Some(prerelease) = request.prerelease {
            cmd.push("--prerelease".to_string());
            cmd.push(prerelease.to_string());
        }
        if request.quiet {
            cmd.push("--quiet".to_string());
        }
        cmd.push("-".to_string());
        log::debug!("Calling uv: {}", cmd.join(" "));
        Invocation::argv(cmd)
            .input(request.requirements.join("\n"))
            .capture()
    }

    fn check_installable(
        &self,
        python: &Path,
        specs: &[String],
        quiet: bool,
    ) -> Result<(), ExecutionError> {
        let python = python.to_string_lossy();
        let mut cmd = self.uv_command(&["pip", "install", "--python", &*python, "--dry-run"]);
        if quiet {
            cmd.push("--quiet".to_string());
        }
        cmd.extend(specs.iter().cloned());
        Invocation::argv(cmd).run_to_stderr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_command_starts_with_binary() {
        let uv = UvInstaller::new("/opt/uv/bin/uv");
        assert_eq!(
            uv.uv_command(&["pip", "compile"]),
            vec!["/opt/uv/bin/uv", "pip", "compile"]
        );
    }
}
