// src/system/interpreter.rs

use crate::constants::PYTHON_VERSION_ENV_VAR;
use crate::system::executor::{ExecutionError, Invocation};
use lazy_static::lazy_static;
use regex::Regex;
use std::env;
use thiserror::Error;

lazy_static! {
    static ref VERSION_RE: Regex = Regex::new(r"(\d+)\.(\d+)").unwrap();
}

#[derive(Error, Debug)]
pub enum InterpreterError {
    #[error("Could not determine the Python version: {0}")]
    Detection(#[from] ExecutionError),
    #[error("Could not parse a Python version from '{0}'")]
    Unparsable(String),
}

/// Extracts `major.minor` from a version string such as `Python 3.12.4` or `3.11`.
pub fn parse_version(text: &str) -> Option<String> {
    let caps = VERSION_RE.captures(text)?;
    Some(format!("{}.{}", caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Determines the interpreter version that environments are created with.
///
/// Priority: the `TOOLPIN_PYTHON` environment variable, then the `python3` found on the
/// host `PATH`.
pub fn python_version() -> Result<String, InterpreterError> {
    if let Ok(explicit) = env::var(PYTHON_VERSION_ENV_VAR)
        && !explicit.trim().is_empty()
    {
        return parse_version(&explicit).ok_or(InterpreterError::Unparsable(explicit));
    }
    let output = detect_host_python()?;
    log::debug!("Host interpreter reports: {}", output.trim());
    parse_version(&output).ok_or_else(|| InterpreterError::Unparsable(output.trim().to_string()))
}

fn detect_host_python() -> Result<String, ExecutionError> {
    let program = if cfg!(windows) { "python" } else { "python3" };
    Invocation::argv([program, "--version"]).capture()
}
