use crate::core::requirements::{self, AddRequest};
use crate::state::AppState;
use crate::system::env::{EnvError, IsolatedEnv};
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::io::ErrorKind;

/// The handler for `--add [ctx:]req[,req...]`.
///
/// The manifest is only rewritten once the new requirements are known to be absent from the
/// context and installable into its environment.
pub fn handle(state: &AppState) -> Result<()> {
    let Some(arg) = state.options.add.as_deref() else {
        return Ok(());
    };
    let request = AddRequest::parse(arg)?;
    let manifest_path = &state.options.manifest_path;
    let text = match fs::read_to_string(manifest_path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("Could not read {}", manifest_path.display()));
        }
    };
    let updated = requirements::add_to_manifest(&text, &request)
        .with_context(|| format!("Could not update {}", manifest_path.display()))?;

    let quiet = state.options.quiet;
    let python_version = state.python_version()?;
    let venv = IsolatedEnv::new(
        &state.options.venvs_dir(),
        &request.ctx,
        &state.config.get_requirements(&request.ctx),
        python_version,
        state.config.prerelease(),
    );
    if !venv.is_installed() {
        venv.install(state.installer(), python_version, quiet, None)?;
    }
    venv.check_is_installable(state.installer(), &request.specs, quiet)
        .map_err(|e| EnvError::installation(&request.ctx, e))?;

    fs::write(manifest_path, updated)
        .with_context(|| format!("Could not write {}", manifest_path.display()))?;
    if !quiet {
        eprintln!(
            "{} {} {} {}",
            "Added".blue(),
            request.specs.join(", ").cyan(),
            "to".blue(),
            request.ctx.cyan()
        );
    }
    Ok(())
}
