use crate::core::lock;
use crate::state::AppState;
use crate::system::env::IsolatedEnv;
use anyhow::Result;
use colored::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// The handler for `--clean`: removes every environment under the venvs directory that does
/// not belong to a declared tool context.
pub fn handle(state: &AppState) -> Result<()> {
    let venvs_dir = state.options.venvs_dir();
    let Ok(entries) = fs::read_dir(&venvs_dir) else {
        log::debug!("Nothing to clean in {}", venvs_dir.display());
        return Ok(());
    };

    let python_version = state.python_version()?;
    let mut in_use = HashSet::new();
    for ctx in state.config.context_names() {
        let (requirements, _) =
            lock::get_or_update_locked_requirements(ctx, &state.config, state.installer(), state.options.quiet)?;
        let venv = IsolatedEnv::new(
            &venvs_dir,
            ctx,
            &requirements,
            python_version,
            state.config.prerelease(),
        );
        in_use.insert(canonical(venv.path()));
    }

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let path = canonical(&path);
        if in_use.contains(&path) {
            continue;
        }
        if !state.options.quiet {
            eprintln!("{} {}", "Removing".cyan(), path.display().to_string().blue());
        }
        if let Err(e) = fs::remove_dir_all(&path) {
            log::warn!("Could not remove {}: {}", path.display(), e);
        }
    }
    Ok(())
}

fn canonical(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
