// src/core/lock.rs

//! The lock cache (`tp.lock`): per context, the exact pins that its requirements resolved
//! to, and the fingerprint of the requirements they were resolved from.
//!
//! Locking is opt-in: without a lock file next to the manifest, contexts always use their
//! live requirements. `--lock` creates or regenerates the file.

use crate::core::config::Config;
use crate::core::hash::fingerprint;
use crate::models::{LockEntry, LockFile, RequirementSet, split_lines};
use crate::system::executor::ExecutionError;
use crate::system::installer::{FreezeRequest, PackageInstaller};
use colored::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

lazy_static! {
    static ref EDITABLE_RE: Regex = Regex::new(r"^--?e").unwrap();
}

#[derive(Error, Debug)]
pub enum LockError {
    #[error("I/O error on lock file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse lock file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Could not serialize lock file: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Failed to lock {ctx} requirements.")]
    Freeze {
        ctx: String,
        #[source]
        source: ExecutionError,
    },
}

/// Whether a requirement set can be pinned: editable installs and environments with an
/// explicit `dir` are never locked.
pub fn can_lock(set: &RequirementSet) -> bool {
    set.dir.is_none() && !set.requirements.iter().any(|r| EDITABLE_RE.is_match(r))
}

/// Returns the requirements to install for `ctx`, and whether the lock cache was updated.
///
/// When the context is locked and its stored fingerprint still matches the live
/// requirements, the stored pins are returned. A stale or missing entry is re-resolved
/// through the installer and written back.
pub fn get_or_update_locked_requirements(
    ctx: &str,
    config: &Config,
    installer: &dyn PackageInstaller,
    quiet: bool,
) -> Result<(RequirementSet, bool), LockError> {
    let live = config.get_requirements(ctx);
    let lock_path = config.lock_path();
    if !lock_path.exists() || !can_lock(&live) {
        return Ok((live, false));
    }

    let mut lock = read_lock_file(&lock_path)?;
    let hash = fingerprint(&live);
    if let Some(entry) = lock.get(ctx)
        && entry.hash.as_deref() == Some(hash.as_str())
    {
        log::debug!("Lock entry of '{}' is up to date", ctx);
        let pinned = RequirementSet {
            requirements: entry.requirements.clone(),
            ..live
        };
        return Ok((pinned, false));
    }

    let requirements = freeze(ctx, &live, config, installer, quiet)?;
    lock.insert(
        ctx.to_string(),
        LockEntry {
            requirements: requirements.clone(),
            hash: Some(hash),
            post_install: live.post_install.clone(),
        },
    );
    write_lock_file(&lock_path, &lock)?;
    Ok((
        RequirementSet {
            requirements,
            ..live
        },
        true,
    ))
}

fn freeze(
    ctx: &str,
    set: &RequirementSet,
    config: &Config,
    installer: &dyn PackageInstaller,
    quiet: bool,
) -> Result<Vec<String>, LockError> {
    if !quiet {
        eprintln!(
            "{} {} {}",
            "locking".blue(),
            ctx.cyan(),
            "requirements".blue()
        );
    }
    let request = FreezeRequest {
        requirements: &set.requirements,
        python_version: config.lock_python_version(),
        prerelease: config.prerelease(),
        quiet,
    };
    let output = installer
        .freeze(&request)
        .map_err(|e| LockError::Freeze {
            ctx: ctx.to_string(),
            source: e,
        })?;
    let mut pins = split_lines(&output);
    pins.sort();
    Ok(pins)
}

/// Empties the lock cache, creating it if needed. Every lockable context is re-resolved
/// on its next use.
pub fn reset(path: &Path) -> Result<(), LockError> {
    fs::write(path, "").map_err(|e| LockError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

pub fn read_lock_file(path: &Path) -> Result<LockFile, LockError> {
    let text = fs::read_to_string(path).map_err(|e| LockError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| LockError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_lock_file(path: &Path, lock: &LockFile) -> Result<(), LockError> {
    let text = toml::to_string_pretty(lock)?;
    fs::write(path, text).map_err(|e| LockError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
