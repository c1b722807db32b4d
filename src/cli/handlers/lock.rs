use crate::cli::handlers::run::ensure_ctx;
use crate::core::lock;
use crate::models::RequirementSet;
use crate::state::AppState;
use crate::system::env::IsolatedEnv;
use anyhow::{Context, Result};

/// The handler for `--lock`: regenerates the lock file for every lockable context.
///
/// With `--force-install` the environments of the previously locked requirements are
/// removed first.
pub fn handle(state: &AppState) -> Result<()> {
    let lock_path = state.config.lock_path();
    let previous = if lock_path.exists() {
        lock::read_lock_file(&lock_path).unwrap_or_default()
    } else {
        Default::default()
    };
    lock::reset(&lock_path)?;

    let contexts: Vec<String> = state.config.context_names().map(str::to_string).collect();
    for ctx in contexts {
        let live = state.config.get_requirements(&ctx);
        if !lock::can_lock(&live) {
            log::info!("Tool context '{}' cannot be locked", ctx);
            continue;
        }
        if state.options.force_install {
            let installed = match previous.get(&ctx) {
                Some(entry) => RequirementSet {
                    requirements: entry.requirements.clone(),
                    ..live
                },
                None => live,
            };
            IsolatedEnv::new(
                &state.options.venvs_dir(),
                &ctx,
                &installed,
                state.python_version()?,
                state.config.prerelease(),
            )
            .remove()?;
        }
        ensure_ctx(state, &ctx, state.config.env())
            .with_context(|| format!("Failed to lock tool context '{}'", ctx))?;
    }
    Ok(())
}
