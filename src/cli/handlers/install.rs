use crate::cli::handlers::run::ensure_ctx;
use crate::core::config::ConfigError;
use crate::state::AppState;
use anyhow::Result;
use std::collections::BTreeMap;

/// The handler for `--install-context <ctx>`: installs the context without running anything.
pub fn handle(state: &AppState) -> Result<()> {
    let Some(ctx) = state.options.install_context.as_deref() else {
        return Ok(());
    };
    if !state.config.is_ctx(ctx) {
        return Err(ConfigError::UnknownContext(ctx.to_string()).into());
    }
    ensure_ctx(state, ctx, &BTreeMap::new())?;
    Ok(())
}
