use crate::cli::{Cli, handlers};
use crate::core::config::Config;
use crate::state::{AppState, Options};
use crate::system::executor::ExecutionError;
use anyhow::Result;
use clap::CommandFactory;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("'{cmd}' is ambiguous. Candidates are: {}", .candidates.join(", "))]
    Ambiguous { cmd: String, candidates: Vec<String> },
    #[error("'{0}' is not configured as tool context, alias or script")]
    Unknown(String),
    #[error("No command given")]
    MissingCommand,
}

/// What happens after a pre-command action has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// The invocation is complete.
    Stop,
    /// Go on with the command, if one was given.
    Continue,
}

/// An action requested by a wrapper option, run before any command.
struct PreAction {
    name: &'static str,
    requested: fn(&Options) -> bool,
    handler: fn(&AppState) -> Result<()>,
    flow: Flow,
}

/// The pre-command actions, in the order they are checked.
static PRE_ACTIONS: &[PreAction] = &[
    PreAction {
        name: "add",
        requested: |o| o.add.is_some(),
        handler: handlers::add::handle,
        flow: Flow::Stop,
    },
    PreAction {
        name: "install-context",
        requested: |o| o.install_context.is_some(),
        handler: handlers::install::handle,
        flow: Flow::Stop,
    },
    PreAction {
        name: "lock",
        requested: |o| o.lock,
        handler: handlers::lock::handle,
        flow: Flow::Stop,
    },
    PreAction {
        name: "info",
        requested: |o| o.info,
        handler: handlers::info::handle,
        flow: Flow::Stop,
    },
    PreAction {
        name: "clean",
        requested: |o| o.clean,
        handler: handlers::clean::handle,
        flow: Flow::Continue,
    },
];

/// Where a command is routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Alias(String),
    Script(String),
    /// Run the command itself inside a tool context: the one it names, or `main`.
    Context(String),
    Unknown,
}

/// Decides where `cmd` goes: a matching alias or script first, then a tool context.
pub fn resolve_route(config: &Config, cmd: &str) -> Result<Route, DispatchError> {
    let candidates = config.find_aliases_or_scripts(cmd);
    log::debug!("Matching aliases/scripts for {}: {}", cmd, candidates.join(", "));
    match candidates.as_slice() {
        [] => {}
        [single] => {
            return Ok(if config.is_alias(single) {
                Route::Alias(single.clone())
            } else {
                Route::Script(single.clone())
            });
        }
        _ => {
            return Err(DispatchError::Ambiguous {
                cmd: cmd.to_string(),
                candidates,
            });
        }
    }
    Ok(match config.get_ctx_or_main(Some(cmd)) {
        Some(ctx) => Route::Context(ctx),
        None => Route::Unknown,
    })
}

/// Runs the pre-command actions, then routes the command.
pub fn dispatch(state: &AppState) -> Result<()> {
    for action in PRE_ACTIONS {
        if !(action.requested)(&state.options) {
            continue;
        }
        log::debug!("Running pre-command action '{}'", action.name);
        (action.handler)(state)?;
        if action.flow == Flow::Stop || state.options.cmd.is_none() {
            return Ok(());
        }
    }

    let Some(cmd) = state.options.cmd.as_deref() else {
        eprintln!("{}", Cli::command().render_help());
        return Err(DispatchError::MissingCommand.into());
    };

    match resolve_route(&state.config, cmd)? {
        Route::Alias(name) => return handlers::run::run_alias(state, &name),
        Route::Script(name) => return handlers::run::run_script(state, &name),
        Route::Context(ctx) => match handlers::run::run_command_in_ctx(state, &ctx, cmd) {
            Err(e) if is_program_not_found(&e) => {
                log::debug!("Error running command {}: {:#}", cmd, e);
            }
            result => return result,
        },
        Route::Unknown => {}
    }

    handlers::info::show_info(&state.config, Some(cmd), true)?;
    Err(DispatchError::Unknown(cmd.to_string()).into())
}

fn is_program_not_found(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<ExecutionError>())
        .any(ExecutionError::is_not_found)
}
