use crate::core::lock;
use crate::core::references::wrap_value;
use crate::state::AppState;
use crate::system::env::{EnvError, IsolatedEnv};
use crate::system::executor::{CommandLine, Invocation};
use anyhow::Result;
use colored::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Makes sure the environment of `ctx` exists and is up to date, installing it when it is
/// missing, when `--force-install` is given, or when its lock entry was just refreshed.
///
/// After an install the context's post-install command runs inside the environment.
pub fn ensure_ctx(state: &AppState, ctx: &str, env: &BTreeMap<String, String>) -> Result<IsolatedEnv> {
    let quiet = state.options.quiet;
    let (requirements, updated) =
        lock::get_or_update_locked_requirements(ctx, &state.config, state.installer(), quiet)?;
    let python_version = state.python_version()?;
    let venv = IsolatedEnv::new(
        &state.options.venvs_dir(),
        ctx,
        &requirements,
        python_version,
        state.config.prerelease(),
    );

    if venv.is_installed() && !state.options.force_install && !updated {
        log::debug!("Tool context '{}' is up to date in {}", ctx, venv.path().display());
        return Ok(venv);
    }

    let installed = venv
        .install(
            state.installer(),
            python_version,
            quiet,
            Some(state.options.install_dir.as_path()),
        )
        .and_then(|()| match &requirements.post_install {
            Some(post_install) => {
                let cmd = state.resolve_references(post_install);
                let cwd = state.config.get_cwd(None);
                venv.run(CommandLine::Shell(cmd), env, Path::new(&cwd))
                    .map_err(|e| EnvError::installation(ctx, e))
            }
            None => Ok(()),
        });
    if let Err(EnvError::Installation { code, .. }) = &installed {
        eprintln!(
            "{}",
            format!("installation of '{}' failed with exit code {}", ctx, code).red()
        );
    }
    installed?;
    Ok(venv)
}

/// Runs a command inside the environment of `ctx`.
pub fn run_in_ctx(
    state: &AppState,
    ctx: &str,
    command: CommandLine,
    env: &BTreeMap<String, String>,
    cwd: &str,
) -> Result<()> {
    log::debug!("Running command in isolated environment, ctx: {}, full command: {}", ctx, command);
    let venv = ensure_ctx(state, ctx, env)?;
    venv.run(command, env, Path::new(cwd))?;
    Ok(())
}

/// Runs every command of an alias in order, stopping at the first failure.
pub fn run_alias(state: &AppState, name: &str) -> Result<()> {
    let quoted_args: Vec<String> = state.options.cmd_args.iter().map(|a| wrap_value(a)).collect();
    for alias_cmd in state.config.get_alias(name)? {
        log::debug!(
            "Running alias command, ctx: {:?}, command: {}, arguments: {:?}",
            alias_cmd.ctx,
            alias_cmd.cmd,
            state.options.cmd_args
        );
        let full_cmd = std::iter::once(state.resolve_references(&alias_cmd.cmd))
            .chain(quoted_args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        let command = match &alias_cmd.shell {
            Some(shell) => CommandLine::Argv(vec![shell.clone(), "-c".to_string(), full_cmd]),
            None => CommandLine::Shell(full_cmd),
        };

        let mut env = state.config.env().clone();
        env.extend(alias_cmd.env.clone());

        match &alias_cmd.ctx {
            Some(ctx) => run_in_ctx(state, ctx, command, &env, &alias_cmd.cwd)?,
            None => {
                log::debug!(
                    "Running command without isolated environment: {}, in {}",
                    command,
                    alias_cmd.cwd
                );
                Invocation::new(command).envs(&env).cwd(&alias_cmd.cwd).run()?;
            }
        }
    }
    Ok(())
}

/// Runs `<scripts_dir>/<name>.py` with `python`, inside the scripts context if there is one.
pub fn run_script(state: &AppState, name: &str) -> Result<()> {
    let file = state.config.get_script_path(name);
    log::debug!("Running script: {}, arguments: {:?}", file.display(), state.options.cmd_args);
    let argv = ["python".to_string(), file.display().to_string()]
        .into_iter()
        .chain(state.options.cmd_args.iter().cloned())
        .collect();
    let command = CommandLine::Argv(argv);
    let cwd = state.config.get_cwd(None);

    match state.config.scripts_ctx() {
        Some(ctx) => run_in_ctx(state, ctx, command, state.config.env(), &cwd),
        None => {
            Invocation::new(command)
                .envs(state.config.env())
                .cwd(&cwd)
                .run()?;
            Ok(())
        }
    }
}

/// Runs `cmd` itself, followed by the user's arguments, inside `ctx`.
pub fn run_command_in_ctx(state: &AppState, ctx: &str, cmd: &str) -> Result<()> {
    let argv = std::iter::once(cmd.to_string())
        .chain(state.options.cmd_args.iter().cloned())
        .collect();
    run_in_ctx(
        state,
        ctx,
        CommandLine::Argv(argv),
        state.config.env(),
        &state.config.get_cwd(None),
    )
}
