// src/bin/tp.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::env;
use toolpin::{
    cli::{Cli, dispatcher},
    core::config::Config,
    state::AppState,
    system::{env::EnvError, executor::ExecutionError, installer::UvInstaller},
};

/// The main entry point of the `tp` application.
/// It sets up logging, parses arguments, dispatches the command,
/// and performs centralized error handling.
fn main() {
    let raw_args: Vec<String> = env::args().skip(1).collect();
    let cli = Cli::parse();
    init_logger(if cli.quiet { 0 } else { cli.verbose });

    if let Err(e) = run(cli, &raw_args) {
        let code = exit_code(&e);
        log::debug!("Exiting with code {}: {:?}", code, e);
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(code);
    }
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(cli: Cli, raw_args: &[String]) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    let program = env::current_exe()?;
    let options = cli.into_options(raw_args, &program)?;
    let config = Config::load(&options.manifest_path)?;
    let state = AppState::new(options, config, Box::new(UvInstaller::locate()));
    dispatcher::dispatch(&state)
}

/// The child's exit code for failed installations and commands, 1 for everything else.
fn exit_code(error: &anyhow::Error) -> i32 {
    for cause in error.chain() {
        if let Some(EnvError::Installation { code, .. }) = cause.downcast_ref::<EnvError>() {
            return *code;
        }
        if let Some(code) = cause
            .downcast_ref::<ExecutionError>()
            .and_then(ExecutionError::exit_code)
        {
            return code;
        }
    }
    1
}
