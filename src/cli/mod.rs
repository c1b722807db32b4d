use crate::core::paths::{self, PathError};
use crate::core::references;
use crate::state::Options;
use clap::{ArgAction, Parser};
use std::path::{Path, PathBuf};

pub mod dispatcher;
pub mod handlers;

/// tp: run the tools a project pins in its pyproject.toml, each in its own isolated
/// environment.
#[derive(Parser, Debug)]
#[command(
    name = "tp",
    author,
    version,
    about,
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// The manifest holding the [tool.toolpin] section.
    #[arg(short = 't', long = "toml", value_name = "FILE")]
    pub toml: Option<PathBuf>,

    /// Where environments are installed [default: $TOOLPIN_INSTALL_DIR or .toolpin next to the manifest].
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Reinstall the environment of the tool context, even when it is up to date.
    #[arg(short = 'f', long)]
    pub force_install: bool,

    /// Remove environments that no longer belong to a declared tool context.
    #[arg(short = 'c', long)]
    pub clean: bool,

    /// Install a tool context without running anything.
    #[arg(long, value_name = "CTX")]
    pub install_context: Option<String>,

    /// Regenerate the lock file for every tool context.
    #[arg(long)]
    pub lock: bool,

    /// Add requirements to a tool context (main by default).
    #[arg(long, value_name = "[CTX:]REQ[,REQ...]")]
    pub add: Option<String>,

    /// Show what a command refers to, or list all aliases, scripts and tool contexts.
    #[arg(short = 'i', long)]
    pub info: bool,

    /// Increase verbosity (-v, -vv).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// The alias, script or tool to run.
    #[arg(value_name = "CMD")]
    pub cmd: Option<String>,

    /// Arguments passed to the command verbatim.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Wrapper options that take their value from the next argument.
const VALUE_OPTIONS: &[&str] = &["-t", "--toml", "--install-dir", "--install-context", "--add"];

/// Finds the position of the command in the raw arguments: the first argument that is
/// neither a wrapper option nor the value of one. A `--` before the command ends the
/// wrapper options.
pub fn command_index(raw_args: &[String]) -> Option<usize> {
    let mut iter = raw_args.iter().enumerate();
    while let Some((i, arg)) = iter.next() {
        if arg == "--" {
            return iter.next().map(|(i, _)| i);
        }
        if !arg.starts_with('-') || arg == "-" {
            return Some(i);
        }
        let takes_value = VALUE_OPTIONS.contains(&arg.as_str())
            || (!arg.starts_with("--") && arg.len() > 2 && arg.ends_with('t'));
        if takes_value {
            iter.next();
        }
    }
    None
}

impl Cli {
    /// Resolves the parsed arguments into `Options`.
    ///
    /// `raw_args` are the arguments the wrapper was started with (without the program).
    /// Everything after the command is passed on verbatim, including a `--`. The options
    /// before it become the self-reference arguments, with `program` in front.
    pub fn into_options(self, raw_args: &[String], program: &Path) -> Result<Options, PathError> {
        let manifest_path = paths::resolve_manifest_path(self.toml.as_deref())?;
        let install_dir = paths::resolve_install_dir(self.install_dir.as_deref(), &manifest_path)?;

        let (wrapper, cmd_args) = match command_index(raw_args).filter(|_| self.cmd.is_some()) {
            Some(index) => {
                let (wrapper, rest) = raw_args.split_at(index);
                (wrapper, rest.iter().skip(1).cloned().collect())
            }
            None => (raw_args, self.args),
        };
        let wrapper = match wrapper.split_last() {
            Some((last, init)) if last == "--" => init,
            _ => wrapper,
        };
        let cwd = paths::absolute(Path::new("."))?;
        let wrapper_args = references::self_reference_args(program, wrapper, &cwd);

        let quiet = self.quiet;
        Ok(Options {
            manifest_path,
            install_dir,
            force_install: self.force_install,
            clean: self.clean,
            lock: self.lock,
            info: self.info,
            install_context: self.install_context,
            add: self.add,
            quiet,
            verbosity: if quiet { 0 } else { self.verbose },
            wrapper_args,
            cmd: self.cmd,
            cmd_args,
        })
    }
}
