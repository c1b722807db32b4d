use crate::core::config::{Config, Description};
use crate::state::AppState;
use anyhow::Result;
use colored::*;

/// The handler for `--info`: describes the given command, or lists everything.
pub fn handle(state: &AppState) -> Result<()> {
    show_info(&state.config, state.options.cmd.as_deref(), false)
}

/// Prints what `cmd` refers to.
///
/// Labels always go to stderr. The data itself goes to stdout, or to stderr when `error`
/// is set, so the output can be piped.
pub fn show_info(config: &Config, cmd: Option<&str>, error: bool) -> Result<()> {
    let out = |line: &str| {
        if error {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    };
    let manifest = config.manifest_path().display().to_string();

    match config.describe(cmd)? {
        Description::Alias { name, commands } => {
            eprintln!("{} {} {}", name, "is an alias in".blue(), manifest.cyan());
            for command in commands {
                if let Some(ctx) = &command.ctx {
                    eprintln!("{} {} {}", "and runs in the".blue(), ctx.cyan(), "tool context".blue());
                }
                eprintln!("{}", "command:".blue());
                out(&command.cmd);
            }
        }
        Description::Script { name, path } => {
            eprintln!(
                "{} {} {}",
                name,
                "is a script in".blue(),
                path.parent().map(|p| p.display().to_string()).unwrap_or_default().cyan()
            );
        }
        Description::Context { name, requirements } => {
            eprintln!("{} {} {}", name, "is a tool context in".blue(), manifest.cyan());
            eprintln!("{}", "requirements:".blue());
            out(&requirements.requirements.join("\n"));
            if let Some(post_install) = &requirements.post_install {
                eprintln!("{}", "post-install:".blue());
                out(post_install);
            }
        }
        Description::Overview {
            name,
            has_main,
            aliases,
            scripts,
            contexts,
        } => {
            if let Some(name) = name {
                eprintln!(
                    "{} {} {}",
                    name,
                    "is not configured as tool context, alias or script in".blue(),
                    manifest
                );
                if has_main {
                    eprintln!("{} {}", name, "would run in the main context.".blue());
                } else {
                    eprintln!("{} {}", name, "cannot run because there is no main context.".blue());
                }
            }
            eprintln!("{}", "available aliases:".blue());
            out(&aliases.join("\n"));
            eprintln!("{}", "available scripts:".blue());
            out(&scripts.join("\n"));
            eprintln!("{}", "available tool contexts:".blue());
            out(&contexts.join("\n"));
        }
    }
    Ok(())
}
