// src/cli/handlers/mod.rs

// One module per wrapper action; `run` holds the command execution shared by the others.

pub mod add;
pub mod clean;
pub mod info;
pub mod install;
pub mod lock;
pub mod run;
