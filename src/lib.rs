//! # toolpin
//!
//! Runs the tools a project declares in the `[tool.toolpin]` section of its `pyproject.toml`,
//! each tool context in its own isolated environment, optionally pinned through `tp.lock`.

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod state;
pub mod system;
