//! # System Interaction Layer
//!
//! This module provides abstractions for interacting with the underlying operating system.
//! It serves as a boundary between the core application logic and the specifics of process
//! management and the external package installer.
//!
//! ## Modules
//!
//! - **`executor`**: Spawns external processes, either as an argument vector or as a line for
//!   the host shell (`sh -c` / `cmd /C`), with environment overrides, an optional working
//!   directory, optional stdin input and optional output capture.
//! - **`installer`**: The `PackageInstaller` trait and its `uv` implementation.
//! - **`interpreter`**: Determines the interpreter version environments are created with.
//! - **`env`**: Isolated environments: their deterministic location, installation, execution
//!   with an augmented `PATH`, and removal.

pub mod env;
pub mod executor;
pub mod installer;
pub mod interpreter;
