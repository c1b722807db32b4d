// src/core/mod.rs

pub mod abbrev;
pub mod config;
pub mod hash;
pub mod lock;
pub mod paths;
pub mod references;
pub mod requirements;
