//! CLI utilities for apg.
//!
//! This crate provides the pieces the `apg` binary shares with anything
//! else that drives renders from the command line: named render profiles
//! stored as YAML, the on-disk layout under `~/.apg`, and structured
//! output.

pub mod config;
pub mod output;
pub mod paths;

pub use config::{Config, Profile, load_config};
pub use output::{DisplayFormat, Output, print_verbose};
pub use paths::Paths;
