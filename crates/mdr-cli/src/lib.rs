//! Library side of the `mdr` command-line tool.
//!
//! - [`cli`]: argument definitions.
//! - [`config`]: the TOML configuration file.
//! - [`commands`]: opening a store and running one command against it.
//! - [`summary`]: command results and their table rendering.
//! - [`logging`]: `tracing-subscriber` setup.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod summary;
