//! Session drop-off CLI library.
//!
//! This crate provides the command-line adapter around `dropoff-core`: CSV
//! ingestion, configuration, and the `report`, `export` and `check` commands.

mod cli;
pub mod commands;
mod config;
pub mod input;

pub use cli::{BucketArgs, Cli, Commands, InputArgs};
pub use config::Config;
