//! CLI module
//!
//! Command-line interface for the Pipedrive source.
//!
//! # Commands
//!
//! - `check` - Test the API token
//! - `streams` - List stream names
//! - `read` - Extract data from streams

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
