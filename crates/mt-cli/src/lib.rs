//! mytime CLI library.
//!
//! Argument parsing, configuration and the command implementations behind
//! the `mytime` binary.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
