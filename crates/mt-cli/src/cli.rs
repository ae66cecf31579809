//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::archive::ArchiveCommand;
use crate::commands::create::CreateCommand;
use crate::commands::edit::EditCommand;
use crate::commands::list::ListCommand;
use crate::commands::session::SessionCommand;

/// Billable time tracker.
///
/// Keeps a catalog of clients, billing categories and projects, times work
/// sessions against them and tracks which sessions were invoiced and paid.
#[derive(Debug, Parser)]
#[command(name = "mytime", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a client, category or project.
    #[command(subcommand)]
    Create(CreateCommand),

    /// Change a client, category or project.
    #[command(subcommand)]
    Edit(EditCommand),

    /// Archive a client, category or project.
    #[command(subcommand)]
    Archive(ArchiveCommand),

    /// List clients, categories or projects.
    #[command(subcommand)]
    List(ListCommand),

    /// Time, invoice and report sessions.
    #[command(subcommand)]
    Session(SessionCommand),
}
