//! Archive command. Archived entries drop out of default listings.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Subcommand;

use mt_core::CatalogService;
use mt_db::Database;

#[derive(Debug, Subcommand)]
pub enum ArchiveCommand {
    /// Archive a client.
    Client { code: String },
    /// Archive a billing category.
    Category { code: String },
    /// Archive a project.
    Project { code: String },
}

pub fn run<W: Write>(writer: &mut W, db: &Database, command: &ArchiveCommand) -> Result<()> {
    let catalog = CatalogService::new(db);

    let (entity, name, code) = match command {
        ArchiveCommand::Client { code } => {
            let client = catalog
                .archive_client(code)
                .with_context(|| format!("failed to archive client {code}"))?;
            ("client", client.name, client.code)
        }
        ArchiveCommand::Category { code } => {
            let category = catalog
                .archive_category(code)
                .with_context(|| format!("failed to archive category {code}"))?;
            ("category", category.name, category.code)
        }
        ArchiveCommand::Project { code } => {
            let project = catalog
                .archive_project(code)
                .with_context(|| format!("failed to archive project {code}"))?;
            ("project", project.name, project.code)
        }
    };

    writeln!(writer, "Archived {entity} {name} ({code})")?;
    Ok(())
}
