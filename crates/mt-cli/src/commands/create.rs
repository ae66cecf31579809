//! Create command for adding clients, categories and projects.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Subcommand;

use mt_core::{CatalogLookup, CatalogService, Category, Client, Project};
use mt_db::Database;

#[derive(Debug, Subcommand)]
pub enum CreateCommand {
    /// Add a client.
    Client {
        /// Client name.
        name: String,
        /// Short code; derived from the name when omitted.
        #[arg(long)]
        code: Option<String>,
    },
    /// Add a billing category.
    Category {
        /// Category name.
        name: String,
        /// Hourly rate.
        rate: f64,
        /// Short code; derived from the name when omitted.
        #[arg(long)]
        code: Option<String>,
    },
    /// Add a project for a client.
    Project {
        /// Project name.
        name: String,
        /// Code of the owning client.
        client: String,
        /// Code of the category used when a session names none.
        category: String,
        /// Short code; derived from the name when omitted.
        #[arg(long)]
        code: Option<String>,
    },
}

pub fn run<W: Write>(writer: &mut W, db: &Database, command: &CreateCommand) -> Result<()> {
    let catalog = CatalogService::new(db);

    match command {
        CreateCommand::Client { name, code } => {
            let id = catalog.create_client(Client {
                id: 0,
                name: name.clone(),
                code: code.clone().unwrap_or_default(),
                archived: false,
            })?;
            let client = catalog.get_client_by_id(id)?;
            writeln!(writer, "Created client {} ({})", client.name, client.code)?;
        }
        CreateCommand::Category { name, rate, code } => {
            let id = catalog.create_category(Category {
                id: 0,
                name: name.clone(),
                code: code.clone().unwrap_or_default(),
                rate: *rate,
                archived: false,
            })?;
            let category = catalog.get_category_by_id(id)?;
            writeln!(
                writer,
                "Created category {} ({}) at {:.2}/h",
                category.name, category.code, category.rate
            )?;
        }
        CreateCommand::Project {
            name,
            client,
            category,
            code,
        } => {
            let owner = catalog
                .get_client_by_code(client)
                .with_context(|| format!("unknown client code {client}"))?;
            let default_category = catalog
                .get_category_by_code(category)
                .with_context(|| format!("unknown category code {category}"))?;
            let id = catalog.create_project(Project {
                id: 0,
                name: name.clone(),
                code: code.clone().unwrap_or_default(),
                client_id: owner.id,
                default_category_id: default_category.id,
                archived: false,
            })?;
            let project = catalog.get_project_by_id(id)?;
            writeln!(
                writer,
                "Created project {} ({}) for {}",
                project.name, project.code, owner.name
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn create(db: &Database, command: &CreateCommand) -> String {
        let mut output = Vec::new();
        run(&mut output, db, command).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn create_catalog_entries() {
        let db = Database::open_in_memory().unwrap();

        let mut output = create(
            &db,
            &CreateCommand::Client {
                name: "Acme".to_string(),
                code: Some("acme".to_string()),
            },
        );
        output += &create(
            &db,
            &CreateCommand::Category {
                name: "Development".to_string(),
                rate: 50.0,
                code: None,
            },
        );
        output += &create(
            &db,
            &CreateCommand::Project {
                name: "Website".to_string(),
                client: "acme".to_string(),
                category: "deve".to_string(),
                code: Some("site".to_string()),
            },
        );

        assert_snapshot!(output, @r"
        Created client Acme (acme)
        Created category Development (deve) at 50.00/h
        Created project Website (site) for Acme
        ");

        let catalog = CatalogService::new(&db);
        let project = catalog.get_project_by_code("site").unwrap();
        assert_eq!(project.client_id, 1);
        assert_eq!(project.default_category_id, 1);
    }

    #[test]
    fn create_project_rejects_unknown_client() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();

        let err = run(
            &mut output,
            &db,
            &CreateCommand::Project {
                name: "Website".to_string(),
                client: "nope".to_string(),
                category: "dev".to_string(),
                code: None,
            },
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "unknown client code nope");
        assert!(output.is_empty());
    }
}
