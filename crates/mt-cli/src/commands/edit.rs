//! Edit command for renaming and re-coding catalog entries.
//!
//! Only the fields given on the command line change. With no flags the
//! record is left untouched and nothing is written.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Subcommand;

use mt_core::{CatalogLookup, CatalogService};
use mt_db::Database;

#[derive(Debug, Subcommand)]
pub enum EditCommand {
    /// Edit a client.
    Client {
        /// Current client code.
        code: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "code", value_name = "NEW_CODE")]
        new_code: Option<String>,
    },
    /// Edit a billing category.
    Category {
        /// Current category code.
        code: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "code", value_name = "NEW_CODE")]
        new_code: Option<String>,
        #[arg(long)]
        rate: Option<f64>,
    },
    /// Edit a project.
    Project {
        /// Current project code.
        code: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "code", value_name = "NEW_CODE")]
        new_code: Option<String>,
        /// Move the project to the client with this code.
        #[arg(long)]
        client: Option<String>,
        /// Default category code.
        #[arg(long)]
        category: Option<String>,
    },
}

pub fn run<W: Write>(writer: &mut W, db: &Database, command: &EditCommand) -> Result<()> {
    let catalog = CatalogService::new(db);

    match command {
        EditCommand::Client {
            code,
            name,
            new_code,
        } => {
            let mut client = catalog
                .get_client_by_code(code)
                .with_context(|| format!("unknown client code {code}"))?;
            let changed = replace(&mut client.name, name.as_deref())
                | replace(&mut client.code, new_code.as_deref());
            if changed {
                catalog.update_client(&client)?;
            }
            report(writer, changed, "client", &client.code)?;
        }
        EditCommand::Category {
            code,
            name,
            new_code,
            rate,
        } => {
            let mut category = catalog
                .get_category_by_code(code)
                .with_context(|| format!("unknown category code {code}"))?;
            let mut changed = replace(&mut category.name, name.as_deref())
                | replace(&mut category.code, new_code.as_deref());
            if let Some(rate) = rate {
                category.rate = *rate;
                changed = true;
            }
            if changed {
                catalog.update_category(&category)?;
            }
            report(writer, changed, "category", &category.code)?;
        }
        EditCommand::Project {
            code,
            name,
            new_code,
            client,
            category,
        } => {
            let mut project = catalog
                .get_project_by_code(code)
                .with_context(|| format!("unknown project code {code}"))?;
            let mut changed = replace(&mut project.name, name.as_deref())
                | replace(&mut project.code, new_code.as_deref());
            if let Some(client) = client {
                project.client_id = catalog
                    .get_client_by_code(client)
                    .with_context(|| format!("unknown client code {client}"))?
                    .id;
                changed = true;
            }
            if let Some(category) = category {
                project.default_category_id = catalog
                    .get_category_by_code(category)
                    .with_context(|| format!("unknown category code {category}"))?
                    .id;
                changed = true;
            }
            if changed {
                catalog.update_project(&project)?;
            }
            report(writer, changed, "project", &project.code)?;
        }
    }

    Ok(())
}

fn replace(field: &mut String, value: Option<&str>) -> bool {
    match value {
        Some(value) => {
            value.clone_into(field);
            true
        }
        None => false,
    }
}

fn report<W: Write>(writer: &mut W, changed: bool, entity: &str, code: &str) -> Result<()> {
    if changed {
        writeln!(writer, "Updated {entity} {code}")?;
    } else {
        writeln!(writer, "Nothing to change for {entity} {code}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use mt_core::{Category, Client, Project};

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        let catalog = CatalogService::new(&db);
        for (name, code) in [("Acme", "acme"), ("Zeta", "zeta")] {
            catalog
                .create_client(Client {
                    id: 0,
                    name: name.to_string(),
                    code: code.to_string(),
                    archived: false,
                })
                .unwrap();
        }
        catalog
            .create_category(Category {
                id: 0,
                name: "Dev".to_string(),
                code: "dev".to_string(),
                rate: 50.0,
                archived: false,
            })
            .unwrap();
        catalog
            .create_project(Project {
                id: 0,
                name: "Site".to_string(),
                code: "site".to_string(),
                client_id: 1,
                default_category_id: 1,
                archived: false,
            })
            .unwrap();
        db
    }

    fn edit(db: &Database, command: &EditCommand) -> String {
        let mut output = Vec::new();
        run(&mut output, db, command).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn edit_client_changes_only_given_fields() {
        let db = seeded();
        let output = edit(
            &db,
            &EditCommand::Client {
                code: "acme".to_string(),
                name: None,
                new_code: Some("acm".to_string()),
            },
        );
        assert_eq!(output, "Updated client acm\n");

        let client = CatalogService::new(&db).get_client_by_id(1).unwrap();
        assert_eq!(client.name, "Acme");
        assert_eq!(client.code, "acm");
    }

    #[test]
    fn edit_without_flags_writes_nothing() {
        let db = seeded();
        let output = edit(
            &db,
            &EditCommand::Category {
                code: "dev".to_string(),
                name: None,
                new_code: None,
                rate: None,
            },
        );
        assert_eq!(output, "Nothing to change for category dev\n");
    }

    #[test]
    fn edit_category_rate() {
        let db = seeded();
        edit(
            &db,
            &EditCommand::Category {
                code: "dev".to_string(),
                name: None,
                new_code: None,
                rate: Some(65.5),
            },
        );

        let category = CatalogService::new(&db).get_category_by_code("dev").unwrap();
        assert!((category.rate - 65.5).abs() < f64::EPSILON);
    }

    #[test]
    fn edit_project_moves_it_to_another_client() {
        let db = seeded();
        edit(
            &db,
            &EditCommand::Project {
                code: "site".to_string(),
                name: Some("Website".to_string()),
                new_code: None,
                client: Some("zeta".to_string()),
                category: None,
            },
        );

        let project = CatalogService::new(&db).get_project_by_code("site").unwrap();
        assert_eq!(project.name, "Website");
        assert_eq!(project.client_id, 2);
    }

    #[test]
    fn edit_unknown_code_fails() {
        let db = seeded();
        let mut output = Vec::new();
        let err = run(
            &mut output,
            &db,
            &EditCommand::Project {
                code: "nope".to_string(),
                name: None,
                new_code: None,
                client: None,
                category: None,
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "unknown project code nope");
    }
}
