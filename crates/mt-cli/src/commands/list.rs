//! List command for clients, categories and projects.
//!
//! Listings show either active or archived entries, never both. `--name`
//! matches a substring of the name or code, ignoring case.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};

use mt_core::{
    CatalogLookup, CatalogService, Category, CategorySearch, Client, ClientSearch, Project,
    ProjectSearch,
};
use mt_db::Database;

use super::util::truncate;

const CODE_WIDTH: usize = 8;
const NAME_WIDTH: usize = 24;

#[derive(Debug, Subcommand)]
pub enum ListCommand {
    /// List clients.
    Clients(ListArgs),
    /// List billing categories.
    Categories(ListArgs),
    /// List projects.
    Projects {
        #[command(flatten)]
        filter: ListArgs,
        /// Only projects whose client name or code contains this.
        #[arg(long, default_value = "")]
        client: String,
    },
}

#[derive(Debug, Default, Args)]
pub struct ListArgs {
    /// Show archived entries instead of active ones.
    #[arg(long)]
    pub archived: bool,
    /// Only entries whose name or code contains this.
    #[arg(long, default_value = "")]
    pub name: String,
}

/// A project joined with its client and default category codes.
#[derive(Debug, Clone)]
pub struct ProjectRow {
    pub project: Project,
    pub client_code: String,
    pub category_code: String,
}

pub fn run<W: Write>(writer: &mut W, db: &Database, command: &ListCommand) -> Result<()> {
    let catalog = CatalogService::new(db);

    let output = match command {
        ListCommand::Clients(args) => format_clients(&catalog.list_clients(&ClientSearch {
            archived: args.archived,
            name: args.name.clone(),
        })?),
        ListCommand::Categories(args) => {
            format_categories(&catalog.list_categories(&CategorySearch {
                archived: args.archived,
                name: args.name.clone(),
            })?)
        }
        ListCommand::Projects { filter, client } => {
            let projects = catalog.list_projects(&ProjectSearch {
                archived: filter.archived,
                name: filter.name.clone(),
                client: client.clone(),
            })?;
            format_projects(&project_rows(&catalog, projects))
        }
    };

    write!(writer, "{output}")?;
    Ok(())
}

/// Joins projects with their catalog codes; unresolved references show as `?`.
pub fn project_rows<C: CatalogLookup>(catalog: &C, projects: Vec<Project>) -> Vec<ProjectRow> {
    projects
        .into_iter()
        .map(|project| ProjectRow {
            client_code: catalog
                .get_client_by_id(project.client_id)
                .map_or_else(|_| "?".to_string(), |c| c.code),
            category_code: catalog
                .get_category_by_id(project.default_category_id)
                .map_or_else(|_| "?".to_string(), |c| c.code),
            project,
        })
        .collect()
}

pub fn format_clients(clients: &[Client]) -> String {
    let mut output = String::new();

    if clients.is_empty() {
        writeln!(output, "No clients found.").unwrap();
        return output;
    }

    writeln!(output, "{:<CODE_WIDTH$}  NAME", "CODE").unwrap();
    writeln!(output, "────────  ────────────────────────").unwrap();
    for client in clients {
        writeln!(
            output,
            "{:<CODE_WIDTH$}  {}",
            client.code,
            truncate(&client.name, NAME_WIDTH)
        )
        .unwrap();
    }

    output
}

pub fn format_categories(categories: &[Category]) -> String {
    let mut output = String::new();

    if categories.is_empty() {
        writeln!(output, "No categories found.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<CODE_WIDTH$}  {:<NAME_WIDTH$}  {:>8}",
        "CODE", "NAME", "RATE"
    )
    .unwrap();
    writeln!(output, "────────  ────────────────────────  ────────").unwrap();
    for category in categories {
        writeln!(
            output,
            "{:<CODE_WIDTH$}  {:<NAME_WIDTH$}  {:>8.2}",
            category.code,
            truncate(&category.name, NAME_WIDTH),
            category.rate
        )
        .unwrap();
    }

    output
}

pub fn format_projects(rows: &[ProjectRow]) -> String {
    let mut output = String::new();

    if rows.is_empty() {
        writeln!(output, "No projects found.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<CODE_WIDTH$}  {:<NAME_WIDTH$}  {:<CODE_WIDTH$}  CATEGORY",
        "CODE", "NAME", "CLIENT"
    )
    .unwrap();
    writeln!(output, "────────  ────────────────────────  ────────  ────────").unwrap();
    for row in rows {
        writeln!(
            output,
            "{:<CODE_WIDTH$}  {:<NAME_WIDTH$}  {:<CODE_WIDTH$}  {}",
            row.project.code,
            truncate(&row.project.name, NAME_WIDTH),
            row.client_code,
            row.category_code
        )
        .unwrap();
    }

    output
}
