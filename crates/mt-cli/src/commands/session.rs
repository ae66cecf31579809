//! Session commands: the timer, billing transitions and reports.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Local, TimeZone, Utc};
use clap::{Args, Subcommand};

use mt_core::{
    ActiveTimer, CatalogLookup, CatalogService, Session, SessionLifecycle, SessionService,
};
use mt_db::Database;

use super::report::{self, ReportArgs};
use super::timer;
use super::util::{format_duration, format_time};
use crate::Config;

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Start the timer for a project.
    Start(StartArgs),
    /// Stop the timer and record the session.
    Stop,
    /// Show the running timer.
    Status,
    /// Mark sessions invoiced.
    Invoice {
        /// Session ids.
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Mark a session invoiced and paid.
    Close { id: i64 },
    /// List sessions.
    Report(ReportArgs),
}

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Project code.
    pub project: String,
    /// What the session is about.
    pub notes: String,
    /// Category code; defaults to the project's category.
    #[arg(long)]
    pub category: Option<String>,
    /// Keep running and show elapsed time until the quit key is pressed.
    #[arg(short, long)]
    pub interactive: bool,
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    command: &SessionCommand,
    config: &Config,
) -> Result<()> {
    match command {
        SessionCommand::Start(args) => start(writer, db, args, config),
        SessionCommand::Stop => stop(writer, db),
        SessionCommand::Status => status(writer, db),
        SessionCommand::Invoice { ids } => invoice(writer, db, ids),
        SessionCommand::Close { id } => close(writer, db, *id),
        SessionCommand::Report(args) => report::run(writer, db, args),
    }
}

pub fn start<W: Write>(
    writer: &mut W,
    db: &Database,
    args: &StartArgs,
    config: &Config,
) -> Result<()> {
    let catalog = CatalogService::new(db);
    let sessions = SessionService::new(db, &catalog);

    let project = catalog
        .get_project_by_code(&args.project)
        .with_context(|| format!("unknown project code {}", args.project))?;
    let client = catalog
        .get_client_by_id(project.client_id)
        .with_context(|| format!("project {} has no client", project.code))?;
    let category = match &args.category {
        Some(code) => catalog
            .get_category_by_code(code)
            .with_context(|| format!("unknown category code {code}"))?,
        None => catalog
            .get_category_by_id(project.default_category_id)
            .with_context(|| format!("project {} has no default category", project.code))?,
    };

    sessions.ensure_no_active_session()?;
    let (_, start) =
        sessions.start_active_session(project.id, category.id, client.id, &args.notes)?;
    writeln!(
        writer,
        "Started {} for {} ({}) at {}",
        project.code,
        client.name,
        category.code,
        format_time(start, &Local)
    )?;

    if args.interactive {
        writeln!(writer, "Press '{}' to stop.", config.quit_key)?;
        writer.flush()?;
        let end = timer::run_interactive(start, config.quit_key)?;
        let session = sessions.stop_active_session(end)?;
        write_recorded(writer, &session, &Local)?;
    }

    Ok(())
}

pub fn stop<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let catalog = CatalogService::new(db);
    let sessions = SessionService::new(db, &catalog);

    let session = match sessions.stop_active_session(Utc::now()) {
        Ok(session) => session,
        Err(err) if err.is_not_found() => bail!("no active session"),
        Err(err) => return Err(err.into()),
    };
    write_recorded(writer, &session, &Local)
}

pub fn status<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let catalog = CatalogService::new(db);
    let sessions = SessionService::new(db, &catalog);

    let active = match sessions.get_active_session() {
        Ok(active) => active,
        Err(err) if err.is_not_found() => {
            writeln!(writer, "No active session.")?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let name_of = |found: mt_core::Result<String>| found.unwrap_or_else(|_| "?".to_string());
    writeln!(
        writer,
        "Project:  {}",
        name_of(catalog.get_project_by_id(active.project_id).map(|p| p.name))
    )?;
    writeln!(
        writer,
        "Client:   {}",
        name_of(catalog.get_client_by_id(active.client_id).map(|c| c.name))
    )?;
    writeln!(
        writer,
        "Category: {}",
        name_of(catalog.get_category_by_id(active.category_id).map(|c| c.name))
    )?;
    writeln!(writer, "Notes:    {}", active.notes)?;
    writeln!(writer, "Started:  {}", format_time(active.start_time, &Local))?;
    writeln!(
        writer,
        "Elapsed:  {}",
        format_duration(active.elapsed(Utc::now()))
    )?;
    Ok(())
}

/// Invoices every id, reporting each outcome. Fails if any id failed.
pub fn invoice<W: Write>(writer: &mut W, db: &Database, ids: &[i64]) -> Result<()> {
    let catalog = CatalogService::new(db);
    let sessions = SessionService::new(db, &catalog);

    let mut failed = 0;
    for (id, result) in ids.iter().zip(sessions.invoice_sessions(ids)) {
        match result {
            Ok(()) => writeln!(writer, "Invoiced session {id}")?,
            Err(failure) => {
                tracing::warn!(
                    session_id = failure.session_id,
                    error = %failure.source,
                    "invoice failed"
                );
                writeln!(writer, "Failed to invoice {failure}")?;
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} sessions could not be invoiced", ids.len());
    }
    Ok(())
}

pub fn close<W: Write>(writer: &mut W, db: &Database, id: i64) -> Result<()> {
    let catalog = CatalogService::new(db);
    let sessions = SessionService::new(db, &catalog);

    sessions
        .close_session(id)
        .with_context(|| format!("failed to close session {id}"))?;
    writeln!(writer, "Closed session {id}")?;
    Ok(())
}

fn write_recorded<W, Tz>(writer: &mut W, session: &Session, tz: &Tz) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    writeln!(writer, "Recorded session {}", session.session_id)?;
    writeln!(writer, "Start: {}", format_time(session.start_date_time, tz))?;
    writeln!(writer, "End:   {}", format_time(session.end_date_time, tz))?;
    writeln!(writer, "Total: {}", format_duration(session.duration()))?;
    Ok(())
}
