//! Report command for listing recorded sessions with billable amounts.
//!
//! Without flags the report shows work that is neither invoiced nor paid.
//! `--invoiced` and `--paid` select those exact states instead, so
//! `--invoiced --paid` lists closed sessions.

use std::fmt::Display;
use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use clap::Args;
use serde::Serialize;

use mt_core::{
    CatalogLookup, CatalogService, Session, SessionQuery, SessionSearch, SessionService,
};
use mt_db::Database;

use super::util::{format_duration, format_time, truncate};

#[derive(Debug, Default, Args)]
pub struct ReportArgs {
    /// Paid sessions.
    #[arg(long)]
    pub paid: bool,
    /// Invoiced sessions.
    #[arg(long)]
    pub invoiced: bool,
    /// Only this category code.
    #[arg(long)]
    pub category: Option<String>,
    /// Only this client code.
    #[arg(long)]
    pub client: Option<String>,
    /// Only this project code.
    #[arg(long)]
    pub project: Option<String>,
    /// Only this session id.
    #[arg(long)]
    pub id: Option<i64>,
    /// Only these session ids, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<i64>,
    /// Output JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

impl ReportArgs {
    pub fn search(&self) -> SessionSearch {
        SessionSearch {
            paid: self.paid,
            invoiced: self.invoiced,
            category_code: self.category.clone().unwrap_or_default(),
            client_code: self.client.clone().unwrap_or_default(),
            project_code: self.project.clone().unwrap_or_default(),
            session_id: self.id.unwrap_or_default(),
            session_ids: self.ids.clone(),
        }
    }
}

/// One session joined with its catalog codes and priced at its category rate.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub session_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub client: String,
    pub project: String,
    pub category: String,
    pub minutes: i64,
    pub rate: f64,
    pub amount: f64,
    pub state: String,
    pub notes: String,
}

/// Builds report rows. Codes that no longer resolve show as `?` and price at zero.
pub fn build_rows<C: CatalogLookup>(catalog: &C, sessions: &[Session]) -> Vec<ReportRow> {
    sessions
        .iter()
        .map(|session| {
            let category = catalog.get_category_by_id(session.category_id).ok();
            let rate = category.as_ref().map_or(0.0, |c| c.rate);
            let minutes = session.duration().num_minutes().max(0);
            ReportRow {
                session_id: session.session_id,
                start: session.start_date_time,
                end: session.end_date_time,
                client: catalog
                    .get_client_by_id(session.client_id)
                    .map_or_else(|_| "?".to_string(), |c| c.code),
                project: catalog
                    .get_project_by_id(session.project_id)
                    .map_or_else(|_| "?".to_string(), |p| p.code),
                category: category.map_or_else(|| "?".to_string(), |c| c.code),
                minutes,
                rate,
                amount: amount(minutes, rate),
                state: session.state().to_string(),
                notes: session.notes.clone(),
            }
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn amount(minutes: i64, rate: f64) -> f64 {
    let amount = minutes as f64 / 60.0 * rate;
    (amount * 100.0).round() / 100.0
}

// ========== Human-Readable Output ==========

/// Format report rows as a table, with times shown in `tz`.
pub fn format_report<Tz>(rows: &[ReportRow], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut output = String::new();

    if rows.is_empty() {
        writeln!(output, "No sessions found.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:>4}  {:<16}  {:<8}  {:<8}  {:<8}  {:>8}  {:>9}  {:<8}  NOTES",
        "ID", "START", "CLIENT", "PROJECT", "CATEGORY", "DURATION", "AMOUNT", "STATE"
    )
    .unwrap();
    writeln!(
        output,
        "────  ────────────────  ────────  ────────  ────────  ────────  ─────────  ────────  ────────────"
    )
    .unwrap();

    for row in rows {
        writeln!(
            output,
            "{:>4}  {:<16}  {:<8}  {:<8}  {:<8}  {:>8}  {:>9.2}  {:<8}  {}",
            row.session_id,
            format_time(row.start, tz),
            row.client,
            row.project,
            row.category,
            format_duration(Duration::minutes(row.minutes)),
            row.amount,
            row.state,
            truncate(&row.notes, 40)
        )
        .unwrap();
    }

    let (minutes, amount) = totals(rows);
    writeln!(output).unwrap();
    writeln!(
        output,
        "Total: {} across {} sessions, {:.2}",
        format_duration(Duration::minutes(minutes)),
        rows.len(),
        amount
    )
    .unwrap();

    output
}

fn totals(rows: &[ReportRow]) -> (i64, f64) {
    let minutes = rows.iter().map(|r| r.minutes).sum::<i64>();
    let amount = rows.iter().map(|r| r.amount).sum::<f64>();
    (minutes, (amount * 100.0).round() / 100.0)
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub sessions: Vec<ReportRow>,
    pub total_minutes: i64,
    pub total_amount: f64,
}

pub fn format_report_json(rows: &[ReportRow]) -> Result<String> {
    let (total_minutes, total_amount) = totals(rows);
    let report = JsonReport {
        sessions: rows.to_vec(),
        total_minutes,
        total_amount,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

pub fn run<W: Write>(writer: &mut W, db: &Database, args: &ReportArgs) -> Result<()> {
    let catalog = CatalogService::new(db);
    let sessions = SessionService::new(db, &catalog);

    let found = sessions.list_sessions(&args.search())?;
    tracing::debug!(count = found.len(), "listed sessions for report");
    let rows = build_rows(&catalog, &found);

    if args.json {
        writeln!(writer, "{}", format_report_json(&rows)?)?;
    } else {
        write!(writer, "{}", format_report(&rows, &Local))?;
    }
    Ok(())
}
