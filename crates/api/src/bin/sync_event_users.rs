//! sync-event-users - pull member profiles from the club and grant tickets
//!
//! ```text
//! sync-event-users --slugs alice,bob --event-id summer-camp
//! ```
//!
//! Without `--event-id` members are only created or refreshed.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use events_api::config::Config;
use events_api::middleware::logging::init_logging;
use events_api::services::club::ClubClient;
use events_api::services::event_sync::{parse_slugs, EventSync, SyncReport};

#[derive(Debug, Parser)]
#[command(name = "sync-event-users", version, about = "Sync club members and grant event tickets")]
struct Args {
    /// Comma-separated member slugs
    #[arg(long)]
    slugs: String,

    /// Event to grant a ticket for
    #[arg(long = "event-id")]
    event_id: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<SyncReport> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("loading configuration")?;
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("logging: {}", e))?;

    let pool = persistence::db::create_pool(&config.database.pool_config())
        .await
        .context("connecting to the database")?;
    let club = ClubClient::new(config.club.clone()).context("club client")?;

    let slugs = parse_slugs(&args.slugs);
    let report = EventSync::new(pool, club)
        .run(&slugs, args.event_id.as_deref())
        .await?;

    write_report(&report, &mut io::stdout().lock(), &mut io::stderr().lock())
        .context("writing the report")?;

    Ok(report)
}

/// Synced members go to `out`. Failures, and the summary of a failed run, go
/// to `err`.
fn write_report(report: &SyncReport, out: &mut impl Write, err: &mut impl Write) -> io::Result<()> {
    for user in &report.synced {
        match user.ticket_code {
            Some(code) => writeln!(out, "OK   {} <{}> ticket #{}", user.slug, user.email, code)?,
            None => writeln!(out, "OK   {} <{}>", user.slug, user.email)?,
        }
    }
    for (slug, reason) in &report.failed {
        writeln!(err, "FAIL {}: {}", slug, reason)?;
    }

    let summary = format!(
        "{} synced, {} failed, {} tickets created",
        report.synced.len(),
        report.failed.len(),
        report.tickets_created
    );
    if report.is_success() {
        writeln!(out, "{}", summary)
    } else {
        writeln!(err, "{}", summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events_api::services::event_sync::SyncedUser;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["sync-event-users", "--slugs", "a,b", "--event-id", "camp"])
            .unwrap();
        assert_eq!(args.slugs, "a,b");
        assert_eq!(args.event_id.as_deref(), Some("camp"));

        assert!(Args::try_parse_from(["sync-event-users"]).is_err());
    }

    #[test]
    fn test_failures_go_to_stderr() {
        let report = SyncReport {
            synced: vec![SyncedUser {
                slug: "alice".to_string(),
                email: "alice@example.com".to_string(),
                ticket_code: Some(7),
            }],
            failed: vec![("bob".to_string(), "not found".to_string())],
            tickets_created: 1,
        };
        let (mut out, mut err) = (Vec::new(), Vec::new());
        write_report(&report, &mut out, &mut err).unwrap();

        let out = String::from_utf8(out).unwrap();
        let err = String::from_utf8(err).unwrap();
        assert_eq!(out, "OK   alice <alice@example.com> ticket #7\n");
        assert!(err.starts_with("FAIL bob: not found\n"));
        assert!(err.contains("1 synced, 1 failed, 1 tickets created"));
    }

    #[test]
    fn test_clean_run_reports_on_stdout() {
        let report = SyncReport::default();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        write_report(&report, &mut out, &mut err).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 synced, 0 failed, 0 tickets created\n");
        assert!(err.is_empty());
    }
}
