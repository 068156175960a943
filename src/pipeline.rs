use crate::auth::authenticate;
use crate::calendar::{CalendarService, GoogleCalendarClient};
use crate::config::{FetchMode, SyncConfig, load_config};
use crate::error::SyncResult;
use crate::fetch::fetch_calendar_page;
use crate::model::{ResolvedTournament, RunReport, TournamentRecord};
use crate::parser::{TournamentFilter, extract_tournaments};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::resolve::resolve_date_range;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{error, info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "bwfcal.toml";

#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub config_path: Option<PathBuf>,
    pub source_file: Option<PathBuf>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub config: ConfigOptions,
    pub dry_run: bool,
}

/// Config file, then environment, then command-line overrides.
pub fn load_run_config(options: &ConfigOptions) -> SyncResult<SyncConfig> {
    let mut config = match &options.config_path {
        Some(path) => load_config(path, true)?,
        None => load_config(&PathBuf::from(DEFAULT_CONFIG_PATH), false)?,
    };
    config.apply_env_overrides()?;

    if let Some(file) = &options.source_file {
        config.fetch.mode = FetchMode::File;
        config.fetch.file_path = Some(file.clone());
    }
    if let Some(year) = options.year {
        config.extract.year = year;
    }

    config.validate()?;
    Ok(config)
}

pub fn run_sync(options: &SyncOptions) -> Result<RunReport> {
    let config = load_run_config(&options.config)?;
    let calendar_id = config.require_calendar_id()?.to_string();

    let token = authenticate(&config.calendar).context("calendar authentication failed")?;
    let client = GoogleCalendarClient::new(&config.calendar.api_base_url, &token)?;

    info!(calendar = %calendar_id, dry_run = options.dry_run, "sync start");
    let report = sync_tournaments(&config, &client, options.dry_run)?;
    Ok(report)
}

/// Fetches and parses the page. Page-level failures are logged and yield
/// an empty list so the run still completes.
pub fn scrape_tournaments(config: &SyncConfig) -> (bool, Vec<TournamentRecord>) {
    let doc = match fetch_calendar_page(&config.fetch) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(error = %err, "calendar page fetch failed; treating run as empty");
            return (false, Vec::new());
        }
    };

    let filter = TournamentFilter::new(&config.filter);
    match extract_tournaments(&doc.body, &config.extract, &filter) {
        Ok(records) => (true, records),
        Err(err) => {
            warn!(url = %doc.source_url, error = %err, "tournament extraction failed");
            (true, Vec::new())
        }
    }
}

pub fn sync_tournaments<C: CalendarService + ?Sized>(
    config: &SyncConfig,
    calendar: &C,
    dry_run: bool,
) -> SyncResult<RunReport> {
    let calendar_id = config.require_calendar_id()?;
    let reconciler = Reconciler::new(calendar, calendar_id).dry_run(dry_run);

    let (page_fetched, records) = scrape_tournaments(config);
    let mut report = RunReport {
        page_fetched,
        tournaments_matched: records.len(),
        ..RunReport::default()
    };

    if records.is_empty() {
        info!("no tournaments found that match the criteria");
    }

    for record in &records {
        let dates = match resolve_date_range(&record.raw_date_range, &record.month, record.year) {
            Ok(dates) => dates,
            Err(err) => {
                warn!(tournament = %record.name, error = %err, "skipping tournament");
                report.date_errors += 1;
                continue;
            }
        };

        match reconciler.reconcile(record, &dates) {
            Ok(ReconcileOutcome::Created { event_id, .. }) => {
                info!(
                    tournament = %record.name,
                    start = %dates.start,
                    end = %dates.end,
                    event_id = event_id.as_deref().unwrap_or("-"),
                    "created event"
                );
                report.created += 1;
            }
            Ok(ReconcileOutcome::AlreadyExists { matches }) => {
                info!(tournament = %record.name, matches, "already exists; skipped");
                report.already_exists += 1;
            }
            Ok(ReconcileOutcome::WouldCreate) => {
                info!(
                    tournament = %record.name,
                    start = %dates.start,
                    end = %dates.end,
                    "dry run; would create event"
                );
                report.would_create += 1;
            }
            Err(err) => {
                error!(tournament = %record.name, error = %err, "calendar update failed");
                report.service_errors += 1;
            }
        }
    }

    info!(
        fetched = report.page_fetched,
        matched = report.tournaments_matched,
        created = report.created,
        already_exists = report.already_exists,
        would_create = report.would_create,
        date_errors = report.date_errors,
        service_errors = report.service_errors,
        "sync summary"
    );

    Ok(report)
}

/// Scrapes and resolves without touching any calendar.
pub fn list_tournaments(config: &SyncConfig) -> Vec<ResolvedTournament> {
    let (_, records) = scrape_tournaments(config);

    records
        .into_iter()
        .filter_map(|record| {
            match resolve_date_range(&record.raw_date_range, &record.month, record.year) {
                Ok(dates) => Some(ResolvedTournament {
                    start_date: dates.start,
                    end_date: dates.end,
                    record,
                }),
                Err(err) => {
                    warn!(tournament = %record.name, error = %err, "skipping tournament");
                    None
                }
            }
        })
        .collect()
}

pub fn validate_config(options: &ConfigOptions) -> Result<Vec<String>> {
    let config = load_run_config(options)?;
    let mut messages = vec![format!(
        "OK: source {} ({:?} mode), season {}",
        match config.fetch.mode {
            FetchMode::Http => config.fetch.url.clone(),
            FetchMode::File => config
                .fetch
                .file_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        },
        config.fetch.mode,
        config.extract.year
    )];

    match config.require_calendar_id() {
        Ok(id) => messages.push(format!("OK: calendar {id}")),
        Err(err) => messages.push(format!("MISSING: {err}")),
    }

    let key_path = &config.calendar.service_account_key_path;
    if key_path.exists() {
        messages.push(format!("OK: credentials {}", key_path.display()));
    } else {
        messages.push(format!("MISSING: credentials {}", key_path.display()));
    }

    Ok(messages)
}
