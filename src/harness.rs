use crate::calendar::InMemoryCalendar;
use crate::pipeline::{ConfigOptions, load_run_config, sync_tournaments};
use anyhow::Result;
use serde::Serialize;

const HARNESS_CALENDAR_ID: &str = "harness@local";

#[derive(Debug, Clone, Default)]
pub struct HarnessOptions {
    pub config: ConfigOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub matched: usize,
    pub date_errors: usize,
    pub first_run_created: usize,
    pub first_run_already_exists: usize,
    pub second_run_created: usize,
    pub second_run_already_exists: usize,
    pub total_events: usize,
}

/// Runs the pipeline twice against a fresh in-memory calendar. A stable
/// source must create nothing on the second pass.
pub fn run_harness(options: &HarnessOptions) -> Result<HarnessReport> {
    let mut config = load_run_config(&options.config)?;
    config.calendar.calendar_id = Some(HARNESS_CALENDAR_ID.to_string());

    let calendar = InMemoryCalendar::new();
    let first = sync_tournaments(&config, &calendar, false)?;
    let second = sync_tournaments(&config, &calendar, false)?;

    Ok(HarnessReport {
        matched: first.tournaments_matched,
        date_errors: first.date_errors,
        first_run_created: first.created,
        first_run_already_exists: first.already_exists,
        second_run_created: second.created,
        second_run_already_exists: second.already_exists,
        total_events: calendar.events(HARNESS_CALENDAR_ID).len(),
    })
}
