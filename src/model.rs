use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// One row of the federation calendar that passed the retention filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TournamentRecord {
    pub name: String,
    pub raw_date_range: String,
    pub month: String,
    pub year: i32,
    pub country: String,
    pub city: String,
    pub category: String,
    pub prize_money: Option<String>,
    pub source_link: Option<String>,
}

impl TournamentRecord {
    pub fn summary(&self) -> String {
        format!("{} ({})", self.name, self.category)
    }

    pub fn location(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }

    pub fn description(&self) -> Option<String> {
        let mut lines = Vec::new();
        if let Some(prize) = &self.prize_money {
            lines.push(format!("Prize Money: {prize}"));
        }
        if let Some(link) = &self.source_link {
            lines.push(format!("Details: {link}"));
        }

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

/// Inclusive first and last day of a tournament. `end >= start` always holds
/// for values produced by the resolver.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ResolvedDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ResolvedDateRange {
    /// All-day spans are written with an exclusive end date. The resolver
    /// rejects ranges whose following day does not exist, so the fallback to
    /// `end` is only reachable for ranges built by hand at `NaiveDate::MAX`.
    pub fn end_exclusive(&self) -> NaiveDate {
        self.end.checked_add_days(Days::new(1)).unwrap_or(self.end)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTournament {
    #[serde(flatten)]
    pub record: TournamentRecord,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventDate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

impl EventDate {
    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            date_time: None,
        }
    }
}

/// Event as stored by the calendar service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDate>,
}

/// Insert body for an all-day tournament event.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewEvent {
    pub summary: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventDate,
    pub end: EventDate,
}

impl NewEvent {
    pub fn for_tournament(record: &TournamentRecord, dates: &ResolvedDateRange) -> Self {
        Self {
            summary: record.summary(),
            location: record.location(),
            description: record.description(),
            start: EventDate::all_day(dates.start),
            end: EventDate::all_day(dates.end_exclusive()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RunReport {
    pub page_fetched: bool,
    pub tournaments_matched: usize,
    pub created: usize,
    pub already_exists: usize,
    pub would_create: usize,
    pub date_errors: usize,
    pub service_errors: usize,
}
