use crate::auth::AccessToken;
use crate::error::{SyncError, SyncResult};
use crate::model::{CalendarEvent, EventDate, NewEvent};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::cell::RefCell;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The two calls the reconciler needs from a calendar backend.
pub trait CalendarService {
    fn list_events(
        &self,
        calendar_id: &str,
        text_query: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> SyncResult<Vec<CalendarEvent>>;

    fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> SyncResult<CalendarEvent>;
}

/// Google Calendar v3 over blocking HTTP with a pre-issued bearer token.
pub struct GoogleCalendarClient {
    client: Client,
    base_url: Url,
    token: String,
}

#[derive(Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

impl GoogleCalendarClient {
    pub fn new(base_url: &str, token: &AccessToken) -> SyncResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| SyncError::Config(format!("invalid calendar api url: {err}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| SyncError::calendar("client setup", err))?;

        Ok(Self {
            client,
            base_url,
            token: token.token.clone(),
        })
    }

    fn events_url(&self, calendar_id: &str) -> SyncResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::Config("calendar api url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }
}

impl CalendarService for GoogleCalendarClient {
    fn list_events(
        &self,
        calendar_id: &str,
        text_query: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> SyncResult<Vec<CalendarEvent>> {
        let url = self.events_url(calendar_id)?;
        let time_min = format_rfc3339(time_min);
        let time_max = format_rfc3339(time_max);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(&[
                ("q", text_query),
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .map_err(|err| SyncError::calendar("list", err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SyncError::calendar(
                "list",
                format!("status {status}: {}", body.trim()),
            ));
        }

        let list: EventList = response
            .json()
            .map_err(|err| SyncError::calendar("list", err))?;
        debug!(query = text_query, found = list.items.len(), "listed events");
        Ok(list.items)
    }

    fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> SyncResult<CalendarEvent> {
        let url = self.events_url(calendar_id)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(event)
            .send()
            .map_err(|err| SyncError::calendar("insert", err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SyncError::calendar(
                "insert",
                format!("status {status}: {}", body.trim()),
            ));
        }

        response
            .json()
            .map_err(|err| SyncError::calendar("insert", err))
    }
}

/// Calendar kept in process memory. Used by the harness and by tests; its
/// text query mirrors the live service closely enough for the idempotence
/// check (case-insensitive substring of the summary).
#[derive(Default)]
pub struct InMemoryCalendar {
    events: RefCell<Vec<(String, CalendarEvent)>>,
    next_id: RefCell<u64>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self, calendar_id: &str) -> Vec<CalendarEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|(id, _)| id == calendar_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl CalendarService for InMemoryCalendar {
    fn list_events(
        &self,
        calendar_id: &str,
        text_query: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> SyncResult<Vec<CalendarEvent>> {
        let needle = text_query.to_lowercase();
        let window_start = time_min.date_naive();
        let window_end = time_max.date_naive();

        Ok(self
            .events
            .borrow()
            .iter()
            .filter(|(id, _)| id == calendar_id)
            .map(|(_, event)| event)
            .filter(|event| {
                event
                    .summary
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .filter(|event| {
                let (Some(start), Some(end)) = (all_day(&event.start), all_day(&event.end)) else {
                    return false;
                };
                start < window_end && end > window_start
            })
            .cloned()
            .collect())
    }

    fn insert_event(&self, calendar_id: &str, event: &NewEvent) -> SyncResult<CalendarEvent> {
        let id = {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            format!("mem-{next}")
        };

        let stored = CalendarEvent {
            id: Some(id),
            summary: Some(event.summary.clone()),
            location: Some(event.location.clone()),
            description: event.description.clone(),
            html_link: None,
            start: Some(event.start.clone()),
            end: Some(event.end.clone()),
        };
        self.events
            .borrow_mut()
            .push((calendar_id.to_string(), stored.clone()));
        Ok(stored)
    }
}

fn all_day(date: &Option<EventDate>) -> Option<NaiveDate> {
    date.as_ref().and_then(|d| d.date)
}

fn format_rfc3339(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
