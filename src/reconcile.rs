use crate::calendar::CalendarService;
use crate::error::SyncResult;
use crate::model::{NewEvent, ResolvedDateRange, TournamentRecord};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created {
        event_id: Option<String>,
        html_link: Option<String>,
    },
    AlreadyExists {
        matches: usize,
    },
    WouldCreate,
}

/// Makes sure each tournament appears once in the target calendar. The
/// existence check is a live query, so two concurrent runs can still race.
pub struct Reconciler<'a, C: CalendarService + ?Sized> {
    calendar: &'a C,
    calendar_id: &'a str,
    dry_run: bool,
}

impl<'a, C: CalendarService + ?Sized> Reconciler<'a, C> {
    pub fn new(calendar: &'a C, calendar_id: &'a str) -> Self {
        Self {
            calendar,
            calendar_id,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn reconcile(
        &self,
        record: &TournamentRecord,
        dates: &ResolvedDateRange,
    ) -> SyncResult<ReconcileOutcome> {
        let existing = self.calendar.list_events(
            self.calendar_id,
            &record.name,
            midnight_utc(dates.start),
            midnight_utc(dates.end_exclusive()),
        )?;

        if !existing.is_empty() {
            return Ok(ReconcileOutcome::AlreadyExists {
                matches: existing.len(),
            });
        }

        if self.dry_run {
            return Ok(ReconcileOutcome::WouldCreate);
        }

        let event = NewEvent::for_tournament(record, dates);
        let created = self.calendar.insert_event(self.calendar_id, &event)?;
        Ok(ReconcileOutcome::Created {
            event_id: created.id,
            html_link: created.html_link,
        })
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
