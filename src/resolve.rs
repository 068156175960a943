use crate::error::{SyncError, SyncResult};
use crate::model::ResolvedDateRange;
use chrono::{Days, Months, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

static DAY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)?\.?\s*([A-Za-z]+)?\.?$")
        .expect("day token regex must compile")
});

/// Turns a free-text range such as `"18 - 24"` or `"28 Jul - 3 Aug"` into
/// concrete dates. Day-only tokens take `month`; tokens naming their own
/// month use it instead. An end before the start is moved one month later.
pub fn resolve_date_range(raw: &str, month: &str, year: i32) -> SyncResult<ResolvedDateRange> {
    let fail = |reason: String| SyncError::DateParse {
        raw: raw.to_string(),
        month: month.to_string(),
        year,
        reason,
    };

    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Err(fail("empty date text".to_string()));
    }

    let section_month = month_number(month);

    let (start_token, end_token) = match normalized.split_once(is_range_separator) {
        Some((left, right)) if !right.trim().is_empty() => (left.trim(), Some(right.trim())),
        Some((left, _)) => (left.trim(), None),
        None => (normalized.as_str(), None),
    };

    let start = parse_day_token(start_token, section_month, year).map_err(&fail)?;
    let Some(end_token) = end_token else {
        return checked_range(start, start).map_err(&fail);
    };

    let mut end = parse_day_token(end_token, section_month, year).map_err(&fail)?;
    if end < start {
        end = end
            .checked_add_months(Months::new(1))
            .ok_or_else(|| fail("end date overflow".to_string()))?;
    }
    if end < start {
        return Err(fail(format!("end {end} still precedes start {start}")));
    }

    checked_range(start, end).map_err(&fail)
}

/// The day after `end` must be representable so the all-day write can use it.
fn checked_range(start: NaiveDate, end: NaiveDate) -> Result<ResolvedDateRange, String> {
    end.checked_add_days(Days::new(1))
        .ok_or_else(|| format!("no day follows {end}"))?;
    Ok(ResolvedDateRange { start, end })
}

fn is_range_separator(c: char) -> bool {
    matches!(c, '-' | '\u{2013}' | '\u{2014}')
}

fn parse_day_token(
    token: &str,
    section_month: Option<u32>,
    year: i32,
) -> Result<NaiveDate, String> {
    let caps = DAY_TOKEN
        .captures(token)
        .ok_or_else(|| format!("unrecognised day token {token:?}"))?;

    let day = caps
        .get(1)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .ok_or_else(|| format!("missing day in {token:?}"))?;

    let month = match caps.get(2) {
        Some(name) => month_number(name.as_str())
            .ok_or_else(|| format!("unknown month name {:?}", name.as_str()))?,
        None => section_month.ok_or_else(|| "section month is not a month name".to_string())?,
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("{year}-{month:02}-{day:02} is not a calendar date"))
}

/// Month number for a heading like `"August"`, `"Aug"` or `"August 2025"`.
pub fn month_number(text: &str) -> Option<u32> {
    let word = text
        .split(|c: char| !c.is_alphabetic())
        .find(|w| !w.is_empty())?
        .to_lowercase();
    if word.len() < 3 {
        return None;
    }

    MONTHS
        .iter()
        .position(|name| *name == word || name.starts_with(word.as_str()))
        .map(|idx| idx as u32 + 1)
}
