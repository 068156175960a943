use crate::dom::parse_selector;
use crate::error::{SyncError, SyncResult};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_CALENDAR_URL: &str = "https://corporate.bwfbadminton.com/events/calendar/";
pub const DEFAULT_GOOGLE_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub const ENV_CALENDAR_ID: &str = "GOOGLE_CALENDAR_ID";
pub const ENV_SERVICE_ACCOUNT_FILE: &str = "GOOGLE_SERVICE_ACCOUNT_FILE";
pub const ENV_SOURCE_URL: &str = "BWF_CALENDAR_URL";
pub const ENV_SEASON_YEAR: &str = "BWF_SEASON_YEAR";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SyncConfig {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

impl SyncConfig {
    pub fn validate(&self) -> SyncResult<()> {
        match self.fetch.mode {
            FetchMode::Http => {
                Url::parse(&self.fetch.url).map_err(|err| {
                    SyncError::Config(format!("fetch.url {:?} is invalid: {err}", self.fetch.url))
                })?;
            }
            FetchMode::File => {
                if self.fetch.file_path.is_none() {
                    return Err(SyncError::Config(
                        "fetch.file_path is required for file mode".to_string(),
                    ));
                }
            }
        }

        if self.fetch.timeout_secs == 0 {
            return Err(SyncError::Config(
                "fetch.timeout_secs must be positive".to_string(),
            ));
        }

        if !(1900..=2200).contains(&self.extract.year) {
            return Err(SyncError::Config(format!(
                "extract.year {} is out of range",
                self.extract.year
            )));
        }

        for (field, selector) in self.extract.selectors() {
            parse_selector(selector)
                .map_err(|err| SyncError::Config(format!("extract.{field}: {err}")))?;
        }

        if self.extract.row_class_prefix.trim().is_empty() {
            return Err(SyncError::Config(
                "extract.row_class_prefix must not be empty".to_string(),
            ));
        }

        if self.extract.min_columns < 7 {
            return Err(SyncError::Config(format!(
                "extract.min_columns {} cannot be below 7; the city sits in column 6",
                self.extract.min_columns
            )));
        }

        Url::parse(&self.calendar.api_base_url).map_err(|err| {
            SyncError::Config(format!(
                "calendar.api_base_url {:?} is invalid: {err}",
                self.calendar.api_base_url
            ))
        })?;

        Ok(())
    }

    /// Sync cannot start without a target calendar.
    pub fn require_calendar_id(&self) -> SyncResult<&str> {
        self.calendar
            .calendar_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                SyncError::Config(format!(
                    "calendar.calendar_id is not set (set {ENV_CALENDAR_ID})"
                ))
            })
    }

    pub fn apply_env_overrides(&mut self) -> SyncResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> SyncResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(calendar_id) = lookup(ENV_CALENDAR_ID) {
            self.calendar.calendar_id = Some(calendar_id);
        }
        if let Some(path) = lookup(ENV_SERVICE_ACCOUNT_FILE) {
            self.calendar.service_account_key_path = PathBuf::from(path);
        }
        if let Some(url) = lookup(ENV_SOURCE_URL) {
            self.fetch.url = url;
        }
        if let Some(year) = lookup(ENV_SEASON_YEAR) {
            self.extract.year = year.trim().parse().map_err(|_| {
                SyncError::Config(format!("{ENV_SEASON_YEAR}={year:?} is not a year"))
            })?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub calendar_id: Option<String>,
    #[serde(default = "default_key_path")]
    pub service_account_key_path: PathBuf,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            calendar_id: None,
            service_account_key_path: default_key_path(),
            api_base_url: default_api_base_url(),
            scopes: default_scopes(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Http,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub mode: FetchMode,
    #[serde(default = "default_source_url")]
    pub url: String,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::Http,
            url: default_source_url(),
            file_path: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Structural markers of the calendar page. The season year is not
/// exposed per row by the page, so it is a run-wide setting.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default = "default_container_selector")]
    pub container_selector: String,
    #[serde(default = "default_month_selector")]
    pub month_selector: String,
    #[serde(default = "default_heading_selector")]
    pub heading_selector: String,
    #[serde(default = "default_table_selector")]
    pub table_selector: String,
    #[serde(default = "default_row_class_prefix")]
    pub row_class_prefix: String,
    #[serde(default = "default_detail_row_class")]
    pub detail_row_class: String,
    #[serde(default = "default_name_link_selector")]
    pub name_link_selector: String,
    #[serde(default = "default_prize_selector")]
    pub prize_selector: String,
    #[serde(default = "default_prize_prefix")]
    pub prize_prefix: String,
    #[serde(default = "default_min_columns")]
    pub min_columns: usize,
}

impl ExtractConfig {
    pub fn selectors(&self) -> [(&'static str, &str); 6] {
        [
            ("container_selector", self.container_selector.as_str()),
            ("month_selector", self.month_selector.as_str()),
            ("heading_selector", self.heading_selector.as_str()),
            ("table_selector", self.table_selector.as_str()),
            ("name_link_selector", self.name_link_selector.as_str()),
            ("prize_selector", self.prize_selector.as_str()),
        ]
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            container_selector: default_container_selector(),
            month_selector: default_month_selector(),
            heading_selector: default_heading_selector(),
            table_selector: default_table_selector(),
            row_class_prefix: default_row_class_prefix(),
            detail_row_class: default_detail_row_class(),
            name_link_selector: default_name_link_selector(),
            prize_selector: default_prize_selector(),
            prize_prefix: default_prize_prefix(),
            min_columns: default_min_columns(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_tier_keyword")]
    pub tier_keyword: String,
    #[serde(default = "default_marquee_keywords")]
    pub marquee_keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            tier_keyword: default_tier_keyword(),
            marquee_keywords: default_marquee_keywords(),
        }
    }
}

/// Loads the TOML config at `path`. A missing file is an error only when
/// `required` is set; otherwise defaults are used.
pub fn load_config(path: &Path, required: bool) -> SyncResult<SyncConfig> {
    if !path.exists() {
        if required {
            return Err(SyncError::Config(format!(
                "config file does not exist: {}",
                path.display()
            )));
        }
        return Ok(SyncConfig::default());
    }

    let text = std::fs::read_to_string(path).map_err(|err| {
        SyncError::Config(format!("failed to read config {}: {err}", path.display()))
    })?;
    toml::from_str(&text).map_err(|err| {
        SyncError::Config(format!("failed to parse toml in {}: {err}", path.display()))
    })
}

fn default_key_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_api_base_url() -> String {
    DEFAULT_GOOGLE_API_BASE.to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/calendar.events".to_string(),
        "https://www.googleapis.com/auth/calendar.readonly".to_string(),
    ]
}

fn default_source_url() -> String {
    DEFAULT_CALENDAR_URL.to_string()
}

fn default_user_agent() -> String {
    concat!(
        "bwfcal/",
        env!("CARGO_PKG_VERSION"),
        " (tournament calendar sync)"
    )
    .to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_year() -> i32 {
    Utc::now().year()
}

fn default_container_selector() -> String {
    "#ajaxCalender".to_string()
}

fn default_month_selector() -> String {
    ".item-results".to_string()
}

fn default_heading_selector() -> String {
    "h2".to_string()
}

fn default_table_selector() -> String {
    "table.tblResultLanding".to_string()
}

fn default_row_class_prefix() -> String {
    "bg-".to_string()
}

fn default_detail_row_class() -> String {
    "tr-tournament-detail".to_string()
}

fn default_name_link_selector() -> String {
    "div.name a".to_string()
}

fn default_prize_selector() -> String {
    ".bwf-button_group .bwf-button".to_string()
}

fn default_prize_prefix() -> String {
    "PRIZE MONEY".to_string()
}

fn default_min_columns() -> usize {
    7
}

fn default_tier_keyword() -> String {
    "super".to_string()
}

fn default_marquee_keywords() -> Vec<String> {
    vec![
        "sudirman".to_string(),
        "world championships".to_string(),
        "world tour finals".to_string(),
    ]
}
