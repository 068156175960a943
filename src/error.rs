use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("cannot parse date range {raw:?} ({month} {year}): {reason}")]
    DateParse {
        raw: String,
        month: String,
        year: i32,
        reason: String,
    },

    #[error("calendar service error during {operation}: {reason}")]
    CalendarService {
        operation: &'static str,
        reason: String,
    },
}

impl SyncError {
    /// Only configuration and credential failures abort a run; everything
    /// else is isolated to the page or record that produced it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Config(_) | SyncError::Auth(_))
    }

    pub fn calendar(operation: &'static str, reason: impl ToString) -> Self {
        SyncError::CalendarService {
            operation,
            reason: reason.to_string(),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
