use crate::config::{FetchConfig, FetchMode};
use crate::error::{SyncError, SyncResult};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub source_url: String,
    pub body: String,
}

/// Retrieves the calendar page markup once. There are no retries: a failed
/// fetch is reported to the caller, which treats the run as empty.
pub fn fetch_calendar_page(config: &FetchConfig) -> SyncResult<FetchedDocument> {
    match config.mode {
        FetchMode::Http => fetch_http_document(config),
        FetchMode::File => {
            let path = config.file_path.as_deref().ok_or_else(|| {
                SyncError::Config("fetch.file_path missing for file mode".to_string())
            })?;
            fetch_file_document(path)
        }
    }
}

fn fetch_http_document(config: &FetchConfig) -> SyncResult<FetchedDocument> {
    let fetch_error = |reason: String| SyncError::Fetch {
        url: config.url.clone(),
        reason,
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|err| SyncError::Config(format!("invalid fetch.user_agent: {err}")))?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("text/html"));

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(headers)
        .build()
        .map_err(|err| fetch_error(format!("failed to build http client: {err}")))?;

    let response = client
        .get(&config.url)
        .send()
        .map_err(|err| fetch_error(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("unexpected status {status}")));
    }

    let body = response
        .text()
        .map_err(|err| fetch_error(format!("failed to read body: {err}")))?;

    info!(url = %config.url, bytes = body.len(), "fetched calendar page");

    Ok(FetchedDocument {
        source_url: config.url.clone(),
        body,
    })
}

fn fetch_file_document(path: &Path) -> SyncResult<FetchedDocument> {
    let source_url = format!("file://{}", path.display());
    let body = std::fs::read_to_string(path).map_err(|err| SyncError::Fetch {
        url: source_url.clone(),
        reason: err.to_string(),
    })?;

    info!(file = %path.display(), bytes = body.len(), "loaded calendar page from file");

    Ok(FetchedDocument { source_url, body })
}
