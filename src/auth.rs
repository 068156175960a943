use crate::config::CalendarConfig;
use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The fields of a service-account JSON key that the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

pub fn load_service_account_key(path: &Path) -> SyncResult<ServiceAccountKey> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        SyncError::Auth(format!(
            "failed to read service account key {}: {err}",
            path.display()
        ))
    })?;
    serde_json::from_str(&text).map_err(|err| {
        SyncError::Auth(format!(
            "failed to parse service account key {}: {err}",
            path.display()
        ))
    })
}

/// Loads the configured key and trades it for a bearer token.
pub fn authenticate(config: &CalendarConfig) -> SyncResult<AccessToken> {
    let key = load_service_account_key(&config.service_account_key_path)?;
    let token = request_access_token(&key, &config.scopes)?;
    info!(
        account = %key.client_email,
        expires_at = %token.expires_at,
        "authenticated with calendar service"
    );
    Ok(token)
}

pub fn request_access_token(
    key: &ServiceAccountKey,
    scopes: &[String],
) -> SyncResult<AccessToken> {
    let assertion = sign_assertion(key, scopes, Utc::now())?;

    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|err| SyncError::Auth(format!("failed to build http client: {err}")))?;

    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .map_err(|err| SyncError::Auth(format!("token request failed: {err}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SyncError::Auth(format!(
            "token endpoint returned {status}: {}",
            body.trim()
        )));
    }

    let parsed: TokenResponse = response
        .json()
        .map_err(|err| SyncError::Auth(format!("malformed token response: {err}")))?;

    let lifetime = parsed.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
    Ok(AccessToken {
        token: parsed.access_token,
        expires_at: Utc::now() + Duration::seconds(lifetime),
    })
}

pub fn sign_assertion(
    key: &ServiceAccountKey,
    scopes: &[String],
    now: DateTime<Utc>,
) -> SyncResult<String> {
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|err| SyncError::Auth(format!("invalid service account private key: {err}")))?;

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let iat = now.timestamp();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: scopes.join(" "),
        aud: &key.token_uri,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
    };

    encode(&header, &claims, &encoding_key)
        .map_err(|err| SyncError::Auth(format!("failed to sign token assertion: {err}")))
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}
