use anyhow::Result;
use bwfcal::auth::{AccessToken, authenticate, load_service_account_key, sign_assertion};
use bwfcal::calendar::{CalendarService, GoogleCalendarClient};
use bwfcal::config::CalendarConfig;
use bwfcal::error::SyncError;
use bwfcal::model::{EventDate, NewEvent};
use chrono::{NaiveDate, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use mockito::{Matcher, Server};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const CALENDAR: &str = "team@group.calendar.google.com";
const EVENTS_PATH: &str = "/calendar/v3/calendars/team@group.calendar.google.com/events";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn token() -> AccessToken {
    AccessToken {
        token: "ya29.test-token".to_string(),
        expires_at: Utc::now(),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

#[test]
fn list_events_sends_text_query_and_window() -> Result<()> {
    let mut server = Server::new();
    let mock = server
        .mock("GET", EVENTS_PATH)
        .match_header("authorization", "Bearer ya29.test-token")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "Japan Open".into()),
            Matcher::UrlEncoded("timeMin".into(), "2025-08-18T00:00:00Z".into()),
            Matcher::UrlEncoded("timeMax".into(), "2025-08-25T00:00:00Z".into()),
            Matcher::UrlEncoded("singleEvents".into(), "true".into()),
            Matcher::UrlEncoded("orderBy".into(), "startTime".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "kind": "calendar#events",
                "items": [{
                    "id": "evt1",
                    "summary": "Japan Open (Super 750)",
                    "htmlLink": "https://calendar.google.com/event?eid=evt1",
                    "start": {"date": "2025-08-18"},
                    "end": {"date": "2025-08-25"}
                }]
            }"#,
        )
        .create();

    let client = GoogleCalendarClient::new(&format!("{}/calendar/v3", server.url()), &token())?;
    let events = client.list_events(
        CALENDAR,
        "Japan Open",
        Utc.with_ymd_and_hms(2025, 8, 18, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 8, 25, 0, 0, 0).unwrap(),
    )?;

    mock.assert();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id.as_deref(), Some("evt1"));
    assert_eq!(events[0].start, Some(EventDate::all_day(date(2025, 8, 18))));
    Ok(())
}

#[test]
fn list_events_without_items_is_empty() -> Result<()> {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", EVENTS_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"kind": "calendar#events"}"#)
        .create();

    let client = GoogleCalendarClient::new(&format!("{}/calendar/v3", server.url()), &token())?;
    let events = client.list_events(CALENDAR, "Nothing", Utc::now(), Utc::now())?;

    assert!(events.is_empty());
    Ok(())
}

#[test]
fn insert_event_posts_all_day_body() -> Result<()> {
    let mut server = Server::new();
    let mock = server
        .mock("POST", EVENTS_PATH)
        .match_header("authorization", "Bearer ya29.test-token")
        .match_body(Matcher::Json(serde_json::json!({
            "summary": "Japan Open (Super 750)",
            "location": "Tokyo, Japan",
            "description": "Prize Money: USD 950,000",
            "start": {"date": "2025-08-18"},
            "end": {"date": "2025-08-25"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "created-1", "htmlLink": "https://calendar.google.com/event?eid=created-1"}"#)
        .create();

    let client = GoogleCalendarClient::new(&format!("{}/calendar/v3", server.url()), &token())?;
    let created = client.insert_event(
        CALENDAR,
        &NewEvent {
            summary: "Japan Open (Super 750)".to_string(),
            location: "Tokyo, Japan".to_string(),
            description: Some("Prize Money: USD 950,000".to_string()),
            start: EventDate::all_day(date(2025, 8, 18)),
            end: EventDate::all_day(date(2025, 8, 25)),
        },
    )?;

    mock.assert();
    assert_eq!(created.id.as_deref(), Some("created-1"));
    Ok(())
}

#[test]
fn service_errors_are_reported_per_call() -> Result<()> {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", EVENTS_PATH)
        .with_status(403)
        .with_body(r#"{"error": {"code": 403, "message": "Forbidden"}}"#)
        .create();

    let client = GoogleCalendarClient::new(&format!("{}/calendar/v3", server.url()), &token())?;
    let err = client
        .insert_event(
            CALENDAR,
            &NewEvent {
                summary: "x".to_string(),
                location: "y".to_string(),
                description: None,
                start: EventDate::all_day(date(2025, 1, 1)),
                end: EventDate::all_day(date(2025, 1, 2)),
            },
        )
        .expect_err("403 must fail");

    match err {
        SyncError::CalendarService { operation, reason } => {
            assert_eq!(operation, "insert");
            assert!(reason.contains("403"));
        }
        other => panic!("unexpected error {other}"),
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[test]
fn assertion_is_signed_with_the_service_account_key() -> Result<()> {
    let key = load_service_account_key(&fixture("service_account.json"))?;
    let scopes = CalendarConfig::default().scopes;
    let jwt = sign_assertion(&key, &scopes, Utc::now())?;

    let header = decode_header(&jwt)?;
    assert_eq!(header.alg, Algorithm::RS256);
    assert_eq!(header.kid.as_deref(), Some("test-key-1"));

    let public_pem = std::fs::read(fixture("service_account_pub.pem"))?;
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&["https://oauth2.googleapis.com/token"]);
    let claims = decode::<Claims>(&jwt, &DecodingKey::from_rsa_pem(&public_pem)?, &validation)?.claims;

    assert_eq!(claims.iss, "sync@bwfcal-test.iam.gserviceaccount.com");
    assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
    assert_eq!(
        claims.scope,
        "https://www.googleapis.com/auth/calendar.events https://www.googleapis.com/auth/calendar.readonly"
    );
    assert_eq!(claims.exp - claims.iat, 3600);
    Ok(())
}

fn key_file_pointing_at(dir: &Path, token_uri: &str) -> Result<PathBuf> {
    let mut key: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(fixture("service_account.json"))?)?;
    key["token_uri"] = serde_json::Value::String(token_uri.to_string());
    let path = dir.join("credentials.json");
    std::fs::write(&path, serde_json::to_string(&key)?)?;
    Ok(path)
}

#[test]
fn authenticate_exchanges_assertion_for_token() -> Result<()> {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(
                "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer".to_string(),
            ),
            Matcher::Regex(r"assertion=[\w-]+\.[\w-]+\.[\w-]+".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "ya29.issued", "expires_in": 3599, "token_type": "Bearer"}"#)
        .create();

    let dir = tempdir()?;
    let config = CalendarConfig {
        service_account_key_path: key_file_pointing_at(dir.path(), &format!("{}/token", server.url()))?,
        ..CalendarConfig::default()
    };

    let before = Utc::now();
    let token = authenticate(&config)?;

    mock.assert();
    assert_eq!(token.token, "ya29.issued");
    assert!(token.expires_at > before);
    Ok(())
}

#[test]
fn rejected_credentials_are_fatal() -> Result<()> {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{"error": "invalid_grant", "error_description": "Invalid JWT Signature."}"#)
        .create();

    let dir = tempdir()?;
    let config = CalendarConfig {
        service_account_key_path: key_file_pointing_at(dir.path(), &format!("{}/token", server.url()))?,
        ..CalendarConfig::default()
    };

    let err = authenticate(&config).expect_err("token request must fail");
    assert!(matches!(err, SyncError::Auth(ref msg) if msg.contains("invalid_grant")));
    assert!(err.is_fatal());
    Ok(())
}

#[test]
fn unreadable_key_file_is_an_auth_error() -> Result<()> {
    let dir = tempdir()?;
    let missing = CalendarConfig {
        service_account_key_path: dir.path().join("missing.json"),
        ..CalendarConfig::default()
    };
    assert!(matches!(authenticate(&missing), Err(SyncError::Auth(_))));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, r#"{"client_email": "a@b", "private_key": "not a pem"}"#)?;
    let key = load_service_account_key(&garbage)?;
    assert!(matches!(
        sign_assertion(&key, &[], Utc::now()),
        Err(SyncError::Auth(_))
    ));
    Ok(())
}
