//! Integration tests for the CLI commands against replayed site pages.

use std::path::Path;

use hargreaves::keepalive::KEEPALIVE_ACK;
use hargreaves::pacing::NoPacer;
use hargreaves::pages::html::HlPageParser;
use hargreaves::web::mock::MockSession;
use hargreaves::{Credentials, DealRequest, FlowKind, HlClient, Side};
use hargreaves_cli::audit::AuditLog;
use hargreaves_cli::commands::{self, DealOptions};
use hargreaves_cli::config::Config;
use hargreaves_cli::error::Error;

const SEARCH: &str = include_str!("../../tests/fixtures/search.jsonp");
const ACCOUNTS: &str = include_str!("../../tests/fixtures/accounts.html");
const HOLDINGS: &str = include_str!("../../tests/fixtures/account_summary.csv");
const MARKET_CLOSED: &str = include_str!("../../tests/fixtures/market_closed.html");
const MANUAL_ENTRY: &str = include_str!("../../tests/fixtures/manual_entry.html");
const MANUAL_CONFIRMATION: &str = include_str!("../../tests/fixtures/manual_confirmation.html");
const PENDING: &str = include_str!("../../tests/fixtures/pending_orders.html");
const CANCELLED: &str = include_str!("../../tests/fixtures/cancel_success.html");

fn client(session: MockSession) -> HlClient<MockSession> {
    HlClient::with_session(
        session,
        Credentials::new("jbloggs", "hunter2", "010170", "918273"),
        Box::new(HlPageParser::new()),
        Box::new(NoPacer::at(0)),
    )
}

fn events(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

// ============================================================================
// deal
// ============================================================================

#[test]
fn forced_deal_is_audited() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let session = MockSession::new()
        .ok(SEARCH)
        .ok(ACCOUNTS)
        .ok("<html>summary</html>")
        .ok(HOLDINGS)
        .ok(MARKET_CLOSED)
        .ok(MANUAL_ENTRY)
        .ok(KEEPALIVE_ACK)
        .ok(MANUAL_CONFIRMATION);
    let client = client(session);

    let request = DealRequest::new("LLOY", 70, Side::Sell, 50.0).unwrap();
    let mut audit = AuditLog::open(&path).unwrap();
    let result = commands::run_deal(&client, &request, &DealOptions { force: true }, &mut audit)
        .unwrap()
        .unwrap();
    assert_eq!(result.flow(), FlowKind::Manual);

    let events = events(&path);
    let names: Vec<_> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();
    assert_eq!(names, ["deal_started", "security_resolved", "deal_completed"]);
    assert_eq!(events[2]["flow"], "manual");
    assert_eq!(events[2]["confirmation"]["flow"], "manual");
    assert_eq!(events[2]["confirmation"]["status"], "Pending");
}

#[test]
fn failed_deal_is_audited() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let session = MockSession::new()
        .ok(SEARCH)
        .ok(ACCOUNTS)
        .ok("<html>summary</html>")
        .ok(HOLDINGS)
        .ok(MARKET_CLOSED);
    let client = client(session);

    let request = DealRequest::new("LLOY", 70, Side::Sell, 50.0)
        .unwrap()
        .allow_fill_or_kill(false);
    let mut audit = AuditLog::open(&path).unwrap();
    let err = commands::run_deal(&client, &request, &DealOptions { force: true }, &mut audit)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Core(hargreaves::Error::MarketClosed { .. })
    ));
    assert_eq!(err.exit_code(), 2);

    let events = events(&path);
    assert_eq!(events.last().unwrap()["event"], "deal_failed");
    assert!(
        events.last().unwrap()["error"]
            .as_str()
            .unwrap()
            .starts_with("market closed")
    );
}

// ============================================================================
// pending / cancel
// ============================================================================

#[test]
fn cancel_is_audited() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let client = client(MockSession::new().ok(PENDING).ok(CANCELLED));

    let mut audit = AuditLog::open(&path).unwrap();
    commands::cancel_pending(&client, 70, 55201, &mut audit).unwrap();

    let events = events(&path);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "pending_cancelled");
    assert_eq!(events[0]["order_id"], 55201);
    assert_eq!(events[0]["sedol"], "0870612");
}

#[test]
fn listing_commands_succeed() {
    let client = client(
        MockSession::new()
            .ok(ACCOUNTS)
            .ok(SEARCH)
            .ok(PENDING)
            .ok(ACCOUNTS)
            .ok("<html>summary</html>")
            .ok(HOLDINGS),
    );
    commands::show_accounts(&client).unwrap();
    commands::show_search(&client, "lloyds").unwrap();
    commands::show_pending(&client, 70).unwrap();
    commands::show_holdings(&client, 70).unwrap();
    assert_eq!(client.session().inner().remaining(), 0);
}

// ============================================================================
// report / config
// ============================================================================

#[test]
fn report_renders_har() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.har");
    let har = serde_json::json!({
        "log": {
            "version": "1.2",
            "entries": [
                {
                    "request": {
                        "method": "GET",
                        "url": "https://online.hl.co.uk/my-accounts",
                        "headers": [],
                        "queryString": []
                    },
                    "response": {
                        "status": 200,
                        "headers": [],
                        "content": { "text": "<html>accounts</html>" }
                    }
                },
                {
                    "request": {
                        "method": "GET",
                        "url": "https://online.hl.co.uk/scripts/app.js",
                        "headers": [],
                        "queryString": []
                    },
                    "response": { "status": 200, "headers": [], "content": { "text": "" } }
                }
            ]
        }
    });
    std::fs::write(&path, har.to_string()).unwrap();

    let markdown = commands::render_report(&path).unwrap();
    assert!(markdown.contains("/my-accounts"));
    assert!(!markdown.contains("app.js"));
}

#[test]
fn report_of_missing_file_fails() {
    assert!(commands::render_report(Path::new("/nonexistent/session.har")).is_err());
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[credentials]\nusername = \"jbloggs\"\npassword = \"pw\"\n\
         date_of_birth = \"010170\"\nsecure_number = \"918273\"\n\n[pacing]\nenabled = false\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert!(!config.pacing.enabled);
    let credentials = config.credentials_with(|_| None).unwrap();
    assert_eq!(credentials.username(), "jbloggs");
}

#[test]
fn missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.session.timeout_secs, 15);
    assert!(matches!(
        config.credentials_with(|_| None),
        Err(Error::MissingField {
            field: "username",
            ..
        })
    ));
}
