//! Shared helpers for integration tests.
//!
//! The [`RemoteEnd`] of an in-memory transport plays the browser.

#![allow(dead_code)]

use std::time::Duration;

use bidi_webdriver::{ChannelTransport, CommandId, RemoteEnd, Session, SessionOptions};
use serde_json::{Value, json};
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

/// Upper bound for any single wait in a test.
pub const STEP: Duration = Duration::from_secs(5);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Opens a session over an in-memory transport.
pub fn open() -> (Session, RemoteEnd) {
    open_with(
        SessionOptions::new()
            .with_command_timeout(Duration::from_secs(5))
            .with_teardown_timeout(Duration::from_millis(500)),
    )
}

pub fn open_with(options: SessionOptions) -> (Session, RemoteEnd) {
    init_tracing();
    let (transport, remote) = ChannelTransport::pair();
    (Session::with_transport(transport, options), remote)
}

/// Receives the next command and checks its method.
pub async fn expect_command(remote: &mut RemoteEnd, method: &str) -> (CommandId, Value) {
    let (id, actual, params) = timeout(STEP, remote.recv_command())
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {method}"))
        .unwrap_or_else(|| panic!("connection closed waiting for {method}"));
    assert_eq!(actual, method, "unexpected command");
    (id, params)
}

/// Answers the `session.subscribe` + `network.addIntercept` pair sent by the
/// first `add_intercept` of a session.
pub async fn accept_first_intercept(remote: &mut RemoteEnd, intercept: &str) {
    let (id, params) = expect_command(remote, "session.subscribe").await;
    assert_eq!(params["events"], json!(["network.beforeRequestSent"]));
    remote
        .respond_success(id, json!({ "subscription": "sub-intercepts" }))
        .expect("respond");

    let (id, _) = expect_command(remote, "network.addIntercept").await;
    remote
        .respond_success(id, json!({ "intercept": intercept }))
        .expect("respond");
}

/// Params of a blocked `network.beforeRequestSent`.
pub fn blocked_request(request: &str, url: &str, intercept: &str) -> Value {
    json!({
        "context": "ctx-1",
        "isBlocked": true,
        "navigation": "nav-1",
        "redirectCount": 0,
        "request": {
            "request": request,
            "url": url,
            "method": "GET",
            "headers": [{ "name": "accept", "value": { "type": "string", "value": "*/*" } }],
            "cookies": [],
            "headersSize": 0,
            "bodySize": 0,
            "destination": "document",
            "initiatorType": null,
            "timings": {}
        },
        "timestamp": 1_700_000_000_000u64,
        "intercepts": [intercept]
    })
}

/// Params of a navigation event.
pub fn navigation_info(context: &str, url: &str) -> Value {
    json!({
        "context": context,
        "navigation": "nav-1",
        "timestamp": 1_700_000_000_000u64,
        "url": url
    })
}
