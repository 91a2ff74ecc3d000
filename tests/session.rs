//! Command correlation and session lifecycle over an in-memory transport.

mod common;

use std::collections::HashSet;
use std::time::Duration;

use bidi_webdriver::protocol::browsing_context::{
    CreateParameters, CreateType, LocateNodesParameters, Locator,
};
use bidi_webdriver::protocol::storage::CookieFilter;
use bidi_webdriver::protocol::{Command, RawCommand, SessionCommand};
use bidi_webdriver::{BrowsingContextId, Error, SessionOptions, SessionState};
use common::{STEP, expect_command, open, open_with};
use serde_json::json;
use tokio::time::timeout;

fn raw(method: &str, n: u64) -> Command {
    Command::Raw(RawCommand::new(method, json!({ "n": n })))
}

#[tokio::test]
async fn test_out_of_order_responses_reach_their_callers() -> anyhow::Result<()> {
    let (session, mut remote) = open();

    let mut handles = Vec::new();
    for n in 1..=3 {
        handles.push(session.submit(raw("test.echo", n))?);
    }

    let mut received = Vec::new();
    for _ in 0..3 {
        received.push(expect_command(&mut remote, "test.echo").await);
    }
    let ids: Vec<u64> = received.iter().map(|(id, _)| id.as_u64()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    for (id, params) in received.iter().rev() {
        remote.respond_success(*id, json!({ "echo": params["n"] }))?;
    }

    for (n, handle) in (1..=3).zip(handles) {
        let result = handle.await?;
        assert_eq!(result["echo"], n);
    }
    Ok(())
}

#[tokio::test]
async fn test_concurrent_commands_each_get_one_outcome() -> anyhow::Result<()> {
    let (session, mut remote) = open();
    const N: u64 = 64;

    let mut callers = Vec::new();
    for n in 0..N {
        let session = session.clone();
        callers.push(tokio::spawn(async move {
            (n, session.send(raw("test.echo", n)).await)
        }));
    }

    let mut seen = HashSet::new();
    let mut pending = Vec::new();
    for _ in 0..N {
        let (id, params) = expect_command(&mut remote, "test.echo").await;
        assert!(seen.insert(id), "id {id} reused");
        pending.push((id, params));
    }

    // Every third command fails, the rest succeed, in reverse order.
    for (id, params) in pending.into_iter().rev() {
        if id.as_u64() % 3 == 0 {
            remote.respond_error(id, "unknown error", "rejected")?;
        } else {
            remote.respond_success(id, json!({ "echo": params["n"] }))?;
        }
    }

    let mut outcomes = 0;
    for caller in callers {
        let (n, result) = caller.await?;
        match result {
            Ok(value) => assert_eq!(value["echo"], n),
            Err(e) => assert!(e.is_protocol_error("unknown error")),
        }
        outcomes += 1;
    }
    assert_eq!(outcomes, N);
    assert_eq!(session.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_transport_close_fails_pending_commands() -> anyhow::Result<()> {
    let (session, mut remote) = open();

    let first = session.submit(raw("test.slow", 1))?;
    let second = session.submit(raw("test.slow", 2))?;
    expect_command(&mut remote, "test.slow").await;
    expect_command(&mut remote, "test.slow").await;

    remote.close();

    let first = timeout(STEP, first).await?;
    let second = timeout(STEP, second).await?;
    assert!(matches!(first, Err(Error::TransportClosed)));
    assert!(matches!(second, Err(Error::TransportClosed)));

    let mut changes = session.state_changes();
    timeout(STEP, changes.wait_for(|state| *state == SessionState::Closed)).await??;
    assert!(matches!(
        session.send(raw("test.after", 3)).await,
        Err(Error::TransportClosed)
    ));
    Ok(())
}

#[tokio::test]
async fn test_protocol_error_keeps_session_open() -> anyhow::Result<()> {
    let (session, mut remote) = open();

    let call = tokio::spawn({
        let session = session.clone();
        async move {
            session
                .browsing_context()
                .activate(&BrowsingContextId::new("missing"))
                .await
        }
    });
    let (id, params) = expect_command(&mut remote, "browsingContext.activate").await;
    assert_eq!(params, json!({ "context": "missing" }));
    remote.respond_error(id, "no such frame", "no context missing")?;

    let err = call.await?.expect_err("activate should fail");
    assert!(err.is_protocol_error("no such frame"));
    assert!(session.is_open());
    Ok(())
}

#[tokio::test]
async fn test_decode_error_is_scoped_to_the_caller() -> anyhow::Result<()> {
    let (session, mut remote) = open();

    let call = tokio::spawn({
        let session = session.clone();
        async move { session.browser().get_user_contexts().await }
    });
    let (id, _) = expect_command(&mut remote, "browser.getUserContexts").await;
    remote.respond_success(id, json!({ "userContexts": "not-a-list" }))?;

    let err = call.await?.expect_err("decode should fail");
    assert!(matches!(err, Error::Decode { .. }));
    assert!(session.is_open());
    Ok(())
}

#[tokio::test]
async fn test_list_results_are_unwrapped() -> anyhow::Result<()> {
    let (session, mut remote) = open();

    let cookies = tokio::spawn({
        let session = session.clone();
        async move {
            session
                .storage()
                .get_cookies(Some(CookieFilter::by_name("sid")), None)
                .await
        }
    });
    let (id, params) = expect_command(&mut remote, "storage.getCookies").await;
    assert_eq!(params, json!({ "filter": { "name": "sid" } }));
    remote.respond_success(
        id,
        json!({
            "cookies": [{
                "name": "sid",
                "value": { "type": "string", "value": "abc" },
                "domain": "example.test",
                "path": "/",
                "size": 6,
                "httpOnly": true,
                "secure": true,
                "sameSite": "lax"
            }],
            "partitionKey": {}
        }),
    )?;
    let cookies = cookies.await??;
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name, "sid");

    let nodes = tokio::spawn({
        let session = session.clone();
        async move {
            session
                .browsing_context()
                .locate_nodes(LocateNodesParameters::new(
                    BrowsingContextId::new("ctx-1"),
                    Locator::css("button"),
                ))
                .await
        }
    });
    let (id, params) = expect_command(&mut remote, "browsingContext.locateNodes").await;
    assert_eq!(params["locator"], json!({ "type": "css", "value": "button" }));
    remote.respond_success(
        id,
        json!({
            "nodes": [
                { "type": "node", "sharedId": "n-1", "value": { "nodeType": 1, "childNodeCount": 0, "localName": "button" } },
                { "type": "node", "sharedId": "n-2", "value": { "nodeType": 1, "childNodeCount": 0, "localName": "button" } }
            ]
        }),
    )?;
    let nodes = nodes.await??;
    assert_eq!(nodes.len(), 2);
    assert_eq!(
        nodes[1].shared_reference().map(|r| r.shared_id.as_str().to_owned()),
        Some("n-2".to_owned())
    );
    Ok(())
}

#[tokio::test]
async fn test_invalid_arguments_are_rejected_locally() -> anyhow::Result<()> {
    let (session, _remote) = open();
    let context = BrowsingContextId::new("ctx-1");

    let err = session
        .browsing_context()
        .navigate(&context, "not a url", None)
        .await
        .expect_err("relative URL");
    assert!(matches!(err, Error::InvalidArgument { .. }));

    let mut params = LocateNodesParameters::new(context, Locator::xpath("//a"));
    params.max_node_count = Some(0);
    let err = session
        .browsing_context()
        .locate_nodes(params)
        .await
        .expect_err("zero nodes");
    assert!(matches!(err, Error::InvalidArgument { .. }));

    assert_eq!(session.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_command_timeout_retires_id() -> anyhow::Result<()> {
    let (session, mut remote) =
        open_with(SessionOptions::new().with_command_timeout(Duration::from_millis(50)));

    let call = tokio::spawn({
        let session = session.clone();
        async move {
            session
                .browsing_context()
                .create(CreateParameters::new(CreateType::Tab))
                .await
        }
    });
    let (id, params) = expect_command(&mut remote, "browsingContext.create").await;
    assert_eq!(params, json!({ "type": "tab" }));

    let err = call.await?.expect_err("timeout");
    assert!(err.is_timeout());

    // The late response is discarded and the session keeps working.
    remote.respond_success(id, json!({ "context": "late" }))?;
    let status = tokio::spawn({
        let session = session.clone();
        async move { session.session_module().status().await }
    });
    let (id, _) = expect_command(&mut remote, "session.status").await;
    remote.respond_success(id, json!({ "ready": false, "message": "busy" }))?;
    let status = status.await??;
    assert!(!status.ready);
    Ok(())
}

#[tokio::test]
async fn test_cancel_unblocks_caller() -> anyhow::Result<()> {
    let (session, mut remote) = open();

    let handle = session.submit(Command::Session(SessionCommand::Status {}))?;
    let canceller = handle.canceller();
    expect_command(&mut remote, "session.status").await;

    assert!(session.cancel(canceller.id()));
    let result = timeout(STEP, handle).await?;
    assert!(matches!(result, Err(Error::Cancelled { .. })));
    Ok(())
}

#[tokio::test]
async fn test_dispose_is_idempotent() -> anyhow::Result<()> {
    let (session, mut remote) = open();

    let pending = session.submit(raw("test.slow", 1))?;
    expect_command(&mut remote, "test.slow").await;

    timeout(STEP, session.dispose()).await?;
    assert_eq!(session.state(), SessionState::Closed);
    assert!(matches!(timeout(STEP, pending).await?, Err(Error::TransportClosed)));

    timeout(STEP, session.dispose()).await?;
    assert!(matches!(
        session.send(raw("test.after", 2)).await,
        Err(Error::SessionClosed)
    ));
    assert!(timeout(STEP, remote.recv()).await?.is_none());
    Ok(())
}
