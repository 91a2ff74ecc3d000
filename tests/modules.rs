//! Module proxies: argument checks and result decoding.

mod common;

use bidi_webdriver::modules::browser::DEFAULT_USER_CONTEXT;
use bidi_webdriver::protocol::input::{KeyAction, NoneAction, SourceActions};
use bidi_webdriver::protocol::script::{
    AddPreloadScriptParameters, EvaluateParameters, EvaluateResult, RemoteValue, Target,
};
use bidi_webdriver::{BrowsingContextId, Error, UserContextId};
use common::{expect_command, open};
use serde_json::json;

#[tokio::test]
async fn test_evaluate_decodes_success_and_exception() -> anyhow::Result<()> {
    let (session, mut remote) = open();
    let target = Target::context(BrowsingContextId::new("ctx-1"));

    let call = tokio::spawn({
        let session = session.clone();
        let target = target.clone();
        async move {
            session
                .script()
                .evaluate(EvaluateParameters::new("1 + 2", target))
                .await
        }
    });
    let (id, params) = expect_command(&mut remote, "script.evaluate").await;
    assert_eq!(
        params,
        json!({
            "expression": "1 + 2",
            "target": { "context": "ctx-1" },
            "awaitPromise": true
        })
    );
    remote.respond_success(
        id,
        json!({ "type": "success", "result": { "type": "number", "value": 3 }, "realm": "r-1" }),
    )?;
    match call.await??.into_result() {
        Ok(RemoteValue::Number { value }) => assert_eq!(value.0, 3.0),
        other => panic!("unexpected result {other:?}"),
    }

    let call = tokio::spawn({
        let session = session.clone();
        async move {
            session
                .script()
                .evaluate(EvaluateParameters::new("boom()", target))
                .await
        }
    });
    let (id, _) = expect_command(&mut remote, "script.evaluate").await;
    remote.respond_success(
        id,
        json!({
            "type": "exception",
            "exceptionDetails": {
                "columnNumber": 0,
                "lineNumber": 0,
                "exception": { "type": "string", "value": "boom" },
                "stackTrace": { "callFrames": [] },
                "text": "ReferenceError: boom is not defined"
            },
            "realm": "r-1"
        }),
    )?;
    let result = call.await??;
    assert!(matches!(result, EvaluateResult::Exception { .. }));
    let details = result.into_result().expect_err("exception");
    assert!(details.text.starts_with("ReferenceError"));
    Ok(())
}

#[tokio::test]
async fn test_preload_script_scope_is_exclusive() -> anyhow::Result<()> {
    let (session, _remote) = open();

    let params = AddPreloadScriptParameters {
        function_declaration: "() => {}".into(),
        arguments: None,
        contexts: Some(vec![BrowsingContextId::new("ctx-1")]),
        sandbox: None,
        user_contexts: Some(vec![UserContextId::new("uc-1")]),
    };
    let err = session
        .script()
        .add_preload_script(params)
        .await
        .expect_err("both scopes");
    assert!(matches!(err, Error::InvalidArgument { .. }));
    assert_eq!(session.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_input_sources_are_rejected() -> anyhow::Result<()> {
    let (session, mut remote) = open();
    let context = BrowsingContextId::new("ctx-1");

    let duplicate = vec![
        SourceActions::Key {
            id: "kb".into(),
            actions: vec![KeyAction::KeyDown { value: "a".into() }],
        },
        SourceActions::None {
            id: "kb".into(),
            actions: vec![NoneAction::Pause { duration: Some(10) }],
        },
    ];
    let err = session
        .input()
        .perform_actions(&context, duplicate)
        .await
        .expect_err("duplicate id");
    assert!(matches!(err, Error::InvalidArgument { .. }));

    let call = tokio::spawn({
        let session = session.clone();
        let context = context.clone();
        async move {
            session
                .input()
                .perform_actions(
                    &context,
                    vec![SourceActions::Key {
                        id: "kb".into(),
                        actions: vec![
                            KeyAction::KeyDown { value: "a".into() },
                            KeyAction::KeyUp { value: "a".into() },
                        ],
                    }],
                )
                .await
        }
    });
    let (id, params) = expect_command(&mut remote, "input.performActions").await;
    assert_eq!(params["actions"][0]["type"], "key");
    assert_eq!(params["actions"][0]["actions"][1], json!({ "type": "keyUp", "value": "a" }));
    remote.respond_success(id, json!({}))?;
    call.await??;
    Ok(())
}

#[tokio::test]
async fn test_default_user_context_is_protected() -> anyhow::Result<()> {
    let (session, mut remote) = open();

    let err = session
        .browser()
        .remove_user_context(&UserContextId::new(DEFAULT_USER_CONTEXT))
        .await
        .expect_err("default context");
    assert!(matches!(err, Error::InvalidArgument { .. }));

    let call = tokio::spawn({
        let session = session.clone();
        async move {
            session
                .browser()
                .remove_user_context(&UserContextId::new("uc-2"))
                .await
        }
    });
    let (id, params) = expect_command(&mut remote, "browser.removeUserContext").await;
    assert_eq!(params, json!({ "userContext": "uc-2" }));
    remote.respond_success(id, json!({}))?;
    call.await??;
    Ok(())
}
