//! Shared fixtures for the LSP E2E tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use futures::StreamExt;
use mockall::mock;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower_lsp::ClientSocket;
use tower_lsp::jsonrpc::{Request, Response};

use collie_lsp::engine::ast::{GrammarAst, Offense};
use collie_lsp::engine::{EngineError, GrammarEngine};
use collie_lsp::lsp::dispatcher::EngineFactory;

mock! {
    pub Engine {}

    impl GrammarEngine for Engine {
        fn parse(&self, source: &str, filename: &str) -> Result<GrammarAst, EngineError>;
        fn lint(&self, source: &str, filename: &str) -> Result<Vec<Offense>, EngineError>;
        fn format(&self, source: &str, filename: &str) -> Result<Option<String>, EngineError>;
        fn autocorrect(&self, source: &str, filename: &str) -> String;
    }
}

/// Factory handing out `engine` on the first `initialize`
pub fn engine_factory<E: GrammarEngine + 'static>(engine: E) -> EngineFactory {
    let slot = Mutex::new(Some(engine));
    Box::new(move |_: Option<&Path>| {
        let engine = slot
            .lock()
            .unwrap()
            .take()
            .expect("engine is created once per session");
        Box::new(engine) as Box<dyn GrammarEngine>
    })
}

/// Engine AST for `"%token NUMBER\n%%\nprogram: NUMBER;\n%%\n"`, decoded from the
/// engine's JSON shape
pub fn number_grammar_ast() -> GrammarAst {
    serde_json::from_value(json!({
        "declarations": [
            {"kind": "token", "names": ["NUMBER"], "location": {"line": 1, "column": 8}}
        ],
        "rules": [
            {
                "name": "program",
                "location": {"line": 3, "column": 1},
                "alternatives": [
                    {"symbols": [{"name": "NUMBER"}], "location": {"line": 3, "column": 10}}
                ]
            }
        ]
    }))
    .unwrap()
}

pub const NUMBER_GRAMMAR: &str = "%token NUMBER\n%%\nprogram: NUMBER;\n%%\n";

pub fn offense(line: u32, message: &str) -> Offense {
    serde_json::from_value(json!({
        "location": {"line": line, "column": 1},
        "severity": "warning",
        "rule_name": "TestRule",
        "message": message,
    }))
    .unwrap()
}

pub fn create_request(id: i64, method: &'static str, params: Value) -> Request {
    Request::build(method).id(id).params(params).finish()
}

pub fn create_notification(method: &'static str, params: Value) -> Request {
    Request::build(method).params(params).finish()
}

pub fn create_initialize_request(id: i64) -> Request {
    create_request(
        id,
        "initialize",
        json!({
            "capabilities": {},
            "rootUri": "file:///test",
        }),
    )
}

pub fn create_initialized_notification() -> Request {
    create_notification("initialized", json!({}))
}

pub fn create_did_open_notification(uri: &str, text: &str) -> Request {
    create_did_open_notification_with_version(uri, text, 1)
}

pub fn create_did_open_notification_with_version(uri: &str, text: &str, version: i32) -> Request {
    create_notification(
        "textDocument/didOpen",
        json!({
            "textDocument": {
                "uri": uri,
                "languageId": "yacc",
                "version": version,
                "text": text,
            }
        }),
    )
}

pub fn create_did_change_notification(uri: &str, version: i32, text: &str) -> Request {
    create_notification(
        "textDocument/didChange",
        json!({
            "textDocument": {"uri": uri, "version": version},
            "contentChanges": [{"text": text}],
        }),
    )
}

pub fn create_did_close_notification(uri: &str) -> Request {
    create_notification(
        "textDocument/didClose",
        json!({"textDocument": {"uri": uri}}),
    )
}

pub fn create_position_request(
    id: i64,
    method: &'static str,
    uri: &str,
    line: u32,
    character: u32,
) -> Request {
    create_request(
        id,
        method,
        json!({
            "textDocument": {"uri": uri},
            "position": {"line": line, "character": character},
        }),
    )
}

pub fn create_document_request(id: i64, method: &'static str, uri: &str) -> Request {
    create_request(id, method, json!({"textDocument": {"uri": uri}}))
}

/// Result payload of a successful response
pub fn response_result(response: Option<Response>) -> Value {
    let (_, result) = response.expect("Expected a response").into_parts();
    result.expect("Expected a successful response")
}

/// Forwards every server-to-client message into a channel
pub fn spawn_notification_collector(mut socket: ClientSocket) -> mpsc::UnboundedReceiver<Request> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(message) = socket.next().await {
            if tx.send(message).is_err() {
                break;
            }
        }
    });
    rx
}

/// Next message named `method`, skipping others; `None` after a short timeout
pub async fn wait_for_notification(
    rx: &mut mpsc::UnboundedReceiver<Request>,
    method: &str,
) -> Option<Request> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(message) = rx.recv().await {
            if message.method() == method {
                return Some(message);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

/// Asserts that no `method` message arrives within a short window
pub async fn assert_no_notification(rx: &mut mpsc::UnboundedReceiver<Request>, method: &str) {
    let received = tokio::time::timeout(Duration::from_millis(200), async {
        while let Some(message) = rx.recv().await {
            if message.method() == method {
                return Some(message);
            }
        }
        None
    })
    .await
    .ok()
    .flatten();
    assert!(received.is_none(), "Unexpected {} notification", method);
}
