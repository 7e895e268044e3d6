//! Integration tests for the backend sink and the HTTP client that reports to it.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceExt;

use linkpilot::config::{AutomationType, ConnectionSettings, Settings};
use linkpilot::server::{self, AppState, create_router};
use linkpilot::sources::{ActionPayload, ActionRecord};
use linkpilot::sync::{BackendSync, HttpSync};

// =============================================================================
// Helpers
// =============================================================================

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn stats(app: &axum::Router) -> Value {
    let resp = app
        .clone()
        .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

// =============================================================================
// Router
// =============================================================================

#[tokio::test]
async fn start_and_stop_are_acknowledged() {
    let app = create_router(AppState::new());

    let resp = app
        .clone()
        .oneshot(post_json(
            "/api/automation/start",
            r#"{"type":"feed","settings":{"autoEngage":true}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_json(resp).await,
        json!({"status": "success", "message": "feed automation started"})
    );

    let resp = app
        .oneshot(post_json("/api/automation/stop", r#"{"type":"posts"}"#))
        .await
        .unwrap();
    assert_eq!(
        body_json(resp).await,
        json!({"status": "success", "message": "posts automation stopped"})
    );
}

#[tokio::test]
async fn reports_are_counted() {
    let state = AppState::new();
    let app = create_router(state.clone());
    assert_eq!(
        stats(&app).await,
        json!({"connections": 0, "posts": 0, "messages": 0})
    );

    let requests = [
        (
            "/api/connections",
            r#"{"profile":{"name":"Ava","headline":"Engineer","message":"Hi Ava"}}"#,
            "Connection request logged",
        ),
        ("/api/posts", r#"{"content":"Shipping today"}"#, "Post created"),
        ("/api/posts", r#"{"content":"Second post"}"#, "Post created"),
        ("/api/messages", r#"{"message":"Thanks!"}"#, "Message sent"),
    ];
    for (uri, body, message) in requests {
        let resp = app.clone().oneshot(post_json(uri, body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["message"], message);
    }

    assert_eq!(
        stats(&app).await,
        json!({"connections": 1, "posts": 2, "messages": 1})
    );
    assert_eq!(state.log().connections[0]["name"], "Ava");
    assert_eq!(state.log().posts[1], "Second post");
}

#[tokio::test]
async fn empty_body_is_lenient() {
    let app = create_router(AppState::new());
    let resp = app
        .clone()
        .oneshot(
            Request::post("/api/automation/stop")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["message"], "unknown automation stopped");

    let resp = app
        .clone()
        .oneshot(post_json("/api/messages", "{}"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(stats(&app).await["messages"], 1);
}

#[tokio::test]
async fn malformed_json_is_a_500_with_error_envelope() {
    let app = create_router(AppState::new());
    let resp = app
        .clone()
        .oneshot(post_json("/api/posts", "{not json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("malformed"));
    assert_eq!(stats(&app).await["posts"], 0);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = create_router(AppState::new());
    let resp = app
        .oneshot(Request::get("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let app = create_router(AppState::new());
    let resp = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/connections")
                .header("origin", "chrome-extension://abc")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.status().is_success());
    assert!(resp.headers().contains_key("access-control-allow-origin"));
}

// =============================================================================
// HttpSync against a live sink
// =============================================================================

#[tokio::test]
async fn http_sync_reports_to_the_sink() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve_on(listener, state.clone(), async {
        let _ = stop_rx.await;
    }));

    let sync = HttpSync::new(format!("http://{addr}/api/"), Duration::from_secs(5)).unwrap();
    sync.report_start(&Settings::Connections(ConnectionSettings::default()))
        .await
        .unwrap();
    sync.report_action(&ActionRecord::now(
        AutomationType::Connections,
        ActionPayload::Connection {
            name: "Ava".into(),
            headline: "Engineer".into(),
            message: "Hi Ava".into(),
        },
    ))
    .await
    .unwrap();
    sync.report_action(&ActionRecord::now(
        AutomationType::Posts,
        ActionPayload::Post {
            content: "Hello\n#rust".into(),
        },
    ))
    .await
    .unwrap();
    sync.report_action(&ActionRecord::now(
        AutomationType::Feed,
        ActionPayload::Engagement {},
    ))
    .await
    .unwrap();
    sync.report_stop(AutomationType::Connections).await.unwrap();

    let counts = sync.stats().await.unwrap();
    assert_eq!(
        (counts.connections, counts.posts, counts.messages),
        (1, 1, 0)
    );
    {
        let log = state.log();
        assert_eq!(
            log.connections[0],
            json!({"name": "Ava", "headline": "Engineer", "message": "Hi Ava"})
        );
        assert_eq!(log.posts[0], "Hello\n#rust");
    }

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
