//! Route handlers of the backend sink.
//!
//! Bodies are read as raw bytes and parsed leniently: an empty body counts as `{}` and missing
//! fields are logged as absent, matching how loosely the extension posts its reports.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde_json::{Map, Value};
use tracing::info;

use super::error::ApiError;
use super::state::AppState;
use crate::sync::{Ack, Stats};

type Reply = Result<Json<Ack>, ApiError>;

fn parse(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_slice(body)?)
}

/// `body[key]`, or `null` when absent.
fn take(body: &mut Value, key: &str) -> Value {
    body.get_mut(key).map(Value::take).unwrap_or(Value::Null)
}

fn kind_of(body: &Value) -> &str {
    body.get("type").and_then(Value::as_str).unwrap_or("unknown")
}

pub async fn automation_start(body: Bytes) -> Reply {
    let body = parse(&body)?;
    let kind = kind_of(&body);
    let settings = body.get("settings").unwrap_or(&Value::Null);
    info!(target: "linkpilot::server", %kind, %settings, "Automation started");
    Ok(Json(Ack::success(format!("{kind} automation started"))))
}

pub async fn automation_stop(body: Bytes) -> Reply {
    let body = parse(&body)?;
    let kind = kind_of(&body);
    info!(target: "linkpilot::server", %kind, "Automation stopped");
    Ok(Json(Ack::success(format!("{kind} automation stopped"))))
}

pub async fn connections(State(state): State<AppState>, body: Bytes) -> Reply {
    let profile = take(&mut parse(&body)?, "profile");
    info!(target: "linkpilot::server", %profile, "Connection request logged");
    state.log().connections.push(profile);
    Ok(Json(Ack::success("Connection request logged")))
}

pub async fn posts(State(state): State<AppState>, body: Bytes) -> Reply {
    let content = take(&mut parse(&body)?, "content");
    info!(target: "linkpilot::server", %content, "Post logged");
    state.log().posts.push(content);
    Ok(Json(Ack::success("Post created")))
}

pub async fn messages(State(state): State<AppState>, body: Bytes) -> Reply {
    let message = take(&mut parse(&body)?, "message");
    info!(target: "linkpilot::server", %message, "Message logged");
    state.log().messages.push(message);
    Ok(Json(Ack::success("Message sent")))
}

pub async fn stats(State(state): State<AppState>) -> Json<Stats> {
    Json(state.log().stats())
}
