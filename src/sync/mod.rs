/*!
Backend synchronization.

Task loops report their lifecycle and every completed action to a [`BackendSync`]. Reports
are best-effort: the scheduler logs a failed report and moves on. There is no retry queue,
a report that fails is lost.

- `http.rs` -> `HttpSync` (JSON over HTTP to the backend sink)
- `LogSync` (below) only logs, for dry runs
*/

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{AutomationType, Settings};
use crate::sources::ActionRecord;

pub mod http;

pub use http::HttpSync;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("backend rejected the report: {0}")]
    Rejected(String),
}

/// Reply envelope of every backend write endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl Ack {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Counts returned by `GET /stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub connections: u64,
    pub posts: u64,
    pub messages: u64,
}

/// External telemetry collaborator. Implementations must tolerate concurrent calls.
#[async_trait]
pub trait BackendSync: Send + Sync {
    async fn report_start(&self, settings: &Settings) -> Result<(), SyncError>;

    async fn report_stop(&self, kind: AutomationType) -> Result<(), SyncError>;

    async fn report_action(&self, record: &ActionRecord) -> Result<(), SyncError>;
}

/// Sink that only logs. Used by `--dry-run`.
#[derive(Debug, Clone, Default)]
pub struct LogSync;

#[async_trait]
impl BackendSync for LogSync {
    async fn report_start(&self, settings: &Settings) -> Result<(), SyncError> {
        info!(target: "linkpilot::sync", kind = %settings.kind(), ?settings, "DRY-RUN report_start");
        Ok(())
    }

    async fn report_stop(&self, kind: AutomationType) -> Result<(), SyncError> {
        info!(target: "linkpilot::sync", %kind, "DRY-RUN report_stop");
        Ok(())
    }

    async fn report_action(&self, record: &ActionRecord) -> Result<(), SyncError> {
        info!(
            target: "linkpilot::sync",
            kind = %record.kind,
            payload = ?record.payload,
            "DRY-RUN report_action"
        );
        Ok(())
    }
}
