//! HTTP backend client.
//!
//! Endpoint mapping (all bodies JSON):
//! - `report_start`  -> `POST {base}/automation/start` `{type, settings}`
//! - `report_stop`   -> `POST {base}/automation/stop`  `{type}`
//! - `report_action` -> `POST {base}/connections` `{profile: {name, headline, message}}`,
//!   `POST {base}/posts` `{content}` or `POST {base}/messages` `{message}`
//! - `stats`         -> `GET {base}/stats`
//!
//! Feed engagements have no endpoint and are only logged.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace};

use super::{Ack, BackendSync, Stats, SyncError};
use crate::config::{AutomationType, BackendConfig, Settings};
use crate::sources::{ActionPayload, ActionRecord};

#[derive(Debug, Clone)]
pub struct HttpSync {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSync {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &BackendConfig) -> Result<Self, SyncError> {
        Self::new(cfg.url.clone(), Duration::from_millis(cfg.timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Ack, SyncError> {
        let url = self.url(path);
        trace!(target: "linkpilot::sync", %url, "POST");
        let resp = self.client.post(&url).json(body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp
                .json::<Ack>()
                .await
                .map(|ack| ack.message)
                .unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let ack: Ack = resp.json().await?;
        if !ack.is_success() {
            return Err(SyncError::Rejected(ack.message));
        }
        debug!(target: "linkpilot::sync", %url, message = %ack.message, "Backend acknowledged");
        Ok(ack)
    }

    /// Fetch the backend's activity counters.
    pub async fn stats(&self) -> Result<Stats, SyncError> {
        let resp = self.client.get(self.url("/stats")).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl BackendSync for HttpSync {
    async fn report_start(&self, settings: &Settings) -> Result<(), SyncError> {
        self.post("/automation/start", settings).await.map(drop)
    }

    async fn report_stop(&self, kind: AutomationType) -> Result<(), SyncError> {
        self.post("/automation/stop", &json!({ "type": kind }))
            .await
            .map(drop)
    }

    async fn report_action(&self, record: &ActionRecord) -> Result<(), SyncError> {
        let ack = match &record.payload {
            ActionPayload::Connection { .. } => {
                self.post("/connections", &json!({ "profile": &record.payload }))
                    .await
            }
            ActionPayload::Post { content } => {
                self.post("/posts", &json!({ "content": content })).await
            }
            ActionPayload::Message { message } => {
                self.post("/messages", &json!({ "message": message })).await
            }
            ActionPayload::Engagement {} => {
                debug!(
                    target: "linkpilot::sync",
                    kind = %record.kind,
                    "No backend endpoint for engagements; not reported"
                );
                return Ok(());
            }
        };
        ack.map(drop)
    }
}
