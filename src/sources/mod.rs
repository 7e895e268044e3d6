/*!
Action sources (one per automation type).

This module defines the [`ActionSource`] trait, the values flowing through a task loop
([`ActionTarget`], [`ActionOutcome`], [`ActionRecord`]) and `build_source`, which picks the
implementation for a task's settings. Concrete sources live in their own files:

- `connections.rs` -> `ConnectionSource` (personalized invitations)
- `posts.rs`       -> `PostSource`       (periodic posts)
- `feed.rs`        -> `FeedSource`       (scroll and like matching updates)
- `messages.rs`    -> `MessageSource`    (placeholder, never yields targets)

Each source is responsible for:
- Reading candidates off the page in `poll` (a fresh, finite scan on every call)
- Performing one action in `act` and reporting what happened as an `ActionOutcome`
- Declaring its pacing through `cadence`

Sources never log failures, sleep between targets, consult quotas or talk to the
backend: the scheduler does all of that, the same way for every type.
*/

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{AutomationType, Settings};
use crate::content::ContentSource;
use crate::executor::pacing::{DelayRange, PacingModel};
use crate::page::{Affordance, Element, ElementId, Page, PageError, Surface};

pub mod connections;
pub mod feed;
pub mod messages;
pub mod posts;

pub use connections::ConnectionSource;
pub use feed::FeedSource;
pub use messages::MessageSource;
pub use posts::PostSource;

/// Pause between the steps of one page flow (open dialog, type, submit).
pub const STEP_GAP: DelayRange = DelayRange::secs(1, 2);

/// Everything a source may touch while polling or acting.
pub struct SourceContext<'a> {
    pub page: &'a dyn Page,
    pub pacing: &'a PacingModel,
    pub cancel: &'a CancellationToken,
}

impl SourceContext<'_> {
    /// Locate an element that the current flow cannot continue without.
    pub async fn require(
        &self,
        affordance: Affordance,
        within: Option<&ElementId>,
    ) -> Result<Element, PageError> {
        self.page
            .find(affordance, within)
            .await?
            .ok_or(PageError::Missing(affordance))
    }

    /// Short human pause between the steps of a flow.
    ///
    /// Not cancellable: once an action has started it is allowed to finish.
    pub async fn step_pause(&self) {
        self.pacing.delay(STEP_GAP.min_ms, STEP_GAP.max_ms).await;
    }
}

/// One candidate element and the text extracted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionTarget {
    pub element: ElementId,
    pub fields: BTreeMap<String, String>,
}

impl ActionTarget {
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Fields as template values.
    pub fn template_fields(&self) -> HashMap<&str, &str> {
        self.fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.trim()))
            .collect()
    }
}

impl From<Element> for ActionTarget {
    fn from(el: Element) -> Self {
        Self {
            element: el.id,
            fields: el.fields,
        }
    }
}

/// What a successful action produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionPayload {
    Connection {
        name: String,
        headline: String,
        message: String,
    },
    Post {
        content: String,
    },
    Message {
        message: String,
    },
    Engagement {},
}

/// Result of `ActionSource::act`.
#[derive(Debug)]
pub enum ActionOutcome {
    Success(ActionPayload),
    Skipped(String),
    Failed(anyhow::Error),
}

impl From<Result<ActionPayload, PageError>> for ActionOutcome {
    fn from(r: Result<ActionPayload, PageError>) -> Self {
        match r {
            Ok(payload) => ActionOutcome::Success(payload),
            Err(e) => ActionOutcome::Failed(e.into()),
        }
    }
}

/// A completed action, as reported to the backend. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub kind: AutomationType,
    pub payload: ActionPayload,
    pub timestamp: DateTime<Utc>,
}

impl ActionRecord {
    pub fn now(kind: AutomationType, payload: ActionPayload) -> Self {
        Self {
            kind,
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Scroll performed after every batch of targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScrollPlan {
    pub surface: Surface,
    pub distance: i64,
}

/// Pacing of a task loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Cadence {
    /// Pause after each acted-on target.
    pub action_gap: DelayRange,
    /// Scroll after each batch, before `batch_gap`.
    pub batch_scroll: Option<ScrollPlan>,
    /// Pause between two polls.
    pub batch_gap: DelayRange,
}

/// Per-type strategy producing candidate targets and acting on them.
#[async_trait]
pub trait ActionSource: Send + Sync {
    fn kind(&self) -> AutomationType;

    fn cadence(&self) -> Cadence;

    /// Scan the page for actionable targets.
    async fn poll(&self, cx: &SourceContext<'_>) -> Result<Vec<ActionTarget>, PageError>;

    /// Perform the action on one target.
    async fn act(&self, target: &ActionTarget, cx: &SourceContext<'_>) -> ActionOutcome;
}

/// Construct the source for a task's settings.
///
/// `ai` is the optional content generator used by posts with `useAI` set.
pub fn build_source(
    settings: &Settings,
    ai: Option<Arc<dyn ContentSource>>,
) -> Box<dyn ActionSource> {
    match settings {
        Settings::Connections(s) => Box::new(ConnectionSource::new(s.clone())),
        Settings::Posts(s) => Box::new(PostSource::new(s.clone(), ai)),
        Settings::Feed(s) => Box::new(FeedSource::new(s.clone())),
        Settings::Messages(s) => Box::new(MessageSource::new(s.clone())),
    }
}
