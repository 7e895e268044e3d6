//! Messaging source placeholder.
//!
//! Messaging has no page flow yet: `poll` never yields targets, so the loop only idles on
//! the 5–10 minute batch cadence until stopped.

use async_trait::async_trait;
use tracing::trace;

use super::{ActionOutcome, ActionSource, ActionTarget, Cadence, SourceContext};
use crate::config::{AutomationType, MessageSettings};
use crate::executor::pacing::DelayRange;
use crate::page::PageError;

#[derive(Debug, Clone)]
pub struct MessageSource {
    settings: MessageSettings,
}

impl MessageSource {
    pub fn new(settings: MessageSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ActionSource for MessageSource {
    fn kind(&self) -> AutomationType {
        AutomationType::Messages
    }

    fn cadence(&self) -> Cadence {
        Cadence {
            action_gap: DelayRange::secs(2, 4),
            batch_scroll: None,
            batch_gap: DelayRange::minutes(5, 10),
        }
    }

    async fn poll(&self, _cx: &SourceContext<'_>) -> Result<Vec<ActionTarget>, PageError> {
        trace!(
            target: "linkpilot::sources",
            templates = self.settings.templates.len(),
            "No messaging flow; nothing to send"
        );
        Ok(Vec::new())
    }

    async fn act(&self, _target: &ActionTarget, _cx: &SourceContext<'_>) -> ActionOutcome {
        ActionOutcome::Skipped("messaging has no page flow".into())
    }
}
