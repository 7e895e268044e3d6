//! Connection request source.
//!
//! Targets are the visible connect controls whose profile card exposes both a name and a
//! headline. Acting opens the invitation dialog, adds a note rendered from
//! `messageTemplate`, and sends it.

use async_trait::async_trait;
use tracing::debug;

use super::{
    ActionOutcome, ActionPayload, ActionSource, ActionTarget, Cadence, ScrollPlan, SourceContext,
};
use crate::config::{AutomationType, ConnectionSettings};
use crate::executor::pacing::DelayRange;
use crate::page::{Affordance, PageError, Surface};
use crate::utils::template;

/// Document scroll after each batch, to load more profile cards.
const BATCH_SCROLL: i64 = 800;

#[derive(Debug, Clone)]
pub struct ConnectionSource {
    settings: ConnectionSettings,
}

impl ConnectionSource {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }

    async fn invite(
        &self,
        target: &ActionTarget,
        name: &str,
        headline: &str,
        cx: &SourceContext<'_>,
    ) -> Result<ActionPayload, PageError> {
        cx.page.click(&target.element).await?;
        cx.step_pause().await;

        let add_note = cx.require(Affordance::AddNote, None).await?;
        cx.page.click(&add_note.id).await?;
        cx.step_pause().await;

        let input = cx.require(Affordance::NoteInput, None).await?;
        let message = template::render(&self.settings.message_template, &target.template_fields());
        cx.page.fill(&input.id, &message).await?;
        cx.step_pause().await;

        let send = cx.require(Affordance::SendNow, None).await?;
        cx.page.click(&send.id).await?;

        Ok(ActionPayload::Connection {
            name: name.to_string(),
            headline: headline.to_string(),
            message,
        })
    }
}

fn has_profile(target: &ActionTarget) -> bool {
    target.field("name").is_some() && target.field("headline").is_some()
}

#[async_trait]
impl ActionSource for ConnectionSource {
    fn kind(&self) -> AutomationType {
        AutomationType::Connections
    }

    fn cadence(&self) -> Cadence {
        Cadence {
            action_gap: DelayRange::secs(2, 4),
            batch_scroll: Some(ScrollPlan {
                surface: Surface::Document,
                distance: BATCH_SCROLL,
            }),
            batch_gap: DelayRange::secs(1, 2),
        }
    }

    async fn poll(&self, cx: &SourceContext<'_>) -> Result<Vec<ActionTarget>, PageError> {
        let buttons = cx.page.find_all(Affordance::ConnectButton, None).await?;
        let total = buttons.len();
        let targets: Vec<ActionTarget> = buttons
            .into_iter()
            .map(ActionTarget::from)
            .filter(has_profile)
            .collect();
        if targets.len() < total {
            debug!(
                target: "linkpilot::sources",
                skipped = total - targets.len(),
                "Connect controls without name/headline ignored"
            );
        }
        Ok(targets)
    }

    async fn act(&self, target: &ActionTarget, cx: &SourceContext<'_>) -> ActionOutcome {
        let (Some(name), Some(headline)) = (target.field("name"), target.field("headline"))
        else {
            return ActionOutcome::Skipped("profile card lacks a name or headline".into());
        };
        self.invite(target, name, headline, cx).await.into()
    }
}
