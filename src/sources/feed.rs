//! Feed scrolling source.
//!
//! Every poll scrolls the feed a little to surface more updates. With `autoEngage` on,
//! updates whose text contains one of the keywords (case-insensitive) and that are not
//! liked yet become targets; acting likes them.

use async_trait::async_trait;
use tracing::trace;

use super::{ActionOutcome, ActionPayload, ActionSource, ActionTarget, Cadence, SourceContext};
use crate::config::{AutomationType, FeedSettings};
use crate::executor::pacing::{DelayRange, SCROLL_STEPS};
use crate::page::{Affordance, PageError, Surface};
use crate::utils::text::contains_any_keyword;

/// Feed scroll performed by every poll.
const POLL_SCROLL: i64 = 500;

#[derive(Debug, Clone)]
pub struct FeedSource {
    settings: FeedSettings,
}

impl FeedSource {
    pub fn new(settings: FeedSettings) -> Self {
        Self { settings }
    }

    fn wants(&self, target: &ActionTarget) -> bool {
        if target.field("engaged") == Some("true") {
            return false;
        }
        target
            .field("content")
            .is_some_and(|text| contains_any_keyword(text, &self.settings.keywords))
    }
}

#[async_trait]
impl ActionSource for FeedSource {
    fn kind(&self) -> AutomationType {
        AutomationType::Feed
    }

    fn cadence(&self) -> Cadence {
        Cadence {
            action_gap: DelayRange::secs(1, 2),
            batch_scroll: None,
            batch_gap: DelayRange::secs(2, 4),
        }
    }

    async fn poll(&self, cx: &SourceContext<'_>) -> Result<Vec<ActionTarget>, PageError> {
        if cx.page.find(Affordance::FeedItem, None).await?.is_none() {
            trace!(target: "linkpilot::sources", "No feed on the page");
            return Ok(Vec::new());
        }

        let wake = cx
            .pacing
            .scroll_by(cx.page, Surface::Feed, POLL_SCROLL, SCROLL_STEPS, cx.cancel)
            .await?;
        if wake.is_cancelled() || !self.settings.auto_engage {
            return Ok(Vec::new());
        }

        Ok(cx
            .page
            .find_all(Affordance::FeedItem, None)
            .await?
            .into_iter()
            .map(ActionTarget::from)
            .filter(|t| self.wants(t))
            .collect())
    }

    async fn act(&self, target: &ActionTarget, cx: &SourceContext<'_>) -> ActionOutcome {
        let like = match cx.page.find(Affordance::LikeButton, Some(&target.element)).await {
            Ok(Some(like)) => like,
            Ok(None) => return ActionOutcome::Skipped("update has no like control".into()),
            Err(e) => return ActionOutcome::Failed(e.into()),
        };
        match cx.page.click(&like.id).await {
            Ok(()) => ActionOutcome::Success(ActionPayload::Engagement {}),
            Err(e) => ActionOutcome::Failed(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::pacing::PacingModel;
    use crate::page::{PageFixture, ScriptedPage};
    use tokio_util::sync::CancellationToken;

    fn page() -> ScriptedPage {
        ScriptedPage::new(PageFixture {
            feed: vec![
                "Weekend photos".into(),
                "We're HIRING Rust engineers".into(),
                "Quarterly results".into(),
            ],
            ..PageFixture::default()
        })
    }

    fn source(auto_engage: bool, keywords: &[&str]) -> FeedSource {
        FeedSource::new(FeedSettings {
            enabled: true,
            auto_engage,
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn poll_scrolls_and_filters_by_keyword() {
        let page = page();
        let pacing = PacingModel::new();
        let cancel = CancellationToken::new();
        let cx = SourceContext {
            page: &page,
            pacing: &pacing,
            cancel: &cancel,
        };
        let src = source(true, &["hiring"]);

        let targets = src.poll(&cx).await.unwrap();
        assert_eq!(page.scroll_offset(Surface::Feed), POLL_SCROLL);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].element.0, "feed-1");

        assert!(matches!(
            src.act(&targets[0], &cx).await,
            ActionOutcome::Success(ActionPayload::Engagement {})
        ));
        assert_eq!(page.liked(), vec![1]);
        assert!(src.poll(&cx).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn scroll_only_without_auto_engage() {
        let page = page();
        let pacing = PacingModel::new();
        let cancel = CancellationToken::new();
        let cx = SourceContext {
            page: &page,
            pacing: &pacing,
            cancel: &cancel,
        };
        let targets = source(false, &["hiring"]).poll(&cx).await.unwrap();
        assert!(targets.is_empty());
        assert_eq!(page.scroll_offset(Surface::Feed), POLL_SCROLL);
    }

    #[tokio::test]
    async fn empty_feed_is_left_alone() {
        let page = ScriptedPage::new(PageFixture::default());
        let pacing = PacingModel::new();
        let cancel = CancellationToken::new();
        let cx = SourceContext {
            page: &page,
            pacing: &pacing,
            cancel: &cancel,
        };
        assert!(source(true, &["x"]).poll(&cx).await.unwrap().is_empty());
        assert!(page.interactions().is_empty());
    }
}
