//! Post creation source.
//!
//! Offers a single synthetic target ("compose a post") whenever the start-post control is
//! visible. Posting runs on a long cadence: one post, then a 5–10 minute pause.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ActionOutcome, ActionPayload, ActionSource, ActionTarget, Cadence, SourceContext};
use crate::config::{AutomationType, PostSettings};
use crate::content::{ContentSource, StaticContent};
use crate::executor::pacing::DelayRange;
use crate::page::{Affordance, PageError};
use crate::utils::text::format_hashtags;

pub struct PostSource {
    settings: PostSettings,
    ai: Option<Arc<dyn ContentSource>>,
    fallback: StaticContent,
}

impl PostSource {
    pub fn new(settings: PostSettings, ai: Option<Arc<dyn ContentSource>>) -> Self {
        Self {
            settings,
            ai,
            fallback: StaticContent::default(),
        }
    }

    /// Post body followed by the configured hashtags on their own line.
    async fn content(&self) -> String {
        let body = self.body().await;
        let tags = format_hashtags(&self.settings.hashtags);
        if tags.is_empty() {
            body
        } else {
            format!("{body}\n{tags}")
        }
    }

    async fn body(&self) -> String {
        if self.settings.use_ai {
            match &self.ai {
                Some(ai) => match ai.compose(&self.settings.hashtags).await {
                    Ok(text) if !text.trim().is_empty() => return text.trim().to_string(),
                    Ok(_) => warn!(
                        target: "linkpilot::sources",
                        source = ai.name(),
                        "Content source returned empty text; using fallback"
                    ),
                    Err(e) => warn!(
                        target: "linkpilot::sources",
                        source = ai.name(),
                        error = %format!("{e:#}"),
                        "Content source failed; using fallback"
                    ),
                },
                None => debug!(
                    target: "linkpilot::sources",
                    "useAI is set but no content source is configured; using fallback"
                ),
            }
        }
        self.fallback.text().to_string()
    }

    async fn publish(
        &self,
        target: &ActionTarget,
        cx: &SourceContext<'_>,
    ) -> Result<ActionPayload, PageError> {
        let content = self.content().await;

        cx.page.click(&target.element).await?;
        cx.step_pause().await;

        let editor = cx.require(Affordance::PostEditor, None).await?;
        cx.page.fill(&editor.id, &content).await?;
        cx.step_pause().await;

        let submit = cx.require(Affordance::SubmitPost, None).await?;
        cx.page.click(&submit.id).await?;

        Ok(ActionPayload::Post { content })
    }
}

#[async_trait]
impl ActionSource for PostSource {
    fn kind(&self) -> AutomationType {
        AutomationType::Posts
    }

    fn cadence(&self) -> Cadence {
        Cadence {
            action_gap: DelayRange::new(0, 0),
            batch_scroll: None,
            batch_gap: DelayRange::minutes(5, 10),
        }
    }

    async fn poll(&self, cx: &SourceContext<'_>) -> Result<Vec<ActionTarget>, PageError> {
        Ok(cx
            .page
            .find(Affordance::StartPost, None)
            .await?
            .map(ActionTarget::from)
            .into_iter()
            .collect())
    }

    async fn act(&self, target: &ActionTarget, cx: &SourceContext<'_>) -> ActionOutcome {
        self.publish(target, cx).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::pacing::PacingModel;
    use crate::page::{PageFixture, ScriptedPage};
    use anyhow::anyhow;
    use tokio_util::sync::CancellationToken;

    struct Generated(anyhow::Result<&'static str>);

    #[async_trait]
    impl ContentSource for Generated {
        fn name(&self) -> &'static str {
            "generated"
        }

        async fn compose(&self, _hashtags: &[String]) -> anyhow::Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(e) => Err(anyhow!("{e}")),
            }
        }
    }

    fn settings(use_ai: bool, hashtags: &[&str]) -> PostSettings {
        PostSettings {
            enabled: true,
            use_ai,
            hashtags: hashtags.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn static_content_with_hashtags() {
        let src = PostSource::new(settings(false, &["rust", "#tokio"]), None);
        assert_eq!(src.content().await, "Your post content here\n#rust #tokio");
    }

    #[tokio::test]
    async fn ai_content_is_used_when_enabled() {
        let ai: Arc<dyn ContentSource> = Arc::new(Generated(Ok("Shipping today")));
        let src = PostSource::new(settings(true, &[]), Some(Arc::clone(&ai)));
        assert_eq!(src.content().await, "Shipping today");

        let src = PostSource::new(settings(false, &[]), Some(ai));
        assert_eq!(src.content().await, "Your post content here");
    }

    #[tokio::test]
    async fn failing_generator_falls_back() {
        let ai: Arc<dyn ContentSource> = Arc::new(Generated(Err(anyhow!("quota"))));
        let src = PostSource::new(settings(true, &["news"]), Some(ai));
        assert_eq!(src.content().await, "Your post content here\n#news");
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_through_composer() {
        let page = ScriptedPage::new(PageFixture {
            composer: true,
            ..PageFixture::default()
        });
        let pacing = PacingModel::new();
        let cancel = CancellationToken::new();
        let cx = SourceContext {
            page: &page,
            pacing: &pacing,
            cancel: &cancel,
        };
        let src = PostSource::new(settings(false, &[]), None);

        let targets = src.poll(&cx).await.unwrap();
        assert_eq!(targets.len(), 1);
        match src.act(&targets[0], &cx).await {
            ActionOutcome::Success(ActionPayload::Post { content }) => {
                assert_eq!(content, "Your post content here")
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(page.posts(), vec!["Your post content here".to_string()]);
    }

    #[tokio::test]
    async fn no_target_without_composer() {
        let page = ScriptedPage::new(PageFixture::default());
        let pacing = PacingModel::new();
        let cancel = CancellationToken::new();
        let cx = SourceContext {
            page: &page,
            pacing: &pacing,
            cancel: &cancel,
        };
        let src = PostSource::new(settings(false, &[]), None);
        assert!(src.poll(&cx).await.unwrap().is_empty());
    }
}
