//! Post content sources.
//!
//! Generating post text (e.g. with a language model) is a pluggable capability: the
//! scheduler is handed an optional [`ContentSource`] and never writes content itself.

use anyhow::Result;
use async_trait::async_trait;

/// Fallback post text used when no generator is configured or it fails.
pub const DEFAULT_POST: &str = "Your post content here";

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Static identifier used in logs.
    fn name(&self) -> &'static str;

    /// Produce the body of the next post. Hashtags are appended by the caller.
    async fn compose(&self, hashtags: &[String]) -> Result<String>;
}

/// Always returns the same text.
#[derive(Debug, Clone)]
pub struct StaticContent {
    text: String,
}

impl StaticContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Default for StaticContent {
    fn default() -> Self {
        Self::new(DEFAULT_POST)
    }
}

#[async_trait]
impl ContentSource for StaticContent {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn compose(&self, _hashtags: &[String]) -> Result<String> {
        Ok(self.text.clone())
    }
}
