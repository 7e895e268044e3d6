/*!
Page collaborator.

The orchestrator never touches selectors. It asks the injected [`Page`] for semantic
[`Affordance`]s ("the connect buttons", "the like button inside this feed item") and gets
back [`Element`] handles carrying whatever text the page extracted for them. How an
affordance maps onto a concrete DOM is the page implementation's business.

- `scripted.rs` -> `ScriptedPage` (in-memory page driven by a JSON fixture)
*/

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub mod scripted;

pub use scripted::{Interaction, PageFixture, ProfileFixture, ScriptedPage};

/// Semantic page elements an automation can look for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affordance {
    /// "Connect" control on a profile card. Fields: `name`, `headline`.
    ConnectButton,
    /// "Add a note" control of the invitation dialog.
    AddNote,
    /// Text area of the invitation note.
    NoteInput,
    /// "Send now" control of the invitation dialog.
    SendNow,
    /// "Start a post" control.
    StartPost,
    /// Editor of the post composer.
    PostEditor,
    /// "Post" control of the composer.
    SubmitPost,
    /// One feed update. Fields: `content`, `engaged`.
    FeedItem,
    /// "Like" control, looked up inside a feed item.
    LikeButton,
}

impl fmt::Display for Affordance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Affordance::ConnectButton => "connect button",
            Affordance::AddNote => "add-note button",
            Affordance::NoteInput => "note input",
            Affordance::SendNow => "send-now button",
            Affordance::StartPost => "start-post button",
            Affordance::PostEditor => "post editor",
            Affordance::SubmitPost => "post button",
            Affordance::FeedItem => "feed item",
            Affordance::LikeButton => "like button",
        };
        f.write_str(s)
    }
}

/// Scrollable regions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Document,
    Feed,
}

/// Opaque page-side identifier of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub String);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        ElementId(s.to_string())
    }
}

/// A located element and the text fields extracted for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Element {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ElementId(id.into()),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("no {0} on the page")]
    Missing(Affordance),

    #[error("element {0} is no longer attached to the page")]
    Detached(ElementId),

    #[error("page driver error: {0}")]
    Driver(String),
}

/// The live page an automation runs against.
#[async_trait]
pub trait Page: Send + Sync {
    /// Every visible element of the given kind, optionally scoped to a container element.
    async fn find_all(
        &self,
        affordance: Affordance,
        within: Option<&ElementId>,
    ) -> Result<Vec<Element>, PageError>;

    /// First visible element of the given kind.
    async fn find(
        &self,
        affordance: Affordance,
        within: Option<&ElementId>,
    ) -> Result<Option<Element>, PageError> {
        Ok(self.find_all(affordance, within).await?.into_iter().next())
    }

    async fn click(&self, element: &ElementId) -> Result<(), PageError>;

    /// Replace an input's value and fire the input event.
    async fn fill(&self, element: &ElementId, text: &str) -> Result<(), PageError>;

    /// Scroll a surface vertically by `dy` pixels.
    async fn scroll_by(&self, surface: Surface, dy: i64) -> Result<(), PageError>;
}
