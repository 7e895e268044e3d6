//! Scripted page.
//!
//! An in-memory stand-in for the live page, built from a JSON fixture:
//!
//! ```json
//! {
//!   "profiles": [{ "name": "Ava", "headline": "Engineer" }],
//!   "feed": ["We're hiring Rust engineers", "Weekend photos"],
//!   "composer": true
//! }
//! ```
//!
//! It reacts the way the real page does: a sent invitation removes the profile's connect
//! control, a like marks the feed item as engaged, and a submitted post closes the composer.
//! Every interaction is logged and recorded so runs can be inspected afterwards.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use super::{Affordance, Element, ElementId, Page, PageError, Surface};

/// Page content to simulate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageFixture {
    /// Profile cards that offer a connect control.
    pub profiles: Vec<ProfileFixture>,
    /// Text of every feed update.
    pub feed: Vec<String>,
    /// Whether the "start a post" control is present.
    pub composer: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileFixture {
    pub name: Option<String>,
    pub headline: Option<String>,
}

/// One recorded interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Interaction {
    Click(ElementId),
    Fill(ElementId, String),
    Scroll(Surface, i64),
}

/// An invitation that was actually sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentInvitation {
    pub profile: usize,
    pub note: String,
}

#[derive(Debug, Default)]
struct InviteDialog {
    profile: usize,
    note_open: bool,
    note: String,
}

#[derive(Debug, Default)]
struct State {
    invited: Vec<bool>,
    liked: Vec<bool>,
    dialog: Option<InviteDialog>,
    composer_open: bool,
    draft: String,
    posts: Vec<String>,
    invitations: Vec<SentInvitation>,
    document_offset: i64,
    feed_offset: i64,
    log: Vec<Interaction>,
}

pub struct ScriptedPage {
    fixture: PageFixture,
    state: Mutex<State>,
}

impl ScriptedPage {
    pub fn new(fixture: PageFixture) -> Self {
        let state = State {
            invited: vec![false; fixture.profiles.len()],
            liked: vec![false; fixture.feed.len()],
            ..State::default()
        };
        Self {
            fixture,
            state: Mutex::new(state),
        }
    }

    /// Load a fixture file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page fixture {}", path.display()))?;
        let fixture: PageFixture = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse page fixture {}", path.display()))?;
        debug!(
            target: "linkpilot::page",
            profiles = fixture.profiles.len(),
            feed = fixture.feed.len(),
            composer = fixture.composer,
            "Loaded page fixture"
        );
        Ok(Self::new(fixture))
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.state().log.clone()
    }

    pub fn invitations(&self) -> Vec<SentInvitation> {
        self.state().invitations.clone()
    }

    pub fn posts(&self) -> Vec<String> {
        self.state().posts.clone()
    }

    /// Indices of liked feed items.
    pub fn liked(&self) -> Vec<usize> {
        self.state()
            .liked
            .iter()
            .enumerate()
            .filter_map(|(i, liked)| liked.then_some(i))
            .collect()
    }

    pub fn scroll_offset(&self, surface: Surface) -> i64 {
        let state = self.state();
        match surface {
            Surface::Document => state.document_offset,
            Surface::Feed => state.feed_offset,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Parse "<prefix>-<index>" element ids.
fn indexed(id: &ElementId, prefix: &str) -> Option<usize> {
    id.0.strip_prefix(prefix)?.strip_prefix('-')?.parse().ok()
}

#[async_trait]
impl Page for ScriptedPage {
    async fn find_all(
        &self,
        affordance: Affordance,
        within: Option<&ElementId>,
    ) -> Result<Vec<Element>, PageError> {
        let state = self.state();
        let found = match affordance {
            Affordance::ConnectButton => self
                .fixture
                .profiles
                .iter()
                .enumerate()
                .filter(|(i, _)| !state.invited[*i])
                .map(|(i, p)| {
                    let mut el = Element::new(format!("connect-{i}"));
                    if let Some(name) = &p.name {
                        el = el.with_field("name", name.clone());
                    }
                    if let Some(headline) = &p.headline {
                        el = el.with_field("headline", headline.clone());
                    }
                    el
                })
                .collect(),
            Affordance::AddNote => match &state.dialog {
                Some(d) if !d.note_open => vec![Element::new("add-note")],
                _ => vec![],
            },
            Affordance::NoteInput => match &state.dialog {
                Some(d) if d.note_open => vec![Element::new("note-input")],
                _ => vec![],
            },
            Affordance::SendNow => match &state.dialog {
                Some(_) => vec![Element::new("send-now")],
                None => vec![],
            },
            Affordance::StartPost if self.fixture.composer && !state.composer_open => {
                vec![Element::new("start-post")]
            }
            Affordance::PostEditor if state.composer_open => vec![Element::new("post-editor")],
            Affordance::SubmitPost if state.composer_open => vec![Element::new("post-submit")],
            Affordance::StartPost | Affordance::PostEditor | Affordance::SubmitPost => vec![],
            Affordance::FeedItem => self
                .fixture
                .feed
                .iter()
                .enumerate()
                .map(|(i, text)| {
                    Element::new(format!("feed-{i}"))
                        .with_field("content", text.clone())
                        .with_field("engaged", state.liked[i].to_string())
                })
                .collect(),
            Affordance::LikeButton => {
                let scope = within.and_then(|id| indexed(id, "feed"));
                (0..self.fixture.feed.len())
                    .filter(|i| scope.is_none_or(|s| s == *i))
                    .filter(|i| !state.liked[*i])
                    .map(|i| Element::new(format!("like-{i}")))
                    .collect()
            }
        };
        Ok(found)
    }

    async fn click(&self, element: &ElementId) -> Result<(), PageError> {
        let mut state = self.state();
        let detached = || PageError::Detached(element.clone());

        if let Some(i) = indexed(element, "connect") {
            if state.invited.get(i).copied() != Some(false) {
                return Err(detached());
            }
            state.dialog = Some(InviteDialog {
                profile: i,
                ..InviteDialog::default()
            });
        } else if let Some(i) = indexed(element, "like") {
            match state.liked.get_mut(i) {
                Some(liked) if !*liked => *liked = true,
                _ => return Err(detached()),
            }
        } else {
            match element.0.as_str() {
                "add-note" => match state.dialog.as_mut() {
                    Some(d) => d.note_open = true,
                    None => return Err(detached()),
                },
                "send-now" => {
                    let dialog = state.dialog.take().ok_or_else(detached)?;
                    state.invited[dialog.profile] = true;
                    state.invitations.push(SentInvitation {
                        profile: dialog.profile,
                        note: dialog.note,
                    });
                }
                "start-post" if self.fixture.composer => state.composer_open = true,
                "post-submit" if state.composer_open => {
                    let draft = std::mem::take(&mut state.draft);
                    state.posts.push(draft);
                    state.composer_open = false;
                }
                _ => return Err(detached()),
            }
        }

        info!(target: "linkpilot::page", %element, "click");
        state.log.push(Interaction::Click(element.clone()));
        Ok(())
    }

    async fn fill(&self, element: &ElementId, text: &str) -> Result<(), PageError> {
        let mut state = self.state();
        match element.0.as_str() {
            "note-input" => match state.dialog.as_mut() {
                Some(d) if d.note_open => d.note = text.to_string(),
                _ => return Err(PageError::Detached(element.clone())),
            },
            "post-editor" if state.composer_open => state.draft = text.to_string(),
            _ => return Err(PageError::Detached(element.clone())),
        }

        info!(target: "linkpilot::page", %element, %text, "fill");
        state.log.push(Interaction::Fill(element.clone(), text.to_string()));
        Ok(())
    }

    async fn scroll_by(&self, surface: Surface, dy: i64) -> Result<(), PageError> {
        let mut state = self.state();
        match surface {
            Surface::Document => state.document_offset += dy,
            Surface::Feed => state.feed_offset += dy,
        }
        debug!(target: "linkpilot::page", ?surface, dy, "scroll");
        state.log.push(Interaction::Scroll(surface, dy));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PageFixture {
        serde_json::from_str(
            r#"{
                "profiles": [{ "name": "Ava", "headline": "Engineer" }, { "name": "Bo" }],
                "feed": ["first", "second"],
                "composer": true
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn demo_fixture_loads() {
        let page =
            ScriptedPage::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/page.json")).unwrap();
        assert_eq!(page.find_all(Affordance::ConnectButton, None).await.unwrap().len(), 4);
        assert_eq!(page.find_all(Affordance::FeedItem, None).await.unwrap().len(), 4);
        assert!(page.find(Affordance::StartPost, None).await.unwrap().is_some());
        assert!(ScriptedPage::from_path("does/not/exist.json").is_err());
    }

    #[tokio::test]
    async fn invitation_flow_removes_connect_control() {
        let page = ScriptedPage::new(fixture());
        let buttons = page.find_all(Affordance::ConnectButton, None).await.unwrap();
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0].fields.get("headline").unwrap(), "Engineer");
        assert!(!buttons[1].fields.contains_key("headline"));

        page.click(&buttons[0].id).await.unwrap();
        let add = page.find(Affordance::AddNote, None).await.unwrap().unwrap();
        page.click(&add.id).await.unwrap();
        let input = page.find(Affordance::NoteInput, None).await.unwrap().unwrap();
        page.fill(&input.id, "hello").await.unwrap();
        let send = page.find(Affordance::SendNow, None).await.unwrap().unwrap();
        page.click(&send.id).await.unwrap();

        assert_eq!(
            page.invitations(),
            vec![SentInvitation {
                profile: 0,
                note: "hello".into()
            }]
        );
        assert_eq!(page.find_all(Affordance::ConnectButton, None).await.unwrap().len(), 1);
        assert!(page.click(&ElementId::from("connect-0")).await.is_err());
    }

    #[tokio::test]
    async fn like_marks_item_engaged() {
        let page = ScriptedPage::new(fixture());
        let item = ElementId::from("feed-1");
        let like = page.find(Affordance::LikeButton, Some(&item)).await.unwrap().unwrap();
        assert_eq!(like.id, ElementId::from("like-1"));
        page.click(&like.id).await.unwrap();

        let items = page.find_all(Affordance::FeedItem, None).await.unwrap();
        assert_eq!(items[1].fields.get("engaged").unwrap(), "true");
        assert!(page.find(Affordance::LikeButton, Some(&item)).await.unwrap().is_none());
        assert_eq!(page.liked(), vec![1]);
    }

    #[tokio::test]
    async fn composer_flow_records_post() {
        let page = ScriptedPage::new(fixture());
        page.click(&ElementId::from("start-post")).await.unwrap();
        assert!(page.find(Affordance::StartPost, None).await.unwrap().is_none());
        page.fill(&ElementId::from("post-editor"), "content").await.unwrap();
        page.click(&ElementId::from("post-submit")).await.unwrap();
        assert_eq!(page.posts(), vec!["content".to_string()]);
        assert!(page.find(Affordance::StartPost, None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn scroll_accumulates_per_surface() {
        let page = ScriptedPage::new(PageFixture::default());
        page.scroll_by(Surface::Feed, 50).await.unwrap();
        page.scroll_by(Surface::Feed, 25).await.unwrap();
        assert_eq!(page.scroll_offset(Surface::Feed), 75);
        assert_eq!(page.scroll_offset(Surface::Document), 0);
        assert_eq!(page.interactions().len(), 2);
    }
}
