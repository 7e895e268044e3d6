use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root configuration for Linkpilot.
///
/// Deserialized from a JSON file. Every section is optional and falls back to the
/// defaults the browser extension ships with:
/// - `backend`: where action reports are sent
/// - `pacing`: global speed factor applied to every randomized delay
/// - `server`: bind address for the bundled backend sink
/// - `automations`: per-type settings used when `linkpilot run` starts up
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub automations: AutomationSettings,
}

/// Backend sink client settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Base URL of the backend API, including the `/api` prefix.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

/// Pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PacingConfig {
    /// Multiplier applied to every sampled delay (1.0 = human cadence).
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

/// Backend sink server settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Bind address, e.g. "127.0.0.1:3000".
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// Settings for every automation type, as stored by the settings UI.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AutomationSettings {
    #[serde(default)]
    pub connections: ConnectionSettings,
    #[serde(default)]
    pub posts: PostSettings,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub messages: MessageSettings,
}

impl AutomationSettings {
    /// Settings of every type whose `enabled` flag is set, in `AutomationType::ALL` order.
    pub fn enabled(&self) -> Vec<Settings> {
        let mut out = Vec::new();
        if self.connections.enabled {
            out.push(Settings::Connections(self.connections.clone()));
        }
        if self.posts.enabled {
            out.push(Settings::Posts(self.posts.clone()));
        }
        if self.feed.enabled {
            out.push(Settings::Feed(self.feed.clone()));
        }
        if self.messages.enabled {
            out.push(Settings::Messages(self.messages.clone()));
        }
        out
    }
}

/// The four automation types. At most one task per type runs at a time.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AutomationType {
    Connections,
    Posts,
    Feed,
    Messages,
}

impl AutomationType {
    pub const ALL: [AutomationType; 4] = [
        AutomationType::Connections,
        AutomationType::Posts,
        AutomationType::Feed,
        AutomationType::Messages,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            AutomationType::Connections => "connections",
            AutomationType::Posts => "posts",
            AutomationType::Feed => "feed",
            AutomationType::Messages => "messages",
        }
    }
}

impl fmt::Display for AutomationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection request settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    pub enabled: bool,
    /// Personalized note; supports `{name}` and `{headline}`.
    pub message_template: String,
    /// Maximum connection requests per day-long window.
    #[serde(alias = "maxRequests")]
    pub max_requests_per_window: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            message_template:
                "Hi {name}, I noticed your work as {headline} and would love to connect!"
                    .to_string(),
            max_requests_per_window: 50,
        }
    }
}

/// Post creation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PostSettings {
    pub enabled: bool,
    /// Ask the injected content source for post text instead of the static fallback.
    #[serde(rename = "useAI")]
    pub use_ai: bool,
    /// Hashtags appended to every post.
    pub hashtags: Vec<String>,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            use_ai: true,
            hashtags: Vec::new(),
        }
    }
}

/// Feed scrolling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedSettings {
    pub enabled: bool,
    /// Like feed items whose text contains one of `keywords`.
    pub auto_engage: bool,
    /// Case-insensitive substrings.
    pub keywords: Vec<String>,
}

/// Messaging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageSettings {
    pub enabled: bool,
    pub templates: Vec<String>,
}

/// Settings of one automation type. Immutable for the lifetime of a task.
///
/// Serializes as `{"type": "...", "settings": {...}}`, the body of `/automation/start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", content = "settings", rename_all = "lowercase")]
pub enum Settings {
    Connections(ConnectionSettings),
    Posts(PostSettings),
    Feed(FeedSettings),
    Messages(MessageSettings),
}

impl Settings {
    pub fn kind(&self) -> AutomationType {
        match self {
            Settings::Connections(_) => AutomationType::Connections,
            Settings::Posts(_) => AutomationType::Posts,
            Settings::Feed(_) => AutomationType::Feed,
            Settings::Messages(_) => AutomationType::Messages,
        }
    }

    /// Actions allowed per rate window, or `None` when the type is not quota-bound.
    pub fn quota(&self) -> Option<u32> {
        match self {
            Settings::Connections(c) => Some(c.max_requests_per_window),
            _ => None,
        }
    }
}
