use anyhow::{Context, Result, bail};
use schemars::{Schema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use super::models::{
    AutomationType, ConnectionSettings, Config, FeedSettings, MessageSettings, PostSettings,
    Settings,
};
use crate::error::AutomationError;
use crate::executor::pacing::MAX_SCALE;

/// Load configuration from a string slice.
pub fn load_from_str(s: &str) -> Result<Config> {
    let cfg: Config =
        serde_json::from_str(s).context("Failed to parse JSON config string into Config")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<Config> {
    let cfg: Config =
        serde_json::from_reader(reader).context("Failed to parse JSON config from reader")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open config file {}", path_ref.display()))?;
    let cfg = load_from_reader(file)?;
    debug!("Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Load configuration from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<Config> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
    let cfg: Config = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON config from {}", path_ref.display()))?;
    validate_config(&cfg)?;
    debug!("Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Generate the JSON Schema for the Config model.
pub fn generate_schema() -> Schema {
    schema_for!(Config)
}

/// Write the JSON Schema for the Config model to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Sanity checks for the process-level sections.
///
/// Automation settings are only validated for enabled types here; every task validates
/// its own settings again when it is started.
pub fn validate_config(cfg: &Config) -> Result<()> {
    if !(0.0..=MAX_SCALE).contains(&cfg.pacing.scale) {
        bail!(
            "pacing.scale must be between 0 and {MAX_SCALE} (got {})",
            cfg.pacing.scale
        );
    }
    if cfg.backend.url.trim().is_empty() {
        bail!("backend.url must not be empty");
    }
    if cfg.backend.timeout_ms == 0 {
        bail!("backend.timeoutMs must be greater than zero");
    }

    for settings in cfg.automations.enabled() {
        let kind = settings.kind();
        settings
            .validate()
            .with_context(|| format!("Invalid `automations.{kind}` section"))?;
    }

    Ok(())
}

impl Settings {
    /// Parse the settings payload of one automation type.
    ///
    /// `null` stands for "use the defaults".
    pub fn from_value(kind: AutomationType, value: Value) -> Result<Settings, AutomationError> {
        let value = match value {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };
        Ok(match kind {
            AutomationType::Connections => Settings::Connections(parse(kind, value)?),
            AutomationType::Posts => Settings::Posts(parse(kind, value)?),
            AutomationType::Feed => Settings::Feed(parse(kind, value)?),
            AutomationType::Messages => Settings::Messages(parse(kind, value)?),
        })
    }

    /// Reject settings a task loop could not run with.
    pub fn validate(&self) -> Result<(), AutomationError> {
        let kind = self.kind();
        match self {
            Settings::Connections(c) => validate_connections(c),
            Settings::Posts(p) => validate_posts(p),
            Settings::Feed(f) => validate_feed(f),
            Settings::Messages(m) => validate_messages(m),
        }
        .map_err(|reason| AutomationError::invalid(kind, reason))
    }
}

fn parse<T: DeserializeOwned>(kind: AutomationType, value: Value) -> Result<T, AutomationError> {
    serde_json::from_value(value).map_err(|e| AutomationError::invalid(kind, e.to_string()))
}

fn validate_connections(c: &ConnectionSettings) -> Result<(), String> {
    if c.message_template.trim().is_empty() {
        return Err("messageTemplate must not be empty".into());
    }
    if c.max_requests_per_window == 0 {
        return Err("maxRequestsPerWindow must be at least 1".into());
    }
    Ok(())
}

fn validate_posts(p: &PostSettings) -> Result<(), String> {
    if let Some(bad) = p.hashtags.iter().find(|t| t.trim().contains(char::is_whitespace)) {
        return Err(format!("hashtag '{bad}' must be a single word"));
    }
    Ok(())
}

fn validate_feed(f: &FeedSettings) -> Result<(), String> {
    if f.auto_engage && f.keywords.iter().all(|k| k.trim().is_empty()) {
        return Err("autoEngage requires at least one non-empty keyword".into());
    }
    Ok(())
}

fn validate_messages(m: &MessageSettings) -> Result<(), String> {
    if m.templates.iter().any(|t| t.trim().is_empty()) {
        return Err("message templates must not be empty".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_to_empty_document() {
        let cfg = load_from_str("{}").unwrap();
        assert_eq!(cfg.backend.url, "http://localhost:3000/api");
        assert_eq!(cfg.automations.connections.max_requests_per_window, 50);
        assert!(cfg.automations.posts.use_ai);
        assert!(cfg.automations.enabled().is_empty());
    }

    #[test]
    fn bundled_config_is_valid() {
        let cfg = load_from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/config/linkpilot.json"))
            .unwrap();
        let kinds: Vec<AutomationType> = cfg.automations.enabled().iter().map(Settings::kind).collect();
        assert_eq!(kinds, vec![AutomationType::Connections, AutomationType::Feed]);
    }

    #[test]
    fn camel_case_and_legacy_aliases() {
        let cfg = load_from_str(
            r#"{
                "automations": {
                    "connections": { "enabled": true, "messageTemplate": "Hi {name}", "maxRequests": 7 },
                    "posts": { "useAI": false, "hashtags": ["rust"] },
                    "feed": { "autoEngage": true, "keywords": ["hiring"] }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.automations.connections.max_requests_per_window, 7);
        assert!(!cfg.automations.posts.use_ai);
        assert!(cfg.automations.feed.auto_engage);
        assert_eq!(cfg.automations.enabled().len(), 1);
    }

    #[test]
    fn enabled_section_with_empty_template_is_rejected() {
        let err = load_from_str(
            r#"{ "automations": { "connections": { "enabled": true, "messageTemplate": "  " } } }"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("messageTemplate"));
    }

    #[test]
    fn out_of_range_pacing_scale_is_rejected() {
        assert!(load_from_str(r#"{ "pacing": { "scale": -1.0 } }"#).is_err());
        assert!(load_from_str(r#"{ "pacing": { "scale": 1e300 } }"#).is_err());
        assert!(load_from_str(r#"{ "pacing": { "scale": 100.0 } }"#).is_ok());
    }

    #[test]
    fn settings_from_null_use_defaults() {
        let s = Settings::from_value(AutomationType::Connections, Value::Null).unwrap();
        assert_eq!(s, Settings::Connections(ConnectionSettings::default()));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn settings_from_value_reports_type_errors() {
        let err = Settings::from_value(AutomationType::Feed, json!({ "keywords": "hiring" }))
            .unwrap_err();
        assert!(matches!(
            err,
            AutomationError::InvalidSettings {
                kind: AutomationType::Feed,
                ..
            }
        ));
    }

    #[test]
    fn feed_auto_engage_needs_keywords() {
        let s = Settings::Feed(FeedSettings {
            enabled: true,
            auto_engage: true,
            keywords: vec![" ".into()],
        });
        assert!(s.validate().is_err());
    }

    #[test]
    fn settings_serialize_as_start_body() {
        let s = Settings::Feed(FeedSettings {
            enabled: true,
            auto_engage: false,
            keywords: vec![],
        });
        assert_eq!(
            serde_json::to_value(&s).unwrap(),
            json!({
                "type": "feed",
                "settings": { "enabled": true, "autoEngage": false, "keywords": [] }
            })
        );
    }

    #[test]
    fn schema_mentions_sections() {
        let mut buf = Vec::new();
        write_schema_to_writer(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("automations"));
        assert!(text.contains("messageTemplate"));
    }
}
