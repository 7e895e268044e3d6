#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Linkpilot: a paced automation orchestrator for a professional-network page.
//!
//! The crate runs one polling loop per automation type (connection requests, posts, feed
//! engagement, messages) against an injected page collaborator, paces every step with
//! randomized human-like delays, caps actions per window, and reports what it did to a backend
//! sink. Most implementation details live under the internal modules:
//! - `config`: Configuration models, loader, and schema helpers.
//! - `executor`: Pacing, rate limiting, and the task scheduler.
//! - `sources`: One action source per automation type.
//! - `page`: The page collaborator interface and a scripted in-memory page.
//! - `sync`: Backend reporting (HTTP and log-only).
//! - `server`: The backend sink HTTP service.
//! - `control`: Host commands (start/stop/status) read as NDJSON.
//! - `utils`: Template rendering and text helpers.
//!
//! Use `linkpilot::prelude::*` to bring commonly used items into scope quickly.

/// Public module: configuration (models, loader, schema helpers).
pub mod config;
/// Public module: post content sources.
pub mod content;
/// Public module: host command surface.
pub mod control;
/// Public module: error taxonomy.
pub mod error;
/// Public module: execution engine (pacing, rate limiting, scheduler).
pub mod executor;
/// Public module: page collaborator.
pub mod page;
/// Public module: backend sink service.
pub mod server;
/// Public module: per-type action sources.
pub mod sources;
/// Public module: backend reporting.
pub mod sync;
/// Public module: utilities (templates, text helpers).
pub mod utils;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Initialize tracing (logging) with a reasonable default.
/// - An explicit `level` (trace|debug|info|warn|error) wins.
/// - Otherwise honors the `RUST_LOG` environment variable if it holds a plain level.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing(level: Option<&str>) {
    use tracing::Level;
    use tracing_subscriber::fmt;

    fn parse(s: &str) -> Option<Level> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }

    let level = level
        .and_then(parse)
        .or_else(|| std::env::var("RUST_LOG").ok().as_deref().and_then(parse))
        .unwrap_or(Level::INFO);

    // Logs go to stderr; stdout carries command replies.
    let _ = fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use linkpilot::prelude::*;`
pub mod prelude {
    // Common result/error handling
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    // Serialization
    pub use serde::{Deserialize, Serialize};

    // Tracing macros
    pub use tracing::{debug, error, info, instrument, trace, warn};

    // Timing helpers
    pub use std::time::Duration;
    pub use tokio::time::sleep;

    // External crates (namespaced) if callers want direct access
    pub use crate as linkpilot;
    pub use rand;

    // Frequently used items
    pub use crate::config::{AutomationType, Settings};
    pub use crate::error::AutomationError;
    pub use crate::executor::{TaskScheduler, TaskState};
    pub use crate::page::{Page, PageFixture, ScriptedPage};
    pub use crate::sync::{BackendSync, HttpSync, LogSync};
    pub use crate::{config, executor, sources, utils};
}
