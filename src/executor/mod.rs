#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Executor module for Linkpilot.

This module wires together:
- `pacing`: randomized human-like delays and paced scrolling
- `rate_limit`: per-type action quotas over a fixed window
- `task`: task identity, state and the handle returned to callers
- `scheduler`: owns the running tasks and drives each task's polling loop

Typical usage:
- Build a `TaskScheduler` over a page and a backend sink.
- Call `start` with a type's settings, `stop`/`stop_all` to end runs.

Example:
```no_run
use std::sync::Arc;
use linkpilot::config::{FeedSettings, Settings};
use linkpilot::executor::TaskScheduler;
use linkpilot::page::{PageFixture, ScriptedPage};
use linkpilot::sync::LogSync;

# async fn demo() -> anyhow::Result<()> {
let page = Arc::new(ScriptedPage::new(PageFixture::default()));
let scheduler = TaskScheduler::new(page, Arc::new(LogSync));
scheduler.start(Settings::Feed(FeedSettings::default()))?;
scheduler.shutdown().await;
# Ok(())
# }
```
*/

pub mod pacing;
pub mod rate_limit;
pub mod scheduler;
pub mod task;

// Re-exports for convenient access from `linkpilot::executor::*`
pub use pacing::{DelayRange, PacingModel, Wake};
pub use rate_limit::{RateLimiter, RateWindow};
pub use scheduler::{SchedulerBuilder, TaskScheduler};
pub use task::{Task, TaskHandle, TaskId, TaskState};
