use rand::random_range;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::page::{Page, PageError, Surface};

/// Number of increments a human-like scroll is split into.
pub const SCROLL_STEPS: u32 = 10;

/// Largest accepted pacing scale.
pub const MAX_SCALE: f64 = 100.0;

/// Pause between two scroll increments.
pub const SCROLL_STEP_GAP: DelayRange = DelayRange::new(100, 300);

/// Inclusive bounds of a randomized delay, in milliseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn secs(min: u64, max: u64) -> Self {
        Self::new(min * 1_000, max * 1_000)
    }

    pub const fn minutes(min: u64, max: u64) -> Self {
        Self::secs(min * 60, max * 60)
    }
}

/// How a cancellable wait ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    Cancelled,
}

impl Wake {
    pub fn is_cancelled(self) -> bool {
        self == Wake::Cancelled
    }
}

/// Randomized, human-like timing.
///
/// Two primitives: [`PacingModel::delay`] (uniform random wait) and
/// [`PacingModel::scroll_by`] (a scroll split into paced increments). The `*_until`
/// variants race the wait against a cancellation token so a stop request never has to
/// wait out a multi-minute pause.
#[derive(Debug, Clone)]
pub struct PacingModel {
    scale: f64,
}

impl Default for PacingModel {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl PacingModel {
    /// Human cadence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every sampled delay is multiplied by `scale` (clamped to `[0, MAX_SCALE]`).
    pub fn scaled(scale: f64) -> Self {
        let scale = if scale.is_finite() {
            scale.clamp(0.0, MAX_SCALE)
        } else {
            1.0
        };
        Self { scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Draw a duration uniformly from `[min_ms, max_ms]` (bounds are swapped if reversed).
    pub fn sample(&self, range: DelayRange) -> Duration {
        let (lo, hi) = if range.min_ms <= range.max_ms {
            (range.min_ms, range.max_ms)
        } else {
            (range.max_ms, range.min_ms)
        };
        let ms = if lo == hi { lo } else { random_range(lo..=hi) };
        if self.scale == 1.0 {
            Duration::from_millis(ms)
        } else {
            Duration::try_from_secs_f64(ms as f64 / 1_000.0 * self.scale).unwrap_or(Duration::MAX)
        }
    }

    /// Suspend for a random duration in `[min_ms, max_ms]`. Returns the duration slept.
    pub async fn delay(&self, min_ms: u64, max_ms: u64) -> Duration {
        let d = self.sample(DelayRange::new(min_ms, max_ms));
        trace!(target: "linkpilot::pacing", delay_ms = d.as_millis() as u64, "delay");
        sleep(d).await;
        d
    }

    /// Like [`PacingModel::delay`], but returns early once `cancel` fires.
    pub async fn delay_until(&self, range: DelayRange, cancel: &CancellationToken) -> Wake {
        if cancel.is_cancelled() {
            return Wake::Cancelled;
        }
        let d = self.sample(range);
        trace!(target: "linkpilot::pacing", delay_ms = d.as_millis() as u64, "cancellable delay");
        tokio::select! {
            _ = cancel.cancelled() => Wake::Cancelled,
            _ = sleep(d) => Wake::Elapsed,
        }
    }

    /// Scroll `surface` by `total` pixels in `steps` increments, pausing
    /// [`SCROLL_STEP_GAP`] after each one. The remainder of `total / steps` is spread over
    /// the first increments so the page ends up exactly `total` pixels further.
    ///
    /// Cancellation is checked before every increment and interrupts the pauses.
    pub async fn scroll_by(
        &self,
        page: &dyn Page,
        surface: Surface,
        total: i64,
        steps: u32,
        cancel: &CancellationToken,
    ) -> Result<Wake, PageError> {
        if steps == 0 {
            return Ok(Wake::Elapsed);
        }
        let n = i64::from(steps);
        let (base, rem) = (total / n, total % n);

        for i in 0..n {
            if cancel.is_cancelled() {
                return Ok(Wake::Cancelled);
            }
            let step = base + if i < rem.abs() { rem.signum() } else { 0 };
            page.scroll_by(surface, step).await?;
            if self.delay_until(SCROLL_STEP_GAP, cancel).await.is_cancelled() {
                return Ok(Wake::Cancelled);
            }
        }
        Ok(Wake::Elapsed)
    }
}
