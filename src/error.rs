//! Failure taxonomy of the automation orchestrator.
//!
//! Only `InvalidSettings` ever reaches a caller (synchronously, from `TaskScheduler::start`).
//! The other variants are produced inside task loops, logged by the scheduler, and swallowed.

use thiserror::Error;

use crate::config::AutomationType;
use crate::page::PageError;
use crate::sync::SyncError;

#[derive(Debug, Error)]
pub enum AutomationError {
    /// Rejected before the task loop starts.
    #[error("invalid {kind} settings: {reason}")]
    InvalidSettings { kind: AutomationType, reason: String },

    /// One target's action could not complete; the loop moves on to the next target.
    #[error("{kind} action failed: {reason}")]
    ActionFailed { kind: AutomationType, reason: String },

    /// An iteration failed as a whole; the loop backs off and retries.
    #[error("{kind} iteration failed: {source}")]
    TransientLoop {
        kind: AutomationType,
        #[source]
        source: PageError,
    },

    /// A backend report failed. Never retried, never affects the page-side action.
    #[error("backend report failed: {0}")]
    SyncFailed(#[from] SyncError),
}

impl AutomationError {
    pub(crate) fn invalid(kind: AutomationType, reason: impl Into<String>) -> Self {
        AutomationError::InvalidSettings {
            kind,
            reason: reason.into(),
        }
    }
}
