//! In-memory activity log shared by the sink's handlers.

use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sync::Stats;

/// Everything the sink has been told about, in arrival order.
#[derive(Debug, Default)]
pub struct ActivityLog {
    pub connections: Vec<Value>,
    pub posts: Vec<Value>,
    pub messages: Vec<Value>,
}

impl ActivityLog {
    pub fn stats(&self) -> Stats {
        Stats {
            connections: self.connections.len() as u64,
            posts: self.posts.len() as u64,
            messages: self.messages.len() as u64,
        }
    }
}

#[derive(Clone, Default)]
pub struct AppState {
    log: Arc<Mutex<ActivityLog>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, ActivityLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
