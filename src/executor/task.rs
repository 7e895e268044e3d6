use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::{AutomationType, Settings};

pub type TaskId = Uuid;

/// Externally visible state of an automation type.
///
/// `Idle -> Running` on start, `Running -> Stopping` on a stop request, `Stopping -> Idle`
/// once the loop has observed the cancellation and exited. Error backoff happens inside
/// `Running` and is not visible here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Idle,
    Running,
    Stopping,
}

/// One run of an automation type's loop.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub kind: AutomationType,
    pub settings: Settings,
    pub started_at: DateTime<Utc>,
}

impl Task {
    pub fn new(settings: Settings) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: settings.kind(),
            settings,
            started_at: Utc::now(),
        }
    }
}

/// Returned by `TaskScheduler::start`. Dropping it does not stop the task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    kind: AutomationType,
    started_at: DateTime<Utc>,
    state: watch::Receiver<TaskState>,
}

impl TaskHandle {
    pub(crate) fn new(task: &Task, state: watch::Receiver<TaskState>) -> Self {
        Self {
            id: task.id,
            kind: task.kind,
            started_at: task.started_at,
            state,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> AutomationType {
        self.kind
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// State of this particular task (a superseded task reports its own state, not the
    /// state of its successor).
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Wait until the loop has exited.
    pub async fn finished(&mut self) {
        let _ = self.state.wait_for(|s| *s == TaskState::Idle).await;
    }
}
