use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::{AutomationType, Settings};
use crate::content::ContentSource;
use crate::error::AutomationError;
use crate::executor::pacing::{DelayRange, PacingModel, SCROLL_STEPS, Wake};
use crate::executor::rate_limit::{RateLimiter, RateWindow};
use crate::executor::task::{Task, TaskHandle, TaskId, TaskState};
use crate::page::Page;
use crate::sources::{
    ActionOutcome, ActionRecord, ActionSource, ActionTarget, SourceContext, build_source,
};
use crate::sync::{BackendSync, SyncError};

/// Pause after an iteration that failed as a whole.
pub const BACKOFF: DelayRange = DelayRange::secs(5, 10);

/// Registry entry of the task currently owning an automation type.
struct Slot {
    id: TaskId,
    state: Arc<watch::Sender<TaskState>>,
    cancel: CancellationToken,
}

struct Shared {
    page: Arc<dyn Page>,
    /// Serializes page work across tasks: one poll, action or batch scroll at a time.
    page_permit: AsyncMutex<()>,
    sync: Arc<dyn BackendSync>,
    ai: Option<Arc<dyn ContentSource>>,
    pacing: PacingModel,
    limiter: RateLimiter,
    slots: Mutex<HashMap<AutomationType, Slot>>,
    tracker: TaskTracker,
}

/// Owns at most one running task per automation type and drives each task's loop.
///
/// Cheap to clone; clones share the same registry. `start` must be called from within a
/// Tokio runtime.
#[derive(Clone)]
pub struct TaskScheduler {
    shared: Arc<Shared>,
}

pub struct SchedulerBuilder {
    page: Arc<dyn Page>,
    sync: Arc<dyn BackendSync>,
    ai: Option<Arc<dyn ContentSource>>,
    pacing: PacingModel,
    limiter: RateLimiter,
}

impl SchedulerBuilder {
    /// Content generator used by posts with `useAI` set.
    pub fn content_source(mut self, ai: Arc<dyn ContentSource>) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn pacing(mut self, pacing: PacingModel) -> Self {
        self.pacing = pacing;
        self
    }

    /// Length of the quota window (one day unless overridden).
    pub fn rate_window(mut self, window: Duration) -> Self {
        self.limiter = RateLimiter::new(window);
        self
    }

    pub fn build(self) -> TaskScheduler {
        TaskScheduler {
            shared: Arc::new(Shared {
                page: self.page,
                page_permit: AsyncMutex::new(()),
                sync: self.sync,
                ai: self.ai,
                pacing: self.pacing,
                limiter: self.limiter,
                slots: Mutex::new(HashMap::new()),
                tracker: TaskTracker::new(),
            }),
        }
    }
}

impl TaskScheduler {
    pub fn builder(page: Arc<dyn Page>, sync: Arc<dyn BackendSync>) -> SchedulerBuilder {
        SchedulerBuilder {
            page,
            sync,
            ai: None,
            pacing: PacingModel::default(),
            limiter: RateLimiter::default(),
        }
    }

    pub fn new(page: Arc<dyn Page>, sync: Arc<dyn BackendSync>) -> Self {
        Self::builder(page, sync).build()
    }

    /// Start (or restart) the loop for the settings' automation type.
    ///
    /// Settings are validated before anything else happens; invalid settings leave any
    /// running task of that type untouched. A task already running for the type is
    /// superseded: it is cancelled and exits at its next checkpoint while the new task
    /// takes over the slot.
    pub fn start(&self, settings: Settings) -> Result<TaskHandle, AutomationError> {
        settings.validate()?;

        let shared = &self.shared;
        let task = Task::new(settings);
        let kind = task.kind;
        shared.limiter.configure(kind, task.settings.quota());

        let (tx, rx) = watch::channel(TaskState::Running);
        let state = Arc::new(tx);
        let cancel = CancellationToken::new();
        let handle = TaskHandle::new(&task, rx);

        let previous = shared.slots().insert(
            kind,
            Slot {
                id: task.id,
                state: Arc::clone(&state),
                cancel: cancel.clone(),
            },
        );
        if let Some(old) = previous {
            info!(
                target: "linkpilot::scheduler",
                %kind,
                old_task = %old.id,
                new_task = %task.id,
                "Superseding running task"
            );
            Self::signal_stop(&old);
        }

        let source = build_source(&task.settings, shared.ai.clone());
        let span = info_span!("task", %kind, task_id = %task.id);
        shared.tracker.spawn(
            Arc::clone(shared)
                .run(task, source, cancel, state)
                .instrument(span),
        );
        Ok(handle)
    }

    /// Request the type's task to stop. A no-op when nothing runs for the type.
    ///
    /// Returns immediately; the state moves to `Idle` once the loop has exited.
    pub fn stop(&self, kind: AutomationType) {
        match self.shared.slots().get(&kind) {
            Some(slot) => {
                info!(target: "linkpilot::scheduler", %kind, task_id = %slot.id, "Stop requested");
                Self::signal_stop(slot);
            }
            None => debug!(target: "linkpilot::scheduler", %kind, "Stop requested while idle"),
        }
    }

    pub fn stop_all(&self) {
        for slot in self.shared.slots().values() {
            Self::signal_stop(slot);
        }
    }

    pub fn status(&self, kind: AutomationType) -> TaskState {
        self.shared
            .slots()
            .get(&kind)
            .map_or(TaskState::Idle, |slot| *slot.state.borrow())
    }

    /// State of every automation type.
    pub fn snapshot(&self) -> BTreeMap<AutomationType, TaskState> {
        let slots = self.shared.slots();
        AutomationType::ALL
            .into_iter()
            .map(|kind| {
                let state = slots
                    .get(&kind)
                    .map_or(TaskState::Idle, |slot| *slot.state.borrow());
                (kind, state)
            })
            .collect()
    }

    /// Quota window of a type, if it has a quota.
    pub fn rate_window(&self, kind: AutomationType) -> Option<RateWindow> {
        self.shared.limiter.window(kind)
    }

    /// Stop every task and wait for all loops (superseded ones included) to exit.
    pub async fn shutdown(&self) {
        self.stop_all();
        self.shared.tracker.close();
        self.shared.tracker.wait().await;
        self.shared.tracker.reopen();
        info!(target: "linkpilot::scheduler", "All tasks stopped");
    }

    fn signal_stop(slot: &Slot) {
        slot.state.send_if_modified(|state| {
            if *state == TaskState::Running {
                *state = TaskState::Stopping;
                true
            } else {
                false
            }
        });
        slot.cancel.cancel();
    }
}

impl Shared {
    fn slots(&self) -> MutexGuard<'_, HashMap<AutomationType, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(
        self: Arc<Self>,
        task: Task,
        source: Box<dyn ActionSource>,
        cancel: CancellationToken,
        state: Arc<watch::Sender<TaskState>>,
    ) {
        let kind = task.kind;
        info!(target: "linkpilot::scheduler", "Task started");
        self.report(kind, "start", self.sync.report_start(&task.settings))
            .await;

        while !cancel.is_cancelled() {
            match self.iteration(source.as_ref(), &cancel).await {
                Ok(Wake::Elapsed) => {}
                Ok(Wake::Cancelled) => break,
                Err(err) => {
                    warn!(target: "linkpilot::scheduler", error = %err, "Iteration failed; backing off");
                    if self.pacing.delay_until(BACKOFF, &cancel).await.is_cancelled() {
                        break;
                    }
                }
            }
        }

        self.report(kind, "stop", self.sync.report_stop(kind)).await;
        state.send_replace(TaskState::Idle);

        let mut slots = self.slots();
        if slots.get(&kind).is_some_and(|slot| slot.id == task.id) {
            slots.remove(&kind);
        }
        drop(slots);
        info!(target: "linkpilot::scheduler", "Task exited");
    }

    /// One poll, the actions on its targets, the batch scroll and the batch pause.
    async fn iteration(
        &self,
        source: &dyn ActionSource,
        cancel: &CancellationToken,
    ) -> Result<Wake, AutomationError> {
        let kind = source.kind();
        let cadence = source.cadence();
        let cx = SourceContext {
            page: &*self.page,
            pacing: &self.pacing,
            cancel,
        };
        let transient = |e| AutomationError::TransientLoop { kind, source: e };

        let targets = {
            let _permit = self.page_permit.lock().await;
            source.poll(&cx).await.map_err(transient)?
        };
        debug!(target: "linkpilot::scheduler", count = targets.len(), "Polled targets");

        for target in &targets {
            if cancel.is_cancelled() {
                return Ok(Wake::Cancelled);
            }
            if !self.limiter.try_consume(kind) {
                debug!(target: "linkpilot::scheduler", "Quota exhausted; skipping the rest of the batch");
                break;
            }

            let outcome = {
                let _permit = self.page_permit.lock().await;
                source.act(target, &cx).await
            };
            self.settle(kind, target, outcome).await;

            if self.pacing.delay_until(cadence.action_gap, cancel).await.is_cancelled() {
                return Ok(Wake::Cancelled);
            }
        }

        if let Some(plan) = cadence.batch_scroll {
            let _permit = self.page_permit.lock().await;
            let wake = self
                .pacing
                .scroll_by(&*self.page, plan.surface, plan.distance, SCROLL_STEPS, cancel)
                .await
                .map_err(transient)?;
            if wake.is_cancelled() {
                return Ok(Wake::Cancelled);
            }
        }

        Ok(self.pacing.delay_until(cadence.batch_gap, cancel).await)
    }

    async fn settle(&self, kind: AutomationType, target: &ActionTarget, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Success(payload) => {
                let record = ActionRecord::now(kind, payload);
                info!(
                    target: "linkpilot::scheduler",
                    element = %target.element,
                    payload = ?record.payload,
                    "Action completed"
                );
                self.report(kind, "action", self.sync.report_action(&record))
                    .await;
            }
            ActionOutcome::Skipped(reason) => {
                debug!(target: "linkpilot::scheduler", element = %target.element, %reason, "Target skipped");
            }
            ActionOutcome::Failed(e) => {
                let err = AutomationError::ActionFailed {
                    kind,
                    reason: format!("{e:#}"),
                };
                warn!(target: "linkpilot::scheduler", element = %target.element, error = %err, "Action failed");
            }
        }
    }

    /// Await a backend report; failures are logged and dropped.
    async fn report(
        &self,
        kind: AutomationType,
        what: &'static str,
        report: impl Future<Output = Result<(), SyncError>>,
    ) {
        if let Err(e) = report.await {
            let err = AutomationError::from(e);
            warn!(target: "linkpilot::scheduler", %kind, report = what, error = %err, "Backend report dropped");
        }
    }
}
