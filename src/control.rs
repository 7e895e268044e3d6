//! Host command surface.
//!
//! The host (the popup in the browser build, a shell pipeline here) drives the scheduler with
//! small JSON commands, one per line:
//!
//! ```text
//! {"action":"startAutomation","type":"feed","settings":{"autoEngage":true,"keywords":["rust"]}}
//! {"action":"stopAutomation","type":"feed"}
//! {"action":"stopAutomation"}
//! {"action":"status"}
//! ```
//!
//! Each command gets a `Reply` `{status:"success"|"error", message, tasks?}`. Lines that are not
//! valid commands are logged and skipped; reading continues.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::config::{AutomationType, Settings};
use crate::executor::{TaskScheduler, TaskState};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HostCommand {
    StartAutomation {
        #[serde(rename = "type")]
        kind: AutomationType,
        #[serde(default)]
        settings: Value,
    },
    /// Stops one type, or every type when `type` is omitted.
    StopAutomation {
        #[serde(rename = "type", default)]
        kind: Option<AutomationType>,
    },
    Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<BTreeMap<AutomationType, TaskState>>,
}

impl Reply {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            tasks: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            tasks: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Apply one command to the scheduler.
pub fn dispatch(scheduler: &TaskScheduler, command: HostCommand) -> Reply {
    match command {
        HostCommand::StartAutomation { kind, settings } => {
            match Settings::from_value(kind, settings).and_then(|s| scheduler.start(s)) {
                Ok(handle) => {
                    info!(target: "linkpilot::control", %kind, task_id = %handle.id(), "Automation started");
                    Reply::success(format!("{kind} automation started"))
                }
                Err(e) => {
                    warn!(target: "linkpilot::control", %kind, error = %e, "Start rejected");
                    Reply::error(e.to_string())
                }
            }
        }
        HostCommand::StopAutomation { kind: Some(kind) } => {
            scheduler.stop(kind);
            Reply::success(format!("{kind} automation stopped"))
        }
        HostCommand::StopAutomation { kind: None } => {
            scheduler.stop_all();
            Reply::success("All automations stopped")
        }
        HostCommand::Status => Reply {
            tasks: Some(scheduler.snapshot()),
            ..Reply::success("status")
        },
    }
}

/// Forward every command line of `reader` to `sender` until EOF or the receiver goes away.
pub async fn read_commands<R>(reader: R, sender: Sender<HostCommand>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let raw = line.trim();
                if raw.is_empty() {
                    continue;
                }
                match serde_json::from_str::<HostCommand>(raw) {
                    Ok(command) => {
                        trace!(target: "linkpilot::control", ?command, "Parsed host command");
                        if let Err(e) = sender.send(command).await {
                            error!(
                                target: "linkpilot::control",
                                error = %e,
                                "Command channel closed; stopping reader"
                            );
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(
                            target: "linkpilot::control",
                            error = %e,
                            line = raw,
                            "Ignoring malformed host command"
                        );
                    }
                }
            }
            Ok(None) => {
                info!(target: "linkpilot::control", "EOF on command input");
                break;
            }
            Err(e) => {
                warn!(target: "linkpilot::control", error = %e, "Error reading commands; stopping reader");
                break;
            }
        }
    }
    debug!(target: "linkpilot::control", "Command reader ended");
}

/// Read host commands from stdin on a background task.
pub fn spawn_stdin_commands(sender: Sender<HostCommand>) -> JoinHandle<()> {
    tokio::spawn(read_commands(BufReader::new(io::stdin()), sender))
}
