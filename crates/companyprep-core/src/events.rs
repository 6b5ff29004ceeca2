//! Progress events for research sessions.
//!
//! Stage transitions flow through this channel so a front end can render
//! real progress instead of a timed animation. Dropping the receiver is
//! harmless; emission failures are logged and ignored.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

use crate::roles::RoleKind;

/// Workflow stage a progress event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Role(RoleKind),
    Merge,
}

impl Stage {
    /// Human-readable label rendered by the CLI while a stage runs.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Role(RoleKind::WebInfo) => "Gathering web information...",
            Stage::Role(RoleKind::Finance) => "Analyzing financial data...",
            Stage::Role(RoleKind::Research) => "Gathering latest news and analysis...",
            Stage::Role(RoleKind::Video) => "Searching video content...",
            Stage::Role(RoleKind::StockQuote) => "Fetching live stock price...",
            Stage::Merge => "Assembling the report...",
        }
    }
}

/// Session lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    StageStarted {
        timestamp: u64,
        stage: Stage,
    },
    StageFinished {
        timestamp: u64,
        stage: Stage,
        duration_ms: u64,
        ok: bool,
    },
    SessionCompleted {
        timestamp: u64,
        company: String,
    },
}

/// Sender half handed to workflow tasks.
#[derive(Clone)]
pub struct EventCollector {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl EventCollector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn emit_stage_started(&self, stage: Stage) {
        self.emit(ProgressEvent::StageStarted {
            timestamp: current_timestamp(),
            stage,
        });
    }

    pub fn emit_stage_finished(&self, stage: Stage, duration_ms: u64, ok: bool) {
        self.emit(ProgressEvent::StageFinished {
            timestamp: current_timestamp(),
            stage,
            duration_ms,
            ok,
        });
    }

    pub fn emit_session_completed(&self, company: &str) {
        self.emit(ProgressEvent::SessionCompleted {
            timestamp: current_timestamp(),
            company: company.to_string(),
        });
    }

    fn emit(&self, event: ProgressEvent) {
        if let Err(e) = self.sender.send(event) {
            tracing::trace!(error = %e, "progress receiver dropped");
        }
    }
}

impl Default for EventCollector {
    fn default() -> Self {
        Self::new().0
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
