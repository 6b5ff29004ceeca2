//! `graph_flow` task wrappers around role agents and the coordinator merge.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use graph_flow::{Context, NextAction, Task, TaskResult};
use tracing::{info, instrument, warn};

use crate::agent::{RoleAgent, RoleOutput};
use crate::events::{EventCollector, Stage};
use crate::report::ReportBuilder;
use crate::roles::ResearchMode;

/// Context key holding the first error raised by any task. Tasks record the
/// failure and end the graph; the workflow surfaces it to the caller.
pub(crate) const ERROR_KEY: &str = "session.error";
pub(crate) const COMPANY_KEY: &str = "company";
pub(crate) const REPORT_KEY: &str = "final.report";

pub(crate) fn output_key(role_id: &str) -> String {
    format!("output.{role_id}")
}

/// Runs one role agent against the session's company name.
pub struct RoleTask {
    agent: Arc<RoleAgent>,
    events: EventCollector,
}

impl RoleTask {
    pub fn new(agent: Arc<RoleAgent>, events: EventCollector) -> Self {
        Self { agent, events }
    }
}

#[async_trait]
impl Task for RoleTask {
    fn id(&self) -> &str {
        self.agent.kind().id()
    }

    #[instrument(name = "task.role", skip(self, context), fields(role = self.agent.kind().id()))]
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let company: String = context.get(COMPANY_KEY).await.unwrap_or_default();
        let stage = Stage::Role(self.agent.kind());

        self.events.emit_stage_started(stage);
        let started = Instant::now();

        let outcome = self.agent.run(&company).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                self.events.emit_stage_finished(stage, duration_ms, true);
                info!(
                    role = self.agent.kind().id(),
                    sources = output.sources.len(),
                    duration_ms,
                    "role agent finished"
                );
                context
                    .set(output_key(self.agent.kind().id()), &output)
                    .await;
                Ok(TaskResult::new(
                    Some(format!(
                        "{} completed for \"{company}\"",
                        self.agent.kind().display_name()
                    )),
                    NextAction::ContinueAndExecute,
                ))
            }
            Err(err) => {
                self.events.emit_stage_finished(stage, duration_ms, false);
                warn!(role = self.agent.kind().id(), error = %err, "role agent failed");
                context.set(ERROR_KEY, err.to_string()).await;
                Ok(TaskResult::new(
                    Some(format!(
                        "{} failed: {err}",
                        self.agent.kind().display_name()
                    )),
                    NextAction::End,
                ))
            }
        }
    }
}

/// Final coordinator step: merge the role outputs into one artifact.
pub struct CoordinatorTask {
    mode: ResearchMode,
    events: EventCollector,
}

impl CoordinatorTask {
    pub fn new(mode: ResearchMode, events: EventCollector) -> Self {
        Self { mode, events }
    }
}

#[async_trait]
impl Task for CoordinatorTask {
    fn id(&self) -> &str {
        "coordinator"
    }

    #[instrument(name = "task.coordinator", skip(self, context))]
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let company: String = context.get(COMPANY_KEY).await.unwrap_or_default();

        self.events.emit_stage_started(Stage::Merge);
        let started = Instant::now();

        let mut builder = ReportBuilder::new(&company, self.mode);
        for role in self.mode.roles() {
            match context.get::<RoleOutput>(&output_key(role.id())).await {
                Some(output) => builder.push_output(&output),
                // Leave the gap for the section marker rather than failing
                // the merge.
                None => warn!(role = role.id(), "no output recorded for role"),
            }
        }

        let artifact = builder.build();
        context.set(REPORT_KEY, &artifact).await;

        let duration_ms = started.elapsed().as_millis() as u64;
        self.events
            .emit_stage_finished(Stage::Merge, duration_ms, true);
        info!(
            company = %company,
            report_chars = artifact.markdown.len(),
            sources = artifact.sources.len(),
            "coordinator merged role outputs"
        );

        Ok(TaskResult::new(
            Some(artifact.markdown),
            NextAction::End,
        ))
    }
}
