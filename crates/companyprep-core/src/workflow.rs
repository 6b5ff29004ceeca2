//! Session entry points: wire the role agents into a `graph_flow` graph,
//! drive it to completion, and hand back the merged artifact.

use std::sync::Arc;

use graph_flow::{ExecutionStatus, FlowRunner, InMemorySessionStorage, Session, SessionStorage};
use tracing::{info, warn};
use uuid::Uuid;

use crate::CompanyPrepError;
use crate::agent::RoleOutput;
use crate::config::Config;
use crate::events::{EventCollector, Stage};
use crate::llm::{ChatModel, GeminiChat};
use crate::logging::{SessionLogInput, log_session_completion};
use crate::report::ResearchArtifact;
use crate::roles::{ResearchMode, RoleKind, build_role_agent};
use crate::tasks::{COMPANY_KEY, CoordinatorTask, ERROR_KEY, REPORT_KEY, RoleTask};
use crate::tools::ToolSet;

/// Shared collaborators for one or more research requests: the model
/// endpoint and the tool adapters. Role agents themselves are constructed
/// fresh per request and discarded afterwards.
#[derive(Clone)]
pub struct ResearchRuntime {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolSet>,
    max_tool_rounds: usize,
}

impl ResearchRuntime {
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<ToolSet>, max_tool_rounds: usize) -> Self {
        Self {
            model,
            tools,
            max_tool_rounds,
        }
    }

    /// Build the production runtime. Fails before any network activity if
    /// the configured credential is absent.
    pub fn from_config(config: &Config) -> Result<Self, CompanyPrepError> {
        let api_key = config.llm_api_key()?;
        let model = GeminiChat::new(
            config.llm.model.clone(),
            api_key,
            config.research.request_timeout_ms,
        )?;
        Ok(Self::new(
            Arc::new(model),
            Arc::new(ToolSet::with_defaults()),
            config.research.max_tool_rounds,
        ))
    }
}

/// Options for running a research session.
pub struct SessionOptions<'a> {
    pub company: &'a str,
    pub mode: ResearchMode,
    pub session_id: Option<String>,
    pub progress: Option<EventCollector>,
}

impl<'a> SessionOptions<'a> {
    pub fn new(company: &'a str, mode: ResearchMode) -> Self {
        Self {
            company,
            mode,
            session_id: None,
            progress: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_progress(mut self, progress: EventCollector) -> Self {
        self.progress = Some(progress);
        self
    }
}

fn build_graph(
    mode: ResearchMode,
    runtime: &ResearchRuntime,
    events: &EventCollector,
) -> (Arc<graph_flow::Graph>, &'static str) {
    let roles = mode.roles();
    let start = roles[0].id();

    let mut builder = graph_flow::GraphBuilder::new("companyprep_coordinator");
    for role in roles {
        let agent = build_role_agent(
            *role,
            runtime.model.clone(),
            runtime.tools.clone(),
            runtime.max_tool_rounds,
        );
        builder = builder.add_task(Arc::new(RoleTask::new(Arc::new(agent), events.clone())));
    }
    builder = builder.add_task(Arc::new(CoordinatorTask::new(mode, events.clone())));

    // Ordinal hand-off: web -> finance -> research -> (video) -> merge.
    for pair in roles.windows(2) {
        builder = builder.add_edge(pair[0].id(), pair[1].id());
    }
    builder = builder
        .add_edge(roles[roles.len() - 1].id(), "coordinator")
        .set_start_task(start);

    (Arc::new(builder.build()), start)
}

fn validate_company(company: &str) -> Result<&str, CompanyPrepError> {
    let trimmed = company.trim();
    if trimmed.is_empty() {
        return Err(CompanyPrepError::Validation(
            "company name must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Run a research session end-to-end with default options.
pub async fn run_research_session(
    runtime: &ResearchRuntime,
    company: &str,
    mode: ResearchMode,
) -> Result<ResearchArtifact, CompanyPrepError> {
    run_research_session_with_options(runtime, SessionOptions::new(company, mode)).await
}

/// Run a research session with custom options (session ID, progress events).
pub async fn run_research_session_with_options(
    runtime: &ResearchRuntime,
    options: SessionOptions<'_>,
) -> Result<ResearchArtifact, CompanyPrepError> {
    let company = validate_company(options.company)?;
    let events = options.progress.unwrap_or_default();

    let (graph, start) = build_graph(options.mode, runtime, &events);

    let storage = Arc::new(InMemorySessionStorage::new());
    let runner = FlowRunner::new(graph, storage.clone());

    let session_id = options
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let session = Session::new_from_task(session_id.clone(), start);
    session.context.set(COMPANY_KEY, company.to_string()).await;

    storage
        .save(session)
        .await
        .map_err(|err| CompanyPrepError::Other(anyhow::anyhow!("failed to persist session: {err}")))?;

    info!(session_id = %session_id, company, mode = %options.mode, "starting research session");

    loop {
        let result = runner.run(&session_id).await.map_err(|err| {
            CompanyPrepError::Other(anyhow::anyhow!("graph execution failure: {err}"))
        })?;

        match result.status {
            ExecutionStatus::Completed => break,
            ExecutionStatus::WaitingForInput => continue,
            ExecutionStatus::Error(message) => {
                return Err(CompanyPrepError::Other(anyhow::anyhow!(message)));
            }
        }
    }

    let session = storage
        .get(&session_id)
        .await
        .map_err(|err| CompanyPrepError::Other(anyhow::anyhow!("failed to reload session: {err}")))?
        .ok_or_else(|| {
            CompanyPrepError::Other(anyhow::anyhow!("session missing after execution"))
        })?;

    if let Some(message) = session.context.get::<String>(ERROR_KEY).await {
        return Err(CompanyPrepError::Model(message));
    }

    let artifact: ResearchArtifact = session.context.get(REPORT_KEY).await.ok_or_else(|| {
        CompanyPrepError::Model("no report recorded after session completed".to_string())
    })?;

    if let Err(err) = log_session_completion(SessionLogInput {
        session_id: session_id.clone(),
        company: company.to_string(),
        mode: options.mode,
        report_chars: artifact.markdown.len(),
        sources: artifact.sources.clone(),
    }) {
        warn!(error = %err, "failed to write session log");
    }

    events.emit_session_completed(company);
    Ok(artifact)
}

/// Standalone stock-price lookup: a single price-focused role restricted to
/// web search and financial data, run outside the coordinator.
pub async fn run_stock_lookup(
    runtime: &ResearchRuntime,
    company: &str,
    progress: Option<EventCollector>,
) -> Result<RoleOutput, CompanyPrepError> {
    let company = validate_company(company)?;
    let events = progress.unwrap_or_default();

    let agent = build_role_agent(
        RoleKind::StockQuote,
        runtime.model.clone(),
        runtime.tools.clone(),
        runtime.max_tool_rounds,
    );

    let stage = Stage::Role(RoleKind::StockQuote);
    events.emit_stage_started(stage);
    let started = std::time::Instant::now();
    let outcome = agent.run(company).await;
    events.emit_stage_finished(stage, started.elapsed().as_millis() as u64, outcome.is_ok());

    outcome
}
