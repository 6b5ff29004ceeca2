//! End-to-end workflow tests against a scripted model.

use async_trait::async_trait;
use companyprep_core::llm::{ChatModel, ChatReply, ChatRequest};
use companyprep_core::tools::ToolSet;
use companyprep_core::{
    CompanyPrepError, ResearchMode, ResearchRuntime, SessionOptions,
    run_research_session_with_options, run_stock_lookup,
};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// One log directory for the whole test binary. Every test points the
/// session logger here, so parallel tests set the same value instead of
/// racing over the process environment, and the directory is cleaned up
/// when the binary exits.
static LOG_DIR: Lazy<TempDir> = Lazy::new(|| {
    let dir = tempfile::tempdir().expect("temp log dir");
    unsafe { std::env::set_var("COMPANYPREP_LOG_DIR", dir.path()) };
    dir
});

fn isolate_logs() {
    Lazy::force(&LOG_DIR);
}

/// Answers every request with a body derived from the role named in the
/// system prompt, and records the order of invocations.
struct RoleAwareModel {
    seen_systems: Mutex<Vec<String>>,
    seen_tasks: Mutex<Vec<String>>,
}

impl RoleAwareModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            seen_systems: Mutex::new(Vec::new()),
            seen_tasks: Mutex::new(Vec::new()),
        })
    }

    fn role_order(&self) -> Vec<String> {
        self.seen_systems
            .lock()
            .unwrap()
            .iter()
            .map(|system| {
                for role in ["Web Agent", "Finance Agent", "Research Agent", "Video Agent"] {
                    if system.contains(role) {
                        return role.to_string();
                    }
                }
                "unknown".to_string()
            })
            .collect()
    }
}

#[async_trait]
impl ChatModel for RoleAwareModel {
    async fn generate(&self, request: ChatRequest) -> Result<ChatReply, CompanyPrepError> {
        self.seen_systems.lock().unwrap().push(request.system.clone());
        if let Some(content) = request.contents.first() {
            if let Ok(text) = serde_json::to_string(&content.parts) {
                self.seen_tasks.lock().unwrap().push(text);
            }
        }

        let body = if request.system.contains("Finance Agent") {
            "| Metric | Value |\n|---|---|\n| Price | 12.34 |".to_string()
        } else if request.system.contains("Web Agent") {
            "Acme Corp builds anvils ([about](https://acme.test/about)).".to_string()
        } else if request.system.contains("Research Agent") {
            // Deliberately repeats the web agent's fact verbatim.
            "Acme Corp builds anvils ([about](https://acme.test/about)).\n\n\
             Its biggest challenge is roadrunner churn ([news](https://news.test/acme))."
                .to_string()
        } else if request.system.contains("Video Agent") {
            "CEO interview: [watch](https://youtube.com/watch?v=abc123).".to_string()
        } else {
            "ACME trades at 12.34 USD on NYSE.".to_string()
        };

        Ok(ChatReply {
            text: body,
            calls: vec![],
        })
    }

    fn model_name(&self) -> &str {
        "role-aware-fake"
    }
}

fn runtime_with(model: Arc<dyn ChatModel>) -> ResearchRuntime {
    ResearchRuntime::new(model, Arc::new(ToolSet::new()), 4)
}

#[tokio::test]
async fn basic_session_invokes_three_roles_with_the_company_as_task() {
    isolate_logs();
    let model = RoleAwareModel::new();
    let runtime = runtime_with(model.clone());

    let artifact = run_research_session_with_options(
        &runtime,
        SessionOptions::new("Acme Corp", ResearchMode::Basic),
    )
    .await
    .expect("session should succeed");

    assert_eq!(
        model.role_order(),
        vec!["Web Agent", "Finance Agent", "Research Agent"]
    );
    for task in model.seen_tasks.lock().unwrap().iter() {
        assert!(task.contains("Acme Corp"), "task should carry company name");
    }

    assert_eq!(artifact.company, "Acme Corp");
    assert!(artifact.markdown.contains("## Company Overview"));
    assert!(artifact.markdown.contains("## Financial Data"));
    assert!(artifact.markdown.contains("## In-Depth Research"));
    assert!(!artifact.markdown.contains("## Video Coverage"));
}

#[tokio::test]
async fn pro_session_runs_the_video_role_last() {
    isolate_logs();
    let model = RoleAwareModel::new();
    let runtime = runtime_with(model.clone());

    let artifact = run_research_session_with_options(
        &runtime,
        SessionOptions::new("Acme Corp", ResearchMode::Pro),
    )
    .await
    .expect("session should succeed");

    assert_eq!(
        model.role_order(),
        vec!["Web Agent", "Finance Agent", "Research Agent", "Video Agent"]
    );
    assert!(artifact.markdown.contains("## Video Coverage"));
    assert!(artifact.markdown.contains("youtube.com/watch"));
}

#[tokio::test]
async fn duplicate_facts_from_two_roles_appear_once() {
    isolate_logs();
    let model = RoleAwareModel::new();
    let runtime = runtime_with(model.clone());

    let artifact = run_research_session_with_options(
        &runtime,
        SessionOptions::new("Acme Corp", ResearchMode::Basic),
    )
    .await
    .unwrap();

    assert_eq!(artifact.markdown.matches("builds anvils").count(), 1);
    assert!(artifact.markdown.contains("roadrunner churn"));
}

#[tokio::test]
async fn empty_company_is_rejected_before_any_model_call() {
    isolate_logs();
    let model = RoleAwareModel::new();
    let runtime = runtime_with(model.clone());

    let err = run_research_session_with_options(
        &runtime,
        SessionOptions::new("   ", ResearchMode::Basic),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CompanyPrepError::Validation(_)));
    assert!(model.seen_systems.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stock_lookup_runs_a_single_role_outside_the_coordinator() {
    isolate_logs();
    let model = RoleAwareModel::new();
    let runtime = runtime_with(model.clone());

    let output = run_stock_lookup(&runtime, "Acme Corp", None)
        .await
        .expect("lookup should succeed");

    assert!(output.body.contains("12.34"));
    assert_eq!(model.seen_systems.lock().unwrap().len(), 1);
}

struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    async fn generate(&self, _request: ChatRequest) -> Result<ChatReply, CompanyPrepError> {
        Err(CompanyPrepError::Model("endpoint unavailable".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing-fake"
    }
}

#[tokio::test]
async fn downstream_failure_surfaces_as_a_single_error() {
    isolate_logs();
    let runtime = runtime_with(Arc::new(FailingModel));

    let err = run_research_session_with_options(
        &runtime,
        SessionOptions::new("Acme Corp", ResearchMode::Basic),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("endpoint unavailable"));
}
