//! Role agent execution: the plan / call / observe loop.
//!
//! A role agent owns its instructions and capability set; the model decides
//! which of the declared tools to call and in what order. The loop is
//! bounded by `max_tool_rounds` so a misbehaving model cannot spin forever.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::CompanyPrepError;
use crate::llm::{ChatModel, ChatRequest, Content, FunctionResponse};
use crate::roles::RoleKind;
use crate::tools::{Capability, ToolSet};

static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]\((https?://[^\s)]+)\)").expect("invalid link regex"));

/// Final output of one role agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleOutput {
    pub kind: RoleKind,
    /// Markdown body produced by the model.
    pub body: String,
    /// URLs cited in the body, in order of first appearance.
    pub sources: Vec<String>,
}

/// A bound pairing of instructions, capability set, and model endpoint.
pub struct RoleAgent {
    kind: RoleKind,
    instructions: Vec<String>,
    capabilities: Vec<Capability>,
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolSet>,
    max_tool_rounds: usize,
}

impl RoleAgent {
    pub fn new(
        kind: RoleKind,
        instructions: Vec<String>,
        capabilities: Vec<Capability>,
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolSet>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            kind,
            instructions,
            capabilities,
            model,
            tools,
            max_tool_rounds,
        }
    }

    pub fn kind(&self) -> RoleKind {
        self.kind
    }

    fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are {}, researching one facet of a company on behalf of a candidate \
             preparing for an interview. Respond in Markdown.",
            self.kind.display_name()
        );
        for line in &self.instructions {
            prompt.push('\n');
            prompt.push_str("- ");
            prompt.push_str(line);
        }
        prompt
    }

    /// Run the agent against a task string (the company name).
    #[instrument(name = "agent.run", skip(self), fields(role = self.kind.id()))]
    pub async fn run(&self, task: &str) -> Result<RoleOutput, CompanyPrepError> {
        let system = self.system_prompt();
        let declarations = self.tools.declarations(&self.capabilities);
        let mut contents = vec![Content::user_text(format!("Company: {task}"))];

        for round in 0..self.max_tool_rounds {
            let reply = self
                .model
                .generate(ChatRequest {
                    system: system.clone(),
                    contents: contents.clone(),
                    tools: declarations.clone(),
                })
                .await?;

            if !reply.wants_tools() {
                debug!(round, "agent produced final answer");
                return Ok(self.finish(reply.text));
            }

            info!(round, calls = reply.calls.len(), "agent requested tool calls");
            contents.push(Content::model_reply(&reply));

            let mut responses = Vec::with_capacity(reply.calls.len());
            for call in reply.calls {
                let response = match self
                    .tools
                    .execute(&self.capabilities, &call.name, call.args.clone())
                    .await
                {
                    Ok(value) => value,
                    // Feed tool failures back to the model instead of
                    // aborting the whole role; it can route around a dead
                    // source or report the gap.
                    Err(err) => {
                        warn!(tool = %call.name, error = %err, "tool call failed");
                        json!({ "error": err.to_string() })
                    }
                };
                responses.push(FunctionResponse {
                    name: call.name,
                    response,
                });
            }
            contents.push(Content::tool_responses(responses));
        }

        Err(CompanyPrepError::Model(format!(
            "{} exceeded {} tool rounds without a final answer",
            self.kind.display_name(),
            self.max_tool_rounds
        )))
    }

    fn finish(&self, body: String) -> RoleOutput {
        let mut sources = Vec::new();
        for capture in MARKDOWN_LINK.captures_iter(&body) {
            let url = capture[1].to_string();
            if !sources.contains(&url) {
                sources.push(url);
            }
        }
        RoleOutput {
            kind: self.kind,
            body,
            sources,
        }
    }
}
