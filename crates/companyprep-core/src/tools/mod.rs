//! Tool adapters invokable by role agents.
//!
//! Each adapter wraps one external capability (web search, article
//! extraction, financial data, video lookup). A [`ToolSet`] holds the
//! registered adapters and enforces that a role agent can only execute
//! calls inside its declared capability set.

mod finance;
mod search;
mod video;

pub use finance::FinanceTool;
pub use search::{ArticleTool, WebSearchTool};
pub use video::VideoSearchTool;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::CompanyPrepError;
use crate::llm::ToolDeclaration;

/// External capability a role agent may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    WebSearch,
    Article,
    Finance,
    VideoSearch,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::WebSearch => "web_search",
            Capability::Article => "article",
            Capability::Finance => "finance",
            Capability::VideoSearch => "video_search",
        }
    }
}

/// Trait for external tool adapters.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Function name exposed to the model.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for the call arguments.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> Result<Value, CompanyPrepError>;
}

/// Registry mapping capabilities to concrete adapters.
pub struct ToolSet {
    adapters: HashMap<Capability, Arc<dyn ToolAdapter>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register the production adapters for all four capabilities.
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        set.register(Capability::WebSearch, Arc::new(WebSearchTool::new()));
        set.register(Capability::Article, Arc::new(ArticleTool::new()));
        set.register(Capability::Finance, Arc::new(FinanceTool::new()));
        set.register(Capability::VideoSearch, Arc::new(VideoSearchTool::new()));
        set
    }

    pub fn register(&mut self, capability: Capability, adapter: Arc<dyn ToolAdapter>) {
        self.adapters.insert(capability, adapter);
    }

    /// Declarations for the adapters a role is allowed to call.
    pub fn declarations(&self, capabilities: &[Capability]) -> Vec<ToolDeclaration> {
        capabilities
            .iter()
            .filter_map(|cap| self.adapters.get(cap))
            .map(|adapter| ToolDeclaration {
                name: adapter.name().to_string(),
                description: adapter.description().to_string(),
                parameters: adapter.parameters_schema(),
            })
            .collect()
    }

    /// Execute a model-requested call, rejecting tools outside the
    /// caller's capability set.
    pub async fn execute(
        &self,
        capabilities: &[Capability],
        tool_name: &str,
        args: Value,
    ) -> Result<Value, CompanyPrepError> {
        let adapter = capabilities
            .iter()
            .filter_map(|cap| self.adapters.get(cap))
            .find(|adapter| adapter.name() == tool_name)
            .ok_or_else(|| {
                CompanyPrepError::tool(
                    tool_name,
                    "tool is not in this role's capability set",
                )
            })?;

        debug!(tool = tool_name, "executing tool call");
        adapter.execute(args).await
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl ToolAdapter for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "echoes its arguments"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, args: Value) -> Result<Value, CompanyPrepError> {
            Ok(args)
        }
    }

    #[tokio::test]
    async fn execute_enforces_capability_set() {
        let mut set = ToolSet::new();
        set.register(Capability::WebSearch, Arc::new(EchoTool));

        let allowed = set
            .execute(&[Capability::WebSearch], "echo", json!({"q": 1}))
            .await;
        assert!(allowed.is_ok());

        let denied = set.execute(&[Capability::Finance], "echo", json!({})).await;
        assert!(matches!(denied, Err(CompanyPrepError::Tool { .. })));
    }

    #[test]
    fn declarations_cover_only_granted_capabilities() {
        let mut set = ToolSet::new();
        set.register(Capability::WebSearch, Arc::new(EchoTool));

        let decls = set.declarations(&[Capability::WebSearch, Capability::Finance]);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "echo");
    }
}
