//! Video lookup adapter: YouTube-scoped web search.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::ToolAdapter;
use crate::CompanyPrepError;

const DEFAULT_RESULTS: usize = 6;

/// Finds company-related videos via a site-restricted search.
pub struct VideoSearchTool;

impl VideoSearchTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VideoSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolAdapter for VideoSearchTool {
    fn name(&self) -> &str {
        "video_search"
    }

    fn description(&self) -> &str {
        "Search YouTube for videos about a company (presentations, interviews, demos)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to look for, e.g. 'Acme Corp CEO interview'"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, CompanyPrepError> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| CompanyPrepError::tool(self.name(), "missing 'query' parameter"))?;

        let search_args = daedra::SearchArgs {
            query: format!("site:youtube.com {query}"),
            options: Some(daedra::SearchOptions {
                num_results: DEFAULT_RESULTS * 2,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|err| CompanyPrepError::tool(self.name(), err))?;

        let videos: Vec<Value> = response
            .data
            .iter()
            .filter(|r| r.url.contains("youtube.com/watch") || r.url.contains("youtu.be/"))
            .take(DEFAULT_RESULTS)
            .map(|r| {
                json!({
                    "title": r.title,
                    "url": r.url,
                    "description": r.description
                })
            })
            .collect();

        Ok(json!({
            "query": query,
            "videos": videos,
            "count": videos.len()
        }))
    }
}
