//! Web search and article extraction adapters backed by `daedra`.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::ToolAdapter;
use crate::CompanyPrepError;

const DEFAULT_RESULTS: usize = 8;

/// DuckDuckGo web search.
pub struct WebSearchTool;

impl WebSearchTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolAdapter for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information about a company using DuckDuckGo"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 8)"
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

        let num_results = args
            .get("num_results")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_RESULTS);

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|err| CompanyPrepError::tool(self.name(), err))?;

        let results: Vec<Value> = response
            .data
            .iter()
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
            "results": results,
            "count": results.len()
        }))
    }
}

/// Article extraction: fetch a URL and return its text as markdown.
pub struct ArticleTool;

impl ArticleTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ArticleTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolAdapter for ArticleTool {
    fn name(&self) -> &str {
        "read_article"
    }

    fn description(&self) -> &str {
        "Fetch an article URL and extract its text content"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the article to read"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, CompanyPrepError> {
        let url = args
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| CompanyPrepError::tool(self.name(), "missing 'url' parameter"))?;

        let fetch_args = daedra::VisitPageArgs {
            url: url.to_string(),
            include_images: false,
            selector: None,
        };

        let page = daedra::tools::fetch::fetch_page(&fetch_args)
            .await
            .map_err(|err| CompanyPrepError::tool(self.name(), err))?;

        Ok(json!({
            "url": page.url,
            "title": page.title,
            "content": page.content,
            "word_count": page.word_count
        }))
    }
}
