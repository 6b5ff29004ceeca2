//! Financial data adapter backed by the public Yahoo Finance endpoints.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::ToolAdapter;
use crate::CompanyPrepError;

const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Stock quote and basic market data lookup.
pub struct FinanceTool {
    http: reqwest::Client,
}

impl FinanceTool {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Resolve a free-text company name to a ticker symbol.
    async fn resolve_symbol(&self, company: &str) -> Result<Value, CompanyPrepError> {
        let response = self
            .http
            .get(SEARCH_URL)
            .query(&[("q", company), ("quotesCount", "1"), ("newsCount", "0")])
            .send()
            .await
            .map_err(|err| CompanyPrepError::tool(self.name(), err))?;

        let body: Value = response
            .json()
            .await
            .map_err(|err| CompanyPrepError::tool(self.name(), err))?;

        body.get("quotes")
            .and_then(|q| q.get(0))
            .cloned()
            .ok_or_else(|| {
                CompanyPrepError::tool(self.name(), format!("no ticker found for '{company}'"))
            })
    }

    /// Fetch the live quote for a resolved symbol.
    async fn fetch_quote(&self, symbol: &str) -> Result<Value, CompanyPrepError> {
        let url = format!("{CHART_URL}/{symbol}");
        let response = self
            .http
            .get(&url)
            .query(&[("interval", "1d"), ("range", "5d")])
            .send()
            .await
            .map_err(|err| CompanyPrepError::tool(self.name(), err))?;

        let body: Value = response
            .json()
            .await
            .map_err(|err| CompanyPrepError::tool(self.name(), err))?;

        let meta = body
            .pointer("/chart/result/0/meta")
            .cloned()
            .ok_or_else(|| {
                CompanyPrepError::tool(self.name(), format!("no chart data for '{symbol}'"))
            })?;

        Ok(json!({
            "symbol": symbol,
            "price": meta.get("regularMarketPrice"),
            "previous_close": meta.get("chartPreviousClose"),
            "currency": meta.get("currency"),
            "exchange": meta.get("exchangeName"),
        }))
    }
}

impl Default for FinanceTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolAdapter for FinanceTool {
    fn name(&self) -> &str {
        "finance_data"
    }

    fn description(&self) -> &str {
        "Look up a company's ticker symbol and live stock quote"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "company": {
                    "type": "string",
                    "description": "Company name or ticker symbol"
                }
            },
            "required": ["company"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value, CompanyPrepError> {
        let company = args
            .get("company")
            .and_then(Value::as_str)
            .ok_or_else(|| CompanyPrepError::tool(self.name(), "missing 'company' parameter"))?;

        let listing = self.resolve_symbol(company).await?;
        let symbol = listing
            .get("symbol")
            .and_then(Value::as_str)
            .ok_or_else(|| CompanyPrepError::tool(self.name(), "listing had no symbol"))?
            .to_string();

        let quote = self.fetch_quote(&symbol).await?;

        Ok(json!({
            "company": company,
            "listing": {
                "symbol": symbol,
                "name": listing.get("longname").or_else(|| listing.get("shortname")),
                "exchange": listing.get("exchDisp"),
            },
            "quote": quote,
        }))
    }
}
