//! Role definitions and the factory that binds instructions, capability
//! sets, and a model endpoint into runnable agents.
//!
//! The basic and pro research modes share one set of role definitions;
//! the mode only decides which roles participate, so there is no
//! duplicated per-mode construction path.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::CompanyPrepError;
use crate::agent::RoleAgent;
use crate::llm::ChatModel;
use crate::tools::{Capability, ToolSet};

/// Research facet a role agent is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    /// General company information from web search.
    WebInfo,
    /// Stock price, listing, and market data.
    Finance,
    /// In-depth articles and analysis.
    Research,
    /// Video coverage (pro mode only).
    Video,
    /// Standalone price lookup, run outside the coordinator.
    StockQuote,
}

impl RoleKind {
    pub fn id(&self) -> &'static str {
        match self {
            RoleKind::WebInfo => "web_info",
            RoleKind::Finance => "finance",
            RoleKind::Research => "research",
            RoleKind::Video => "video",
            RoleKind::StockQuote => "stock_quote",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RoleKind::WebInfo => "Web Agent",
            RoleKind::Finance => "Finance Agent",
            RoleKind::Research => "Research Agent",
            RoleKind::Video => "Video Agent",
            RoleKind::StockQuote => "Stock Agent",
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            RoleKind::WebInfo => &[Capability::WebSearch],
            RoleKind::Finance => &[Capability::Finance],
            RoleKind::Research => &[Capability::WebSearch, Capability::Article],
            RoleKind::Video => &[Capability::WebSearch, Capability::VideoSearch],
            RoleKind::StockQuote => &[Capability::WebSearch, Capability::Finance],
        }
    }

    fn instructions(&self) -> Vec<String> {
        let lines: &[&str] = match self {
            RoleKind::WebInfo => &[
                "Gather general information about the company: specialization, core values, \
                 mission statement, recent achievements, rivals and competitors, organizational \
                 structure, customer service approach, work culture, main products and services, \
                 key personnel, and growth strategy.",
                "Always include the source URL for every fact, as a markdown link.",
            ],
            RoleKind::Finance => &[
                "Gather the company's latest stock price, listing details, and key market \
                 metrics using the finance tool.",
                "Present the data as a markdown table.",
                "If the company is not publicly traded or no financial data is available, say \
                 so explicitly instead of guessing.",
            ],
            RoleKind::Research => &[
                "Search for the top articles covering the biggest challenges facing the \
                 company, its strategic initiatives, and growth patterns. Prioritize reliable \
                 and reputable sources.",
                "Read each promising URL and extract the article text; if a URL is not \
                 readable, skip it.",
                "Write an in-depth, publication-quality analysis based on what you read, \
                 citing every source as a markdown link.",
            ],
            RoleKind::Video => &[
                "Search YouTube for videos relevant to the company: presentations, interviews \
                 with key personnel, product demos, and employee testimonials.",
                "Summarize each relevant video, highlighting the points most useful to \
                 someone preparing to interview at the company.",
                "Always include the direct video link. Prefer official company channels and \
                 credible sources. Ignore music videos and other unrelated content.",
            ],
            RoleKind::StockQuote => &[
                "Find the company's ticker symbol, using web search if the name alone is \
                 ambiguous.",
                "Use the finance tool to fetch the live stock price and report it with the \
                 currency and exchange.",
            ],
        };
        lines.iter().map(|s| s.to_string()).collect()
    }
}

/// Research depth selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchMode {
    Basic,
    Pro,
}

impl ResearchMode {
    /// Ordered roles the coordinator drives for this mode. The video role,
    /// when present, is always last.
    pub fn roles(&self) -> &'static [RoleKind] {
        match self {
            ResearchMode::Basic => &[RoleKind::WebInfo, RoleKind::Finance, RoleKind::Research],
            ResearchMode::Pro => &[
                RoleKind::WebInfo,
                RoleKind::Finance,
                RoleKind::Research,
                RoleKind::Video,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchMode::Basic => "basic",
            ResearchMode::Pro => "pro",
        }
    }
}

impl FromStr for ResearchMode {
    type Err = CompanyPrepError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "basic" => Ok(ResearchMode::Basic),
            "pro" => Ok(ResearchMode::Pro),
            other => Err(CompanyPrepError::Validation(format!(
                "unknown research mode '{other}' (expected 'basic' or 'pro')"
            ))),
        }
    }
}

impl std::fmt::Display for ResearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build a role agent bound to the shared model endpoint and tool set.
pub fn build_role_agent(
    kind: RoleKind,
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolSet>,
    max_tool_rounds: usize,
) -> RoleAgent {
    RoleAgent::new(
        kind,
        kind.instructions(),
        kind.capabilities().to_vec(),
        model,
        tools,
        max_tool_rounds,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_mode_has_three_roles_pro_has_four() {
        assert_eq!(ResearchMode::Basic.roles().len(), 3);
        assert_eq!(ResearchMode::Pro.roles().len(), 4);
    }

    #[test]
    fn video_role_is_last_in_pro_mode() {
        let roles = ResearchMode::Pro.roles();
        assert_eq!(*roles.last().unwrap(), RoleKind::Video);
        assert!(!ResearchMode::Basic.roles().contains(&RoleKind::Video));
    }

    #[test]
    fn stock_quote_is_restricted_to_search_and_finance() {
        assert_eq!(
            RoleKind::StockQuote.capabilities(),
            &[Capability::WebSearch, Capability::Finance]
        );
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("PRO".parse::<ResearchMode>().unwrap(), ResearchMode::Pro);
        assert!("ultra".parse::<ResearchMode>().is_err());
    }
}
