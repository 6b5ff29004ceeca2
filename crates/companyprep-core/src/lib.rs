//! CompanyPrep core built directly on top of `graph_flow`.
//!
//! This crate provides the role agents, tool adapters, and report merge
//! used to assemble an AI-generated company research report from web
//! search, financial data, news articles, and (pro mode) video lookups.

mod agent;
mod config;
mod error;
mod events;
mod logging;
mod report;
mod roles;
mod security;
mod tasks;
mod workflow;

pub mod llm;
pub mod tools;

pub use agent::{RoleAgent, RoleOutput};
pub use config::{Config, ConfigLoader, LlmConfig, LoggingConfig, ResearchConfig};
pub use error::CompanyPrepError;
pub use events::{EventCollector, ProgressEvent, Stage};
pub use logging::{SessionLogInput, log_session_completion};
pub use report::{ReportBuilder, ReportSection, ResearchArtifact, SectionEntry};
pub use roles::{ResearchMode, RoleKind, build_role_agent};
pub use security::{SecretValue, require_env};
pub use workflow::{
    ResearchRuntime, SessionOptions, run_research_session, run_research_session_with_options,
    run_stock_lookup,
};
