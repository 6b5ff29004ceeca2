use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Core error type for CompanyPrep.
#[derive(Debug, Error)]
pub enum CompanyPrepError {
    #[error("configuration error: {0}")]
    InvalidConfiguration(String),
    #[error("missing environment variable: {0}")]
    MissingSecret(String),
    #[error("I/O error while reading {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("model request failed: {0}")]
    Model(String),
    #[error("tool '{tool}' failed: {reason}")]
    Tool { tool: String, reason: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CompanyPrepError {
    pub fn config_io(path: PathBuf, source: std::io::Error) -> Self {
        Self::ConfigIo { path, source }
    }

    pub fn tool(tool: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Tool {
            tool: tool.into(),
            reason: reason.to_string(),
        }
    }
}
