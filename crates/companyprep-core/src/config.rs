use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{CompanyPrepError, SecretValue, require_env};

const DEFAULT_CONFIG_PATH: &str = "companyprep.toml";
const CONFIG_PATH_ENV: &str = "COMPANYPREP_CONFIG";
const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Top-level configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub research: ResearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Resolve the configured LLM secret value (from environment only).
    ///
    /// Hard-coded credentials are deliberately unsupported; the key must be
    /// supplied through the environment variable named in `llm.api_key_env`.
    pub fn llm_api_key(&self) -> Result<SecretValue, CompanyPrepError> {
        require_env(&self.llm.api_key_env)
    }

    /// Runnable default requiring only `GEMINI_API_KEY` in the environment.
    pub fn default_local() -> Self {
        Self {
            llm: LlmConfig {
                provider: "gemini".to_string(),
                model: "gemini-2.0-flash".to_string(),
                api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            },
            research: ResearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Helper to load configuration with best-practice guard rails.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a provided path or discoverable defaults.
    ///
    /// Resolution order:
    /// 1. Explicit `path` argument.
    /// 2. `COMPANYPREP_CONFIG` environment variable.
    /// 3. `companyprep.toml` in the current working directory.
    /// 4. Built-in defaults when no file exists at the discovered path.
    pub fn load(path: Option<PathBuf>) -> Result<Config, CompanyPrepError> {
        let explicit = path.is_some();
        let candidate = resolve_path(path);

        if !candidate.exists() && !explicit {
            let config = Config::default_local();
            Self::validate(&config)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(&candidate)
            .map_err(|err| CompanyPrepError::config_io(candidate.clone(), err))?;
        let config: Config = toml::from_str(&raw)
            .map_err(|err| CompanyPrepError::InvalidConfiguration(err.to_string()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &Config) -> Result<(), CompanyPrepError> {
        if config.llm.api_key_env.trim().is_empty() {
            return Err(CompanyPrepError::InvalidConfiguration(
                "llm.api_key_env must reference an environment variable".into(),
            ));
        }

        if config.research.max_tool_rounds == 0 {
            return Err(CompanyPrepError::InvalidConfiguration(
                "research.max_tool_rounds must be at least 1".into(),
            ));
        }

        // Ensure environment variable exists at load time to discourage inline secrets.
        require_env(&config.llm.api_key_env)?;
        Ok(())
    }
}

fn resolve_path(path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = path {
        return path;
    }

    if let Ok(from_env) = env::var(CONFIG_PATH_ENV) {
        if !from_env.trim().is_empty() {
            return PathBuf::from(from_env);
        }
    }

    Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    #[serde(default = "LlmConfig::default_api_key_env")]
    pub api_key_env: String,
}

impl LlmConfig {
    fn default_api_key_env() -> String {
        DEFAULT_API_KEY_ENV.to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResearchConfig {
    #[serde(default = "ResearchConfig::default_max_tool_rounds")]
    pub max_tool_rounds: usize,
    #[serde(default = "ResearchConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ResearchConfig {
    const fn default_max_tool_rounds() -> usize {
        6
    }

    const fn default_request_timeout_ms() -> u64 {
        120_000
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: Self::default_max_tool_rounds(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}
