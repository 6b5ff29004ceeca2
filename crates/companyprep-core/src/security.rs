//! Credential handling for the model endpoint.
//!
//! API keys are never read from config files or accepted as literals; they
//! enter the process only through environment variables resolved at load
//! time, and they travel wrapped so a stray `{:?}` cannot leak them.

use std::env;
use std::fmt;

use crate::CompanyPrepError;

/// An API key or similar credential. `Debug` prints a placeholder; call
/// [`SecretValue::expose`] at the single point the raw value is needed
/// (the request header).
#[derive(Clone)]
pub struct SecretValue(String);

impl SecretValue {
    /// The raw credential. Keep the returned slice out of log statements.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***redacted***")
    }
}

/// Read a credential from the environment, rejecting unset and blank
/// values alike so a misconfigured shell fails at startup rather than on
/// the first API call.
pub fn require_env(var: &str) -> Result<SecretValue, CompanyPrepError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretValue(value)),
        _ => Err(CompanyPrepError::MissingSecret(var.to_string())),
    }
}
