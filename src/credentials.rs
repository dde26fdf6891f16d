//! Credential capability.
//!
//! Selecting or entering an API key is a host concern: a browser shows a key
//! picker, a CLI reads an environment variable, a desktop app might open a
//! settings dialog. The orchestrator only needs the [`CredentialProvider`]
//! capability and never depends on how the host implements it.

use crate::error::IllustratorError;
use async_trait::async_trait;
use std::fmt;

/// Supplies the API key for provider calls.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// True when a key can be handed out without user interaction.
    fn has_active_credential(&self) -> bool;

    /// The currently active key, if any.
    fn active_credential(&self) -> Option<String>;

    /// Ask the host to obtain a key (open a picker, prompt, …).
    ///
    /// Called only when [`Self::has_active_credential`] is false.
    async fn request_credential(&self) -> Result<String, IllustratorError>;
}

/// Environment variables searched by [`EnvCredentials::default`], in order.
pub const DEFAULT_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

/// Reads the key from the first non-empty environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    vars: Vec<String>,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_VARS.iter().copied())
    }
}

impl EnvCredentials {
    pub fn new<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentials {
    fn has_active_credential(&self) -> bool {
        self.active_credential().is_some()
    }

    fn active_credential(&self) -> Option<String> {
        self.vars.iter().find_map(|name| non_empty_env(name))
    }

    async fn request_credential(&self) -> Result<String, IllustratorError> {
        self.active_credential()
            .ok_or_else(|| IllustratorError::CredentialUnavailable {
                hint: format!("Set one of: {}", self.vars.join(", ")),
            })
    }
}

/// A fixed key supplied by the caller.
#[derive(Clone)]
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticCredential(<redacted>)")
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    fn has_active_credential(&self) -> bool {
        !self.0.trim().is_empty()
    }

    fn active_credential(&self) -> Option<String> {
        self.has_active_credential().then(|| self.0.clone())
    }

    async fn request_credential(&self) -> Result<String, IllustratorError> {
        self.active_credential()
            .ok_or_else(|| IllustratorError::CredentialUnavailable {
                hint: "The configured API key is empty.".into(),
            })
    }
}

/// Resolve a key: the active one if present, otherwise ask the host.
pub async fn obtain_credential(
    provider: &dyn CredentialProvider,
) -> Result<String, IllustratorError> {
    match provider.active_credential() {
        Some(key) => Ok(key),
        None => provider.request_credential().await,
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
