//! Configuration for a generation run.
//!
//! Every knob lives in [`GenerationConfig`], built through
//! [`GenerationConfigBuilder`]. The config is cheap to clone and holds no
//! mutable state, so one instance can serve any number of independent
//! requests.
//!
//! Environment overrides read by [`GenerationConfig::from_env`]:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `ILLUSTRATOR_TEXT_MODEL`  | [`GenerationConfig::text_model`] |
//! | `ILLUSTRATOR_IMAGE_MODEL` | [`GenerationConfig::image_model`] |
//! | `GEMINI_API_BASE`         | [`GenerationConfig::api_base`] |
//!
//! The API key itself is resolved at call time (see
//! [`crate::credentials`]).

use crate::credentials::CredentialProvider;
use crate::error::IllustratorError;
use crate::progress::ProgressCallback;
use crate::provider::gemini::DEFAULT_API_BASE;
use crate::provider::GenAiProvider;
use std::fmt;
use std::sync::Arc;

/// Fast reasoning model used for the analysis stage.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// High-fidelity image model used for the illustration stage.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Characters of document text kept before building the prompt.
pub const DEFAULT_MAX_SOURCE_CHARS: usize = 30_000;

/// Configuration for [`crate::generate::generate`].
///
/// # Example
/// ```rust
/// use med_illustrator::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .text_model("gemini-2.5-flash")
///     .api_timeout_secs(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Model for the analysis stage. Default: [`DEFAULT_TEXT_MODEL`].
    pub text_model: String,

    /// Model for the illustration stage. Default: [`DEFAULT_IMAGE_MODEL`].
    pub image_model: String,

    /// Explicit API key. Takes precedence over `credentials`.
    pub api_key: Option<String>,

    /// Gemini REST base URL. Default: [`DEFAULT_API_BASE`].
    pub api_base: String,

    /// Pre-constructed provider. Takes precedence over every key setting.
    pub provider: Option<Arc<dyn GenAiProvider>>,

    /// Host capability that supplies the key when `api_key` is unset.
    /// Falls back to [`crate::credentials::EnvCredentials`] when `None`.
    pub credentials: Option<Arc<dyn CredentialProvider>>,

    /// Document text beyond this many characters is dropped before
    /// prompting. Default: 30 000.
    ///
    /// The cut is silent: the result does not report that text was lost.
    pub max_source_chars: usize,

    /// Illustration aspect ratio. Default: `"1:1"`.
    pub aspect_ratio: String,

    /// Illustration size tier. Default: `"1K"`.
    pub image_size: String,

    /// HTTP timeout per provider call in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Optional stage-event callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            provider: None,
            credentials: None,
            max_source_chars: DEFAULT_MAX_SOURCE_CHARS,
            aspect_ratio: "1:1".to_string(),
            image_size: "1K".to_string(),
            api_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("credentials", &self.credentials.as_ref().map(|_| "<dyn CredentialProvider>"))
            .field("max_source_chars", &self.max_source_chars)
            .field("aspect_ratio", &self.aspect_ratio)
            .field("image_size", &self.image_size)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults with the `ILLUSTRATOR_*` / `GEMINI_API_BASE` overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(model) = env_value("ILLUSTRATOR_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(model) = env_value("ILLUSTRATOR_IMAGE_MODEL") {
            config.image_model = model;
        }
        if let Some(base) = env_value("GEMINI_API_BASE") {
            config.api_base = base;
        }
        config
    }
}

/// Builder for [`GenerationConfig`].
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl fmt::Debug for GenerationConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationConfigBuilder {
    /// Start from an existing config, e.g. [`GenerationConfig::from_env`].
    pub fn from_config(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_model = model.into();
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn GenAiProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    pub fn max_source_chars(mut self, n: usize) -> Self {
        self.config.max_source_chars = n;
        self
    }

    pub fn aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.config.aspect_ratio = ratio.into();
        self
    }

    pub fn image_size(mut self, size: impl Into<String>) -> Self {
        self.config.image_size = size.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, IllustratorError> {
        let c = &self.config;
        if c.text_model.trim().is_empty() || c.image_model.trim().is_empty() {
            return Err(IllustratorError::InvalidConfig(
                "model identifiers must not be empty".into(),
            ));
        }
        if c.max_source_chars == 0 {
            return Err(IllustratorError::InvalidConfig(
                "max_source_chars must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(IllustratorError::InvalidConfig(
                "api_timeout_secs must be ≥ 1".into(),
            ));
        }
        if !c.api_base.starts_with("http://") && !c.api_base.starts_with("https://") {
            return Err(IllustratorError::InvalidConfig(format!(
                "api_base must be an HTTP/HTTPS URL, got '{}'",
                c.api_base
            )));
        }
        Ok(self.config)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = GenerationConfig::default();
        assert_eq!(c.text_model, "gemini-2.5-flash");
        assert_eq!(c.image_model, "gemini-3-pro-image-preview");
        assert_eq!(c.max_source_chars, 30_000);
        assert_eq!(c.aspect_ratio, "1:1");
        assert_eq!(c.image_size, "1K");
    }

    #[test]
    fn builder_rejects_zero_cap() {
        let err = GenerationConfig::builder().max_source_chars(0).build();
        assert!(matches!(err, Err(IllustratorError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_bad_base() {
        assert!(GenerationConfig::builder()
            .api_base("generativelanguage.googleapis.com")
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let c = GenerationConfig::builder()
            .api_key("super-secret")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
