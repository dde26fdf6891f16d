//! # med-illustrator
//!
//! Turn a medical document or web page into an audience-adapted explanation
//! plus one infographic-style illustration, using Gemini models.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text or URL
//!  │
//!  ├─ 1. Resolve   provider + API key (explicit, host capability, env)
//!  ├─ 2. Analyse   reasoning model → { explanation, imagePrompt }
//!  │               URL: url_context tool, fences stripped before parsing
//!  │               text: response schema, first 30 000 chars only
//!  ├─ 3. Draw      image model → first inline image part
//!  └─ 4. Assemble  data URI + explanation + prompt
//! ```
//!
//! The two calls are strictly sequential and any failure aborts the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use med_illustrator::{generate, Audience, GenerationConfig, GenerationRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from GEMINI_API_KEY / GOOGLE_API_KEY / API_KEY
//!     let config = GenerationConfig::default();
//!     let request = GenerationRequest::from_url("https://example.org/insulin")
//!         .language("Spanish")
//!         .audience(Audience::Kids);
//!     let result = generate(&request, &config).await?;
//!     println!("{}", result.explanation);
//!     eprintln!("image: {} bytes", result.decode_image()?.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `med-illustrator` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! med-illustrator = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod credentials;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod provider;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use credentials::{CredentialProvider, EnvCredentials, StaticCredential};
pub use error::IllustratorError;
pub use generate::{generate, generate_sync, generate_to_dir, write_outputs};
pub use output::{AnalysisResult, GenerationResult, Source, WrittenOutput};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use provider::gemini::GeminiProvider;
pub use provider::GenAiProvider;
pub use request::{Audience, GenerationRequest, IllustrationStyle, SourceKind, TARGET_LANGUAGES};
