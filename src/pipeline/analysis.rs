//! Analysis stage: read the source, return explanation + image prompt.
//!
//! The provider cannot combine its URL tool with a response schema, so the
//! stage has two request shapes, chosen once from the request's
//! [`SourceKind`]:
//!
//! | Mode | Tool | Schema | Reply handling |
//! |------|------|--------|----------------|
//! | [`ReasoningMode::UrlContext`] | `url_context` | none | fences stripped, then parsed |
//! | [`ReasoningMode::StructuredJson`] | none | strict two-field object | parsed as-is |
//!
//! Both modes end in [`parse_analysis`], which refuses to return an
//! [`AnalysisResult`] unless both fields are present and non-empty.

use crate::config::GenerationConfig;
use crate::error::IllustratorError;
use crate::output::AnalysisResult;
use crate::pipeline::normalize::{has_code_fences, strip_code_fences};
use crate::prompts::{analysis_response_schema, build_analysis_prompt};
use crate::provider::{ContentRequest, ContentResponse, GenAiProvider, GenerationSettings, Tool};
use crate::request::{GenerationRequest, SourceKind};
use serde::Deserialize;
use tracing::{debug, warn};

/// How the analysis call is shaped and how its reply is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningMode {
    /// URL tool on, JSON requested in the prompt only.
    UrlContext,
    /// No tool, JSON enforced by a response schema.
    StructuredJson,
}

impl ReasoningMode {
    pub fn for_source(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Url => ReasoningMode::UrlContext,
            SourceKind::Text => ReasoningMode::StructuredJson,
        }
    }

    /// Wrap `prompt` in the request shape this mode needs.
    pub fn build_request(self, prompt: String) -> ContentRequest {
        let mut request = ContentRequest::from_prompt(prompt);
        match self {
            ReasoningMode::UrlContext => {
                request.tools.push(Tool::UrlContext {});
            }
            ReasoningMode::StructuredJson => {
                request.generation_config = Some(GenerationSettings {
                    response_mime_type: Some("application/json".to_string()),
                    response_schema: Some(analysis_response_schema()),
                    ..Default::default()
                });
            }
        }
        request
    }
}

/// Run the analysis call for `request` and parse its reply.
pub async fn run_analysis(
    provider: &dyn GenAiProvider,
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> Result<AnalysisResult, IllustratorError> {
    let mode = ReasoningMode::for_source(request.source_kind);

    if request.source_kind == SourceKind::Text {
        let chars = request.content.chars().count();
        if chars > config.max_source_chars {
            warn!(
                "Source text is {} chars; only the first {} are sent",
                chars, config.max_source_chars
            );
        }
    }

    let prompt = build_analysis_prompt(request, config.max_source_chars);
    debug!("Analysis prompt: {} chars, mode {:?}", prompt.len(), mode);

    let content_request = mode.build_request(prompt);
    let response = provider
        .generate_content(&config.text_model, &content_request)
        .await?;

    parse_analysis(mode, &response)
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default, rename = "imagePrompt", alias = "image_prompt")]
    image_prompt: Option<String>,
}

/// Turn an analysis reply into an [`AnalysisResult`].
///
/// * `StructuredJson` with no text → [`IllustratorError::Generation`].
/// * Unparsable JSON, or a missing/blank field → [`IllustratorError::Format`]
///   carrying the raw reply.
pub fn parse_analysis(
    mode: ReasoningMode,
    response: &ContentResponse,
) -> Result<AnalysisResult, IllustratorError> {
    let text = match (response.text(), mode) {
        (Some(text), _) => text,
        (None, ReasoningMode::StructuredJson) => {
            if let Some(reason) = response.block_reason() {
                debug!("Analysis prompt blocked: {}", reason);
            }
            return Err(IllustratorError::Generation);
        }
        (None, ReasoningMode::UrlContext) => {
            return Err(IllustratorError::format("the response was empty", ""));
        }
    };

    let body = match mode {
        ReasoningMode::UrlContext => {
            if has_code_fences(&text) {
                warn!("Analysis reply was wrapped in code fences; stripping them");
            }
            strip_code_fences(&text)
        }
        ReasoningMode::StructuredJson => text.as_str(),
    };

    parse_fields(body).map_err(|reason| IllustratorError::format(reason, text.as_str()))
}

fn parse_fields(body: &str) -> Result<AnalysisResult, String> {
    let raw: RawAnalysis = serde_json::from_str(body).map_err(|e| e.to_string())?;

    let explanation = non_blank(raw.explanation).ok_or("missing or empty `explanation`")?;
    let image_prompt = non_blank(raw.image_prompt).ok_or("missing or empty `imagePrompt`")?;

    Ok(AnalysisResult {
        explanation,
        image_prompt,
    })
}

/// Keeps the provider's text as-is; whitespace only counts as empty.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
