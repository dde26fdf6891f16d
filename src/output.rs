//! Output types: the parsed analysis and the final generation result.

use crate::error::IllustratorError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parsed output of the reasoning stage.
///
/// Only constructed through [`crate::pipeline::analysis::parse_analysis`],
/// which guarantees both fields are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub explanation: String,
    pub image_prompt: String,
}

/// A provenance reference for the explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// The complete result of one generation run.
///
/// Serialises with camelCase keys (`imageUrl`, `generatedPrompt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// `data:<mime>;base64,<payload>`: the image itself, never a remote link.
    pub image_url: String,
    pub explanation: String,
    /// The image prompt derived by the reasoning stage.
    pub generated_prompt: String,
    /// Reserved for grounding citations. Always empty for now.
    pub sources: Vec<Source>,
}

impl GenerationResult {
    /// MIME type embedded in [`Self::image_url`], e.g. `image/png`.
    pub fn image_mime_type(&self) -> Option<&str> {
        split_data_uri(&self.image_url).map(|(mime, _)| mime)
    }

    /// Decode the image bytes carried by [`Self::image_url`].
    pub fn decode_image(&self) -> Result<Vec<u8>, IllustratorError> {
        let (_, payload) = split_data_uri(&self.image_url).ok_or_else(|| {
            IllustratorError::Internal("image_url is not a base64 data URI".into())
        })?;
        STANDARD
            .decode(payload)
            .map_err(|e| IllustratorError::Internal(format!("image payload is not base64: {e}")))
    }
}

/// Split `data:<mime>;base64,<payload>` into `(mime, payload)`.
///
/// Returns `None` for anything else, including an empty MIME type or payload.
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (mime, payload) = rest.split_once(";base64,")?;
    if mime.is_empty() || payload.is_empty() {
        return None;
    }
    Some((mime, payload))
}

/// Paths written by [`crate::generate::generate_to_dir`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenOutput {
    pub image_path: PathBuf,
    pub explanation_path: PathBuf,
    pub result_path: PathBuf,
}
