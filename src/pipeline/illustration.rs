//! Illustration stage: image prompt in, `data:` URI out.
//!
//! The image model answers with a list of parts that may mix commentary text
//! and inline image bytes. The first part carrying a decodable image payload
//! wins; everything else is ignored. A response without one is an error,
//! never a placeholder.

use crate::config::GenerationConfig;
use crate::error::IllustratorError;
use crate::provider::{
    ContentRequest, ContentResponse, GenAiProvider, GenerationSettings, ImageConfig, InlineData,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Build the image request: the prompt as the only part, square output at
/// the configured size tier.
pub fn build_image_request(image_prompt: &str, config: &GenerationConfig) -> ContentRequest {
    let mut request = ContentRequest::from_prompt(image_prompt);
    request.generation_config = Some(GenerationSettings {
        response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
        image_config: Some(ImageConfig {
            aspect_ratio: config.aspect_ratio.clone(),
            image_size: config.image_size.clone(),
        }),
        ..Default::default()
    });
    request
}

/// Call the image model and return the illustration as a data URI.
pub async fn run_illustration(
    provider: &dyn GenAiProvider,
    image_prompt: &str,
    config: &GenerationConfig,
) -> Result<String, IllustratorError> {
    let request = build_image_request(image_prompt, config);
    let response = provider
        .generate_content(&config.image_model, &request)
        .await?;
    extract_image_data_uri(&response)
}

/// Find the first inline image part and encode it as
/// `data:<mime>;base64,<payload>`.
pub fn extract_image_data_uri(response: &ContentResponse) -> Result<String, IllustratorError> {
    let found = response
        .parts()
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .find_map(|inline| decoded_len(inline).map(|len| (inline, len)));

    match found {
        Some((inline, len)) => {
            debug!("Illustration: {} bytes of {}", len, inline.mime_type);
            Ok(to_data_uri(&inline.mime_type, &inline.data))
        }
        None => {
            if let Some(reason) = response.block_reason() {
                debug!("Image prompt blocked: {}", reason);
            }
            Err(IllustratorError::ImageGeneration)
        }
    }
}

/// Format a MIME type and base64 payload as a data URI.
pub fn to_data_uri(mime_type: &str, base64_data: &str) -> String {
    format!("data:{mime_type};base64,{base64_data}")
}

/// Byte length of a usable image payload: `image/*` MIME type and
/// non-empty valid base64. `None` otherwise.
fn decoded_len(inline: &InlineData) -> Option<usize> {
    if !inline.mime_type.starts_with("image/") || inline.data.is_empty() {
        return None;
    }
    STANDARD
        .decode(inline.data.as_bytes())
        .ok()
        .filter(|bytes| !bytes.is_empty())
        .map(|bytes| bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Part;

    #[test]
    fn request_is_square_and_single_part() {
        let config = GenerationConfig::default();
        let req = build_image_request("A friendly pancreas", &config);
        assert_eq!(req.contents.len(), 1);
        assert_eq!(req.contents[0].parts, vec![Part::text("A friendly pancreas")]);
        let image_config = req.generation_config.unwrap().image_config.unwrap();
        assert_eq!(image_config.aspect_ratio, "1:1");
        assert_eq!(image_config.image_size, "1K");
    }

    #[test]
    fn first_image_part_wins() {
        let resp = ContentResponse::from_parts(vec![
            Part::text("Here you go"),
            Part::inline("image/png", "aGVsbG8="),
            Part::inline("image/jpeg", "d29ybGQ="),
        ]);
        assert_eq!(
            extract_image_data_uri(&resp).unwrap(),
            "data:image/png;base64,aGVsbG8="
        );
    }

    #[test]
    fn text_only_response_fails() {
        let resp = ContentResponse::from_parts(vec![Part::text("I cannot draw that.")]);
        assert!(matches!(
            extract_image_data_uri(&resp),
            Err(IllustratorError::ImageGeneration)
        ));
    }

    #[test]
    fn unusable_inline_parts_are_skipped() {
        let resp = ContentResponse::from_parts(vec![
            Part::inline("image/png", ""),
            Part::inline("application/pdf", "aGVsbG8="),
            Part::inline("image/png", "!!not base64!!"),
            Part::inline("image/webp", "aGVsbG8="),
        ]);
        assert_eq!(
            extract_image_data_uri(&resp).unwrap(),
            "data:image/webp;base64,aGVsbG8="
        );
    }

    #[test]
    fn empty_response_fails() {
        assert!(extract_image_data_uri(&ContentResponse::default()).is_err());
    }
}
