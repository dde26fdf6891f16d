//! Prompts for the analysis stage.
//!
//! All prompt text lives here so that the wording can change without
//! touching the call path, and so tests can inspect prompts without a
//! provider.
//!
//! The analysis prompt has three blocks:
//!
//! 1. **Source framing**: either "read this URL" or the document text itself
//!    (cut to the configured character cap).
//! 2. **Grounding rules**: use only what the source says.
//! 3. **Task**: explanation for the audience, then an image prompt in the
//!    requested style.
//!
//! URL requests also get [`JSON_FORMAT_INSTRUCTION`] appended because the
//! URL tool cannot be combined with a response schema.

use crate::request::{GenerationRequest, SourceKind};
use serde_json::{json, Value};
use std::borrow::Cow;

/// Grounding rules shared by both source kinds.
pub const GROUNDING_RULES: &str = r#"CRITICAL INSTRUCTION:
Base the explanation and the image prompt STRICTLY and ONLY on the information contained in the source above.
Do NOT use outside knowledge, background knowledge from your training data, or assumptions about the topic.
If the source does not contain enough information for a full explanation, summarize only what is present.
The illustration must ONLY depict concepts that the source explicitly mentions."#;

/// Output contract appended for URL requests, which cannot use a schema.
pub const JSON_FORMAT_INSTRUCTION: &str = r#"FORMATTING INSTRUCTION:
Return the result as one valid JSON object and nothing else.
Do NOT wrap it in markdown formatting or code blocks (no ``` or ```json).
The JSON object must have exactly this structure:
{
  "explanation": "the audience-adapted explanation text",
  "imagePrompt": "the detailed prompt for the image generator"
}"#;

/// Keep at most `max_chars` characters of `content`.
///
/// Counts Unicode scalar values, so multi-byte text is never split inside a
/// character. Content at or under the cap is borrowed unchanged.
pub fn truncate_source(content: &str, max_chars: usize) -> Cow<'_, str> {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(content[..byte_idx].to_string()),
        None => Cow::Borrowed(content),
    }
}

/// Build the analysis prompt for `request`.
pub fn build_analysis_prompt(request: &GenerationRequest, max_source_chars: usize) -> String {
    let source = match request.source_kind {
        SourceKind::Url => format!(
            "I have a URL: {}\nAccess this URL and read its content to understand it.",
            request.content.trim()
        ),
        SourceKind::Text => format!(
            "I have the following document content:\n\"\"\"\n{}\n\"\"\"",
            truncate_source(&request.content, max_source_chars)
        ),
    };

    let language = request.target_language.trim();
    let audience = request.audience.label();
    let style = request.style.label();
    let rules = GROUNDING_RULES;

    let mut prompt = format!(
        r#"{source}

{rules}

Task:
1. Explain the MOST important information from the source in {language}.
   a. Extract 5 to 10 important insights from the source.
   b. Adapt the explanation to the vocabulary and comprehension level of a {audience} audience.
   c. Keep it under 500 words.

2. Write a detailed image generation prompt.
   a. The prompt will produce a single illustration summarizing the insights from step 1.
   b. Cover as many of those insights as possible.
   c. Describe the visual elements and composition, and enforce the '{style}' style.
   d. Any text shown inside the illustration must be in {language} only, never in the language of the source document or web page.
   e. Depict only elements grounded in the insights from step 1.
   f. Keep it informative; do not oversimplify beyond what the {audience} audience needs."#
    );

    if request.source_kind == SourceKind::Url {
        prompt.push_str("\n\n");
        prompt.push_str(JSON_FORMAT_INSTRUCTION);
    }

    prompt
}

/// Response schema for document requests: an object with two required
/// string properties.
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "explanation": {
                "type": "STRING",
                "description": "The audience-adapted explanation."
            },
            "imagePrompt": {
                "type": "STRING",
                "description": "The detailed prompt for the image generator."
            }
        },
        "required": ["explanation", "imagePrompt"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Audience, IllustrationStyle};

    #[test]
    fn short_content_is_borrowed_unchanged() {
        let s = "Insulin helps regulate blood sugar.";
        assert!(matches!(truncate_source(s, 30_000), Cow::Borrowed(x) if x == s));
        assert_eq!(truncate_source(s, s.len()), s);
    }

    #[test]
    fn long_content_is_cut_to_cap() {
        let s = "a".repeat(30_001);
        assert_eq!(truncate_source(&s, 30_000).chars().count(), 30_000);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = "é".repeat(10);
        let cut = truncate_source(&s, 3);
        assert_eq!(cut, "ééé");
    }

    #[test]
    fn text_prompt_embeds_content_and_preferences() {
        let req = GenerationRequest::from_text("Insulin helps regulate blood sugar.")
            .language("Spanish")
            .audience(Audience::Kids)
            .style(IllustrationStyle::ComicBook);
        let p = build_analysis_prompt(&req, 30_000);
        assert!(p.contains("Insulin helps regulate blood sugar."));
        assert!(p.contains("in Spanish"));
        assert!(p.contains("Kids (Under 10)"));
        assert!(p.contains("'Comic Book' style"));
        assert!(p.contains("ONLY on the information"));
        assert!(!p.contains("FORMATTING INSTRUCTION"));
    }

    #[test]
    fn text_prompt_drops_content_past_cap() {
        let req = GenerationRequest::from_text(format!("{}{}", "x".repeat(10), "TAIL"));
        let p = build_analysis_prompt(&req, 10);
        assert!(!p.contains("TAIL"));
    }

    #[test]
    fn url_prompt_asks_for_bare_json() {
        let req = GenerationRequest::from_url("https://example.com/article");
        let p = build_analysis_prompt(&req, 30_000);
        assert!(p.contains("https://example.com/article"));
        assert!(p.contains("Access this URL"));
        assert!(p.ends_with(JSON_FORMAT_INSTRUCTION));
    }

    #[test]
    fn schema_requires_both_fields() {
        let schema = analysis_response_schema();
        assert_eq!(schema["required"], json!(["explanation", "imagePrompt"]));
        assert_eq!(schema["properties"]["imagePrompt"]["type"], "STRING");
    }
}
