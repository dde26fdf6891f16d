//! Response normalisation: strip markdown code fences before JSON parsing.
//!
//! The URL-reading analysis call cannot use a response schema, so the model
//! is only *asked* to return bare JSON. It sometimes wraps the object in
//! ` ```json … ``` ` anyway. This pass removes one pair of outer fences
//! (with or without a language tag) so the parser sees the object itself.
//!
//! The pass is deliberately narrow: it never touches backticks inside the
//! payload and never tries to repair the JSON.

use once_cell::sync::Lazy;
use regex::Regex;

/// Opening fence: three backticks, optional spaces, optional language tag.
static RE_OPENING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[ \t]*(?:[A-Za-z][A-Za-z0-9_+-]*)?").unwrap());

/// Remove outer triple-backtick fences from `input`.
///
/// Surrounding whitespace is trimmed. Nested outer fences are peeled until
/// none remain, so applying the function twice gives the same result as
/// applying it once. Input without fences comes back trimmed and otherwise
/// unchanged.
pub fn strip_code_fences(input: &str) -> &str {
    let mut s = input.trim();
    loop {
        let stripped = strip_one_fence_pair(s);
        if stripped.len() == s.len() {
            return s;
        }
        s = stripped;
    }
}

fn strip_one_fence_pair(s: &str) -> &str {
    let s = match RE_OPENING_FENCE.find(s) {
        Some(m) => &s[m.end()..],
        None => s,
    };

    let s = s.trim();
    match s.strip_suffix("```") {
        Some(body) => body.trim(),
        None => s,
    }
}

/// True when `input` starts or ends with a fence.
pub fn has_code_fences(input: &str) -> bool {
    let s = input.trim();
    s.starts_with("```") || s.ends_with("```")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const OBJ: &str = r#"{"explanation": "a", "imagePrompt": "b"}"#;

    #[test]
    fn test_strip_json_fence() {
        let input = format!("```json\n{OBJ}\n```");
        assert_eq!(strip_code_fences(&input), OBJ);
    }

    #[test]
    fn test_strip_bare_fence() {
        let input = format!("```\n{OBJ}\n```");
        assert_eq!(strip_code_fences(&input), OBJ);
    }

    #[test]
    fn test_strip_single_line_fence() {
        let input = format!("```json {OBJ} ```");
        assert_eq!(strip_code_fences(&input), OBJ);
    }

    #[test]
    fn test_strip_tag_after_space() {
        let input = format!("``` JSON\r\n{OBJ}\r\n```\n");
        assert_eq!(strip_code_fences(&input), OBJ);
    }

    #[test]
    fn test_unclosed_fence() {
        let input = format!("```json\n{OBJ}");
        assert_eq!(strip_code_fences(&input), OBJ);
    }

    #[test]
    fn test_no_fences_passthrough() {
        let input = format!("  {OBJ}\n");
        assert_eq!(strip_code_fences(&input), OBJ);
        assert!(!has_code_fences(&input));
    }

    #[test]
    fn test_inner_backticks_untouched() {
        let input = r#"```json
{"explanation": "use `insulin`", "imagePrompt": "b"}
```"#;
        assert_eq!(
            strip_code_fences(input),
            r#"{"explanation": "use `insulin`", "imagePrompt": "b"}"#
        );
    }

    #[test]
    fn test_nested_fences_fully_removed() {
        let input = "```json\n```json\n{\"a\":1}\n```\n```";
        let once = strip_code_fences(input);
        assert_eq!(once, "{\"a\":1}");
        assert_eq!(strip_code_fences(once), once);
    }

    #[test]
    fn test_idempotent() {
        for input in [
            format!("```json\n{OBJ}\n```"),
            format!("```\n{OBJ}\n```"),
            format!("```json\n```json\n{OBJ}\n```\n```"),
            OBJ.to_string(),
        ] {
            let once = strip_code_fences(&input);
            assert_eq!(strip_code_fences(once), once);
            assert!(has_code_fences(&input) || once == OBJ);
        }
    }
}
