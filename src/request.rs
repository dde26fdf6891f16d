//! Generation request: what to explain, to whom, and in which style.
//!
//! A [`GenerationRequest`] is built by the caller (the CLI, or any host
//! application) and handed to [`crate::generate::generate`] unchanged. The
//! orchestrator trusts it; [`GenerationRequest::validate`] exists so callers
//! can enforce the input invariants before spending an API call.

use crate::error::IllustratorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suggested output languages. Free-form labels are also accepted.
pub const TARGET_LANGUAGES: &[&str] = &[
    "English",
    "Spanish",
    "French",
    "German",
    "Portuguese",
    "Chinese",
    "Japanese",
    "Hindi",
    "Arabic",
];

/// Where the source material comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// `content` is the document text itself.
    #[default]
    Text,
    /// `content` is a URL the reasoning model reads with its URL tool.
    Url,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Text => f.write_str("text"),
            SourceKind::Url => f.write_str("url"),
        }
    }
}

/// Target audience; drives vocabulary and depth of the explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Audience {
    Kids,
    Teens,
    PreAdults,
    #[default]
    Adults,
}

impl Audience {
    /// Label inserted into the prompt.
    pub fn label(self) -> &'static str {
        match self {
            Audience::Kids => "Kids (Under 10)",
            Audience::Teens => "Teens (10-16)",
            Audience::PreAdults => "Pre-adults (16-20)",
            Audience::Adults => "Adults (20+)",
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Visual style enforced on the illustration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IllustrationStyle {
    OldFashion,
    WhiteBoard,
    #[default]
    Modern,
    ComicBook,
    OilPainting,
    PixelArt,
}

impl IllustrationStyle {
    /// Style directive inserted into the prompt.
    pub fn label(self) -> &'static str {
        match self {
            IllustrationStyle::OldFashion => "Old Fashion Scholar Book",
            IllustrationStyle::WhiteBoard => "White Board Sketch",
            IllustrationStyle::Modern => "Modern Flat Vector",
            IllustrationStyle::ComicBook => "Comic Book",
            IllustrationStyle::OilPainting => "Oil Painting",
            IllustrationStyle::PixelArt => "Pixel Art",
        }
    }

    /// One-line description shown in CLI help.
    pub fn description(self) -> &'static str {
        match self {
            IllustrationStyle::OldFashion => "Vintage textbook aesthetic with detailed hatching.",
            IllustrationStyle::WhiteBoard => "Simple marker sketches on a white background.",
            IllustrationStyle::Modern => "Clean, flat colors and geometric shapes.",
            IllustrationStyle::ComicBook => "Bold outlines, panels and speech bubbles.",
            IllustrationStyle::OilPainting => "Rich textured brush strokes.",
            IllustrationStyle::PixelArt => "Retro low-resolution pixel graphics.",
        }
    }
}

impl fmt::Display for IllustrationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Input to one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub source_kind: SourceKind,
    /// Document text, or the URL when `source_kind` is [`SourceKind::Url`].
    pub content: String,
    pub target_language: String,
    pub audience: Audience,
    pub style: IllustrationStyle,
}

impl GenerationRequest {
    /// Request built from raw document text.
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            source_kind: SourceKind::Text,
            content: content.into(),
            target_language: "English".to_string(),
            audience: Audience::default(),
            style: IllustrationStyle::default(),
        }
    }

    /// Request that points the reasoning model at a web page.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            source_kind: SourceKind::Url,
            ..Self::from_text(url)
        }
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.target_language = language.into();
        self
    }

    pub fn audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }

    pub fn style(mut self, style: IllustrationStyle) -> Self {
        self.style = style;
        self
    }

    /// Check the caller-side invariants: non-empty content, a non-empty
    /// language, and an HTTP(S) URL with a host when the source is a URL.
    pub fn validate(&self) -> Result<(), IllustratorError> {
        if self.content.trim().is_empty() {
            return Err(IllustratorError::InvalidRequest(
                "content must not be empty".into(),
            ));
        }
        if self.target_language.trim().is_empty() {
            return Err(IllustratorError::InvalidRequest(
                "target language must not be empty".into(),
            ));
        }
        if self.source_kind == SourceKind::Url && !is_url(self.content.trim()) {
            return Err(IllustratorError::InvalidRequest(format!(
                "'{}' is not a valid HTTP/HTTPS URL",
                self.content
            )));
        }
        Ok(())
    }
}

/// True for `http://` or `https://` strings with a non-empty host and no
/// whitespace.
pub fn is_url(input: &str) -> bool {
    let rest = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !input.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
