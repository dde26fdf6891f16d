//! Error types for the med-illustrator library.
//!
//! A generation either succeeds completely or fails with exactly one
//! [`IllustratorError`]. There is no partial result: the orchestrator never
//! hands back an explanation without an image, or an image without the
//! prompt that produced it.
//!
//! The variants split into two groups:
//!
//! * **Pipeline failures**: the provider answered but the answer was not
//!   usable ([`IllustratorError::Format`], [`IllustratorError::Generation`],
//!   [`IllustratorError::ImageGeneration`]).
//! * **Boundary failures**: the provider could not be reached or refused the
//!   credential ([`IllustratorError::Transport`], [`IllustratorError::Auth`]).
//!
//! Callers that want to re-prompt for a key should match on
//! [`IllustratorError::is_auth`] instead of inspecting message text.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the med-illustrator library.
#[derive(Debug, Error)]
pub enum IllustratorError {
    // ── Pipeline errors ───────────────────────────────────────────────────
    /// The reasoning response could not be parsed into `explanation` +
    /// `imagePrompt`, or one of them was missing or empty.
    ///
    /// `raw` holds the offending text for diagnostics.
    #[error("The AI response was not in the expected format: {reason}")]
    Format { reason: String, raw: String },

    /// The reasoning service returned no text at all.
    #[error("Failed to generate analysis from the source material.")]
    Generation,

    /// The image service response held no inline image part.
    #[error("Failed to generate image from the model response.")]
    ImageGeneration,

    // ── Boundary errors ───────────────────────────────────────────────────
    /// The provider rejected the active credential or project.
    #[error("The API key seems invalid or expired: {detail}\nSelect a valid key or project and try again.")]
    Auth { detail: String },

    /// Network or provider-level failure, surfaced verbatim.
    #[error("Provider request failed: {message}")]
    Transport { message: String },

    /// No credential is available and none could be obtained.
    #[error("No API key available.\n{hint}")]
    CredentialUnavailable { hint: String },

    // ── Caller errors ─────────────────────────────────────────────────────
    /// The request violates a caller-side invariant.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IllustratorError {
    /// Build a [`IllustratorError::Format`] carrying the raw provider text.
    pub(crate) fn format(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// True when the caller should ask for a new credential rather than retry.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::CredentialUnavailable { .. })
    }

    /// The raw provider text attached to a format failure, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Format { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_keeps_raw_text() {
        let e = IllustratorError::format("expected value at line 1", "not json");
        assert_eq!(e.raw_response(), Some("not json"));
        assert!(e.to_string().contains("expected value"));
    }

    #[test]
    fn auth_is_distinguishable() {
        let e = IllustratorError::Auth {
            detail: "Requested entity was not found.".into(),
        };
        assert!(e.is_auth());
        assert!(e.to_string().contains("Requested entity was not found"));
        assert!(!IllustratorError::ImageGeneration.is_auth());
    }

    #[test]
    fn transport_display_is_verbatim() {
        let e = IllustratorError::Transport {
            message: "connection reset by peer".into(),
        };
        assert!(e.to_string().contains("connection reset by peer"));
        assert!(e.raw_response().is_none());
    }
}
