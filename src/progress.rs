//! Progress-callback trait for generation stage events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to learn when
//! each of the two provider calls starts and finishes. The CLI uses it to
//! drive its loading spinner; a GUI host would toggle its busy indicator.
//!
//! # Example
//!
//! ```rust
//! use med_illustrator::{GenerationConfig, GenerationProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl GenerationProgressCallback for Logger {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{stage}…");
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Logger))
//!     .build()
//!     .unwrap();
//! ```

use crate::request::SourceKind;
use std::fmt;
use std::sync::Arc;

/// The two provider round trips of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading the source and drafting explanation + image prompt.
    Analysis,
    /// Rendering the illustration from the image prompt.
    Illustration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Analysis => f.write_str("Analysing source"),
            Stage::Illustration => f.write_str("Drawing illustration"),
        }
    }
}

/// Called by the orchestrator as a request moves through its stages.
///
/// All methods default to no-ops. Implementations must be `Send + Sync`
/// because independent requests may share one config across tasks.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once before the first provider call.
    fn on_generation_start(&self, source_kind: SourceKind) {
        let _ = source_kind;
    }

    /// Called just before a provider call is sent.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage produced a usable result.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once when the full result is assembled.
    fn on_generation_complete(&self) {}

    /// Called once when the run aborts.
    ///
    /// * `error`: human-readable error description
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl GenerationProgressCallback for Recorder {
        fn on_generation_start(&self, source_kind: SourceKind) {
            self.events.lock().unwrap().push(format!("start:{source_kind}"));
        }

        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("begin:{stage:?}"));
        }

        fn on_stage_complete(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("end:{stage:?}"));
        }

        fn on_error(&self, error: &str) {
            self.events.lock().unwrap().push(format!("error:{error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_generation_start(SourceKind::Url);
        cb.on_stage_start(Stage::Analysis);
        cb.on_stage_complete(Stage::Analysis);
        cb.on_error("boom");
        cb.on_generation_complete();
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_generation_start(SourceKind::Text);
        rec.on_stage_start(Stage::Analysis);
        rec.on_stage_complete(Stage::Analysis);
        rec.on_stage_start(Stage::Illustration);
        rec.on_error("no image");

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start:text",
                "begin:Analysis",
                "end:Analysis",
                "begin:Illustration",
                "error:no image",
            ]
        );
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Illustration.to_string(), "Drawing illustration");
    }
}
