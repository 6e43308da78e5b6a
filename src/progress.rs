//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::DeckConfigBuilder::progress_callback`] to be told when
//! each stage starts and finishes. The model call dominates wall-clock time,
//! so this is mostly useful for driving a spinner or a status line.
//!
//! # Example
//!
//! ```rust
//! use slidegen::{DeckConfig, PipelineProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl PipelineProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("→ {stage}");
//!     }
//! }
//!
//! let config = DeckConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::DeckWarning;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    Prompt,
    Model,
    Extract,
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Ingest => "Reading product information",
            Stage::Prompt => "Assembling prompt",
            Stage::Model => "Waiting for the model",
            Stage::Extract => "Extracting JSON",
            Stage::Validate => "Validating output",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as it moves through each [`Stage`].
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`; a config
/// may be shared by concurrent requests.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called just before a stage runs.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after a stage finished successfully.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage fails; the error is returned to the caller next.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once per validation warning.
    fn on_warning(&self, warning: &DeckWarning) {
        let _ = warning;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DeckConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PipelineProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start:{stage:?}"));
        }

        fn on_stage_complete(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("done:{stage:?}"));
        }

        fn on_stage_error(&self, stage: Stage, _error: &str) {
            self.events.lock().unwrap().push(format!("error:{stage:?}"));
        }

        fn on_warning(&self, _warning: &DeckWarning) {
            self.events.lock().unwrap().push("warning".into());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Ingest);
        cb.on_stage_complete(Stage::Ingest);
        cb.on_stage_error(Stage::Model, "boom");
        cb.on_warning(&DeckWarning::EmptyTitle { slide: 1 });
    }

    #[test]
    fn recorder_receives_events() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Model);
        rec.on_stage_error(Stage::Model, "timeout");
        rec.on_warning(&DeckWarning::TooFewSlides { count: 1, min: 6 });
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start:Model", "error:Model", "warning"]
        );
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Model.to_string(), "Waiting for the model");
    }
}
