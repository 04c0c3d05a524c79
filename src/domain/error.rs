//! Engine error taxonomy
//!
//! Frame-level processing never aborts the stream: malformed detections are
//! skipped, classifier failures are isolated at the facade, and only invalid
//! configuration is fatal (at engine construction).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Detection with a missing/invalid class, bbox, or confidence.
    /// Handling: skip that detection, continue the frame.
    #[error("malformed detection: {0}")]
    MalformedDetection(&'static str),

    /// Unexpected internal failure in one classifier.
    /// Handling: log, zero events from that classifier, continue the others.
    #[error("classifier {classifier} failed: {reason}")]
    ClassifierFailure { classifier: &'static str, reason: String },

    /// Invalid threshold or window. Fatal to engine construction.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl EngineError {
    pub fn classifier(classifier: &'static str, reason: impl Into<String>) -> Self {
        EngineError::ClassifierFailure { classifier, reason: reason.into() }
    }
}
