//! Suspicious-movement detection
//!
//! Flags person tracks whose recent step distances show high variance, the
//! signature of erratic back-and-forth movement. Needs a reasonably full
//! movement history before the variance is meaningful.

use crate::domain::error::EngineError;
use crate::domain::types::{AnomalyEvent, AnomalyKind, Severity, PERSON_CLASS};
use crate::infra::config::Config;
use crate::services::store::TrackStore;
use tracing::debug;

/// Minimum recorded steps before the mean is considered
const MIN_SAMPLES: usize = 5;

/// Minimum recorded steps before the variance is considered
const MIN_SAMPLES_FOR_VARIANCE: usize = 8;

/// Confidence attached to suspicious-movement events
const CONFIDENCE: f64 = 0.7;

pub struct SuspiciousMovementDetector {
    variance_threshold: f64,
}

impl SuspiciousMovementDetector {
    pub fn new(config: &Config) -> Self {
        Self { variance_threshold: config.movement_variance() }
    }

    /// Scan person tracks for erratic movement patterns
    pub fn scan(&self, store: &TrackStore) -> Result<Vec<AnomalyEvent>, EngineError> {
        let mut events = Vec::new();

        for track in store.tracks() {
            let steps = &track.movement_history;
            if track.class_label != PERSON_CLASS || steps.len() <= MIN_SAMPLES {
                continue;
            }

            let mean: f64 = steps.iter().sum::<f64>() / steps.len() as f64;

            if steps.len() <= MIN_SAMPLES_FOR_VARIANCE {
                continue;
            }
            // Population variance over the recorded steps
            let variance: f64 =
                steps.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / steps.len() as f64;
            if variance <= self.variance_threshold {
                continue;
            }

            let bbox = track.marker_bbox().ok_or_else(|| {
                EngineError::classifier(
                    "suspicious_movement",
                    format!("track {} has an empty position history", track.id),
                )
            })?;

            debug!(
                track_id = %track.id,
                variance = %variance,
                mean_step = %mean,
                "suspicious_movement_detected"
            );
            events.push(AnomalyEvent {
                kind: AnomalyKind::SuspiciousMovement,
                description: "Erratic movement pattern detected".to_string(),
                severity: Severity::Medium,
                start_timestamp: track.first_seen,
                bbox,
                confidence: CONFIDENCE,
                source_id: track.id.as_str().to_string(),
            });
        }

        Ok(events)
    }
}
