//! Loitering detection
//!
//! A person track whose stationary time has crossed the loitering threshold
//! is reported every qualifying frame; downstream consumers deduplicate by
//! track id if they want a single alert.

use crate::domain::error::EngineError;
use crate::domain::types::{AnomalyEvent, AnomalyKind, Severity, PERSON_CLASS};
use crate::infra::config::Config;
use crate::services::store::TrackStore;
use tracing::debug;

/// Stationary time at which severity is raised from Medium to High
const HIGH_SEVERITY_SECS: f64 = 30.0;

/// Confidence attached to loitering events
const CONFIDENCE: f64 = 0.8;

pub struct LoiteringDetector {
    threshold_secs: f64,
}

impl LoiteringDetector {
    pub fn new(config: &Config) -> Self {
        Self { threshold_secs: config.loitering_secs() }
    }

    /// Scan all person tracks for accumulated stationary time
    pub fn scan(&self, store: &TrackStore) -> Result<Vec<AnomalyEvent>, EngineError> {
        let mut events = Vec::new();

        for track in store.tracks() {
            if track.class_label != PERSON_CLASS || track.stationary_time <= self.threshold_secs {
                continue;
            }
            let bbox = track.marker_bbox().ok_or_else(|| {
                EngineError::classifier(
                    "loitering",
                    format!("track {} has an empty position history", track.id),
                )
            })?;

            let severity = if track.stationary_time < HIGH_SEVERITY_SECS {
                Severity::Medium
            } else {
                Severity::High
            };
            debug!(
                track_id = %track.id,
                stationary_secs = %track.stationary_time,
                severity = %severity.as_str(),
                "loitering_detected"
            );
            events.push(AnomalyEvent {
                kind: AnomalyKind::Loitering,
                description: format!(
                    "Person loitering for {:.1} seconds",
                    track.stationary_time
                ),
                severity,
                start_timestamp: track.first_seen,
                bbox,
                confidence: CONFIDENCE,
                source_id: track.id.as_str().to_string(),
            });
        }

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{BoundingBox, Detection};

    fn person_at(x: f64, y: f64) -> Detection {
        Detection {
            class: "person".to_string(),
            confidence: 0.9,
            bbox: BoundingBox::centered(x, y, 20.0, 40.0),
        }
    }

    fn stationary_store(frames: u32) -> TrackStore {
        let mut store = TrackStore::new(&Config::default());
        for i in 0..frames {
            store.associate(&person_at(100.0, 100.0), i as f64 * 0.5);
        }
        store
    }

    #[test]
    fn test_below_threshold_no_event() {
        // 20 frames at 0.5s spacing: 9.5s stationary
        let store = stationary_store(20);
        let detector = LoiteringDetector::new(&Config::default());
        assert!(detector.scan(&store).unwrap().is_empty());
    }

    #[test]
    fn test_threshold_is_strict() {
        // 21 frames: exactly 10.0s stationary, still not loitering
        let store = stationary_store(21);
        let detector = LoiteringDetector::new(&Config::default());
        assert!(detector.scan(&store).unwrap().is_empty());
    }

    #[test]
    fn test_medium_severity_above_threshold() {
        // 22 frames: 10.5s stationary
        let store = stationary_store(22);
        let detector = LoiteringDetector::new(&Config::default());
        let events = detector.scan(&store).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AnomalyKind::Loitering);
        assert_eq!(events[0].severity, Severity::Medium);
        assert_eq!(events[0].confidence, 0.8);
        assert_eq!(events[0].start_timestamp, 0.0);
        assert_eq!(events[0].description, "Person loitering for 10.5 seconds");
    }

    #[test]
    fn test_high_severity_at_thirty_seconds() {
        // 61 frames: exactly 30.0s stationary flips to High
        let store = stationary_store(61);
        let detector = LoiteringDetector::new(&Config::default());
        let events = detector.scan(&store).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::High);
    }

    #[test]
    fn test_non_person_never_loiters() {
        let mut store = TrackStore::new(&Config::default());
        for i in 0..40 {
            let det = Detection {
                class: "backpack".to_string(),
                confidence: 0.9,
                bbox: BoundingBox::centered(100.0, 100.0, 30.0, 30.0),
            };
            store.associate(&det, i as f64 * 0.5);
        }
        let detector = LoiteringDetector::new(&Config::default());
        assert!(detector.scan(&store).unwrap().is_empty());
    }

    #[test]
    fn test_bbox_synthesized_around_last_position() {
        let store = stationary_store(25);
        let detector = LoiteringDetector::new(&Config::default());
        let events = detector.scan(&store).unwrap();
        let bbox = events[0].bbox;
        assert_eq!((bbox.x, bbox.y), (75.0, 75.0));
        assert_eq!((bbox.width, bbox.height), (50.0, 50.0));
    }
}
