//! Abandoned-object detection
//!
//! Non-person detections with no person nearby accumulate in a candidate
//! registry keyed by class + center position. A candidate that survives the
//! abandonment threshold is confirmed exactly once; confirmed candidates stay
//! silent until the sweeper expires them.
//!
//! Keying uses the exact detection center by default, faithful to the source
//! system: sub-pixel jitter re-keys the candidate every frame and prevents
//! accumulation. Setting `candidate_cell_size` buckets centers to a grid
//! instead.

use crate::domain::error::EngineError;
use crate::domain::types::{AnomalyEvent, AnomalyKind, Detection, Severity};
use crate::infra::config::Config;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// Confidence attached to abandoned-object events
const CONFIDENCE: f64 = 0.9;

/// Provisional abandoned-object record
#[derive(Debug, Clone)]
struct Candidate {
    first_seen: f64,
    confirmed: bool,
}

pub struct AbandonedObjectDetector {
    /// Candidate registry: spatial-class key to first-seen time
    candidates: FxHashMap<String, Candidate>,
    threshold_secs: f64,
    proximity_px: f64,
    staleness_secs: f64,
    cell_size: f64,
}

impl AbandonedObjectDetector {
    pub fn new(config: &Config) -> Self {
        Self {
            candidates: FxHashMap::default(),
            threshold_secs: config.abandoned_object_secs(),
            proximity_px: config.abandoned_proximity_px(),
            staleness_secs: config.candidate_staleness_secs(),
            cell_size: config.candidate_cell_size(),
        }
    }

    fn key_for(&self, class: &str, cx: f64, cy: f64) -> String {
        if self.cell_size > 0.0 {
            let col = (cx / self.cell_size).floor() as i64;
            let row = (cy / self.cell_size).floor() as i64;
            format!("{}_{}_{}", class, col, row)
        } else {
            format!("{}_{}_{}", class, cx, cy)
        }
    }

    /// Scan the frame's detections for unattended objects
    pub fn scan(
        &mut self,
        detections: &[&Detection],
        timestamp: f64,
    ) -> Result<Vec<AnomalyEvent>, EngineError> {
        let mut events = Vec::new();

        let person_centers: Vec<(f64, f64)> =
            detections.iter().filter(|d| d.is_person()).map(|d| d.center()).collect();

        for detection in detections {
            if detection.is_person() {
                continue;
            }
            let (cx, cy) = detection.center();

            let person_nearby = person_centers.iter().any(|&(px, py)| {
                ((cx - px).powi(2) + (cy - py).powi(2)).sqrt() < self.proximity_px
            });
            if person_nearby {
                continue;
            }

            let key = self.key_for(&detection.class, cx, cy);
            match self.candidates.get_mut(&key) {
                None => {
                    debug!(key = %key, class = %detection.class, "abandoned_candidate_created");
                    self.candidates
                        .insert(key, Candidate { first_seen: timestamp, confirmed: false });
                }
                Some(candidate) => {
                    let unattended_secs = timestamp - candidate.first_seen;
                    if !candidate.confirmed && unattended_secs > self.threshold_secs {
                        info!(
                            key = %key,
                            class = %detection.class,
                            unattended_secs = %unattended_secs,
                            "abandoned_object_confirmed"
                        );
                        events.push(AnomalyEvent {
                            kind: AnomalyKind::AbandonedObject,
                            description: format!(
                                "Abandoned {} detected for {:.1} seconds",
                                detection.class, unattended_secs
                            ),
                            severity: Severity::High,
                            start_timestamp: candidate.first_seen,
                            bbox: detection.bbox,
                            confidence: CONFIDENCE,
                            source_id: key,
                        });
                        candidate.confirmed = true;
                    }
                }
            }
        }

        Ok(events)
    }

    /// Remove candidates older than the staleness window, confirmed or not.
    /// Returns the number removed.
    pub fn sweep(&mut self, timestamp: f64) -> usize {
        let before = self.candidates.len();
        let staleness = self.staleness_secs;
        self.candidates.retain(|key, candidate| {
            if timestamp - candidate.first_seen > staleness {
                debug!(key = %key, confirmed = %candidate.confirmed, "candidate_expired");
                false
            } else {
                true
            }
        });
        before - self.candidates.len()
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::BoundingBox;

    fn object_at(class: &str, x: f64, y: f64) -> Detection {
        Detection {
            class: class.to_string(),
            confidence: 0.85,
            bbox: BoundingBox::centered(x, y, 30.0, 30.0),
        }
    }

    fn scan_one(
        detector: &mut AbandonedObjectDetector,
        detections: &[Detection],
        timestamp: f64,
    ) -> Vec<AnomalyEvent> {
        let refs: Vec<&Detection> = detections.iter().collect();
        detector.scan(&refs, timestamp).unwrap()
    }

    #[test]
    fn test_confirms_once_after_threshold() {
        let mut detector = AbandonedObjectDetector::new(&Config::default());
        let frame = vec![object_at("backpack", 200.0, 200.0)];

        for t in 0..=5 {
            assert!(scan_one(&mut detector, &frame, t as f64).is_empty(), "t={}", t);
        }

        // First frame where t - first_seen > 5.0
        let events = scan_one(&mut detector, &frame, 6.0);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AnomalyKind::AbandonedObject);
        assert_eq!(events[0].severity, Severity::High);
        assert_eq!(events[0].confidence, 0.9);
        assert_eq!(events[0].start_timestamp, 0.0);
        assert_eq!(events[0].description, "Abandoned backpack detected for 6.0 seconds");

        // Confirmed candidates never re-emit
        for t in 7..=20 {
            assert!(scan_one(&mut detector, &frame, t as f64).is_empty(), "t={}", t);
        }
    }

    #[test]
    fn test_person_nearby_suppresses() {
        let mut detector = AbandonedObjectDetector::new(&Config::default());
        let frame = vec![
            object_at("backpack", 200.0, 200.0),
            object_at("person", 300.0, 200.0), // 100px away, inside 150
        ];

        for t in 0..=10 {
            assert!(scan_one(&mut detector, &frame, t as f64).is_empty());
        }
        assert_eq!(detector.candidate_count(), 0);
    }

    #[test]
    fn test_person_beyond_proximity_does_not_suppress() {
        let mut detector = AbandonedObjectDetector::new(&Config::default());
        let frame = vec![
            object_at("backpack", 200.0, 200.0),
            object_at("person", 360.0, 200.0), // 160px away
        ];

        scan_one(&mut detector, &frame, 0.0);
        assert_eq!(detector.candidate_count(), 1);
    }

    #[test]
    fn test_exact_keying_resets_on_jitter() {
        // Default keying is exact: a 1px shift starts a fresh candidate
        let mut detector = AbandonedObjectDetector::new(&Config::default());

        scan_one(&mut detector, &[object_at("backpack", 200.0, 200.0)], 0.0);
        scan_one(&mut detector, &[object_at("backpack", 201.0, 200.0)], 1.0);
        assert_eq!(detector.candidate_count(), 2);

        // Neither key accumulates past the threshold
        let events = scan_one(&mut detector, &[object_at("backpack", 200.0, 200.0)], 6.5);
        assert_eq!(events.len(), 1); // original key did survive from t=0
    }

    #[test]
    fn test_cell_keying_tolerates_jitter() {
        let config = Config::default().with_candidate_cell_size(16.0);
        let mut detector = AbandonedObjectDetector::new(&config);

        scan_one(&mut detector, &[object_at("backpack", 200.0, 200.0)], 0.0);
        scan_one(&mut detector, &[object_at("backpack", 201.0, 200.5)], 1.0);
        assert_eq!(detector.candidate_count(), 1);

        let events = scan_one(&mut detector, &[object_at("backpack", 199.0, 200.0)], 5.5);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_sweep_expires_candidates() {
        let mut detector = AbandonedObjectDetector::new(&Config::default());
        scan_one(&mut detector, &[object_at("backpack", 200.0, 200.0)], 0.0);
        scan_one(&mut detector, &[object_at("backpack", 200.0, 200.0)], 6.0);
        assert_eq!(detector.candidate_count(), 1);

        // Expiry applies regardless of confirmation
        assert_eq!(detector.sweep(60.0), 0);
        assert_eq!(detector.sweep(60.01), 1);
        assert_eq!(detector.candidate_count(), 0);

        // A new candidate at the same key can confirm again
        scan_one(&mut detector, &[object_at("backpack", 200.0, 200.0)], 61.0);
        let events = scan_one(&mut detector, &[object_at("backpack", 200.0, 200.0)], 67.0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_distinct_classes_distinct_candidates() {
        let mut detector = AbandonedObjectDetector::new(&Config::default());
        let frame =
            vec![object_at("backpack", 200.0, 200.0), object_at("suitcase", 200.0, 200.0)];
        scan_one(&mut detector, &frame, 0.0);
        assert_eq!(detector.candidate_count(), 2);
    }
}
