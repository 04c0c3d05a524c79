//! Anomaly detection engine facade
//!
//! One engine instance owns all per-stream state (track store, candidate
//! registry) and is driven strictly sequentially, one call per video frame in
//! increasing timestamp order. Per frame it:
//! - associates detections with tracks and updates movement statistics
//! - runs the loitering, abandoned-object, and suspicious-movement
//!   classifiers, in that order
//! - sweeps stale tracks and candidates after classification, so the frame's
//!   classifiers still see the data
//!
//! A failure inside one classifier is logged and contributes zero events for
//! the frame; the other classifiers and the stream continue.


use crate::domain::error::EngineError;
use crate::domain::types::{AnomalyEvent, AnomalyKind, Detection, Zone};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::services::abandoned::AbandonedObjectDetector;
use crate::services::loitering::LoiteringDetector;
use crate::services::movement::SuspiciousMovementDetector;
use crate::services::store::TrackStore;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Video stream properties supplied at initialization
#[derive(Debug, Clone, Copy)]
pub struct VideoProps {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Per-stream anomaly detection engine
pub struct Engine {
    store: TrackStore,
    loitering: LoiteringDetector,
    abandoned: AbandonedObjectDetector,
    movement: SuspiciousMovementDetector,
    /// Opaque zone configuration; violation detection is not implemented
    restricted_zones: Vec<Zone>,
    monitoring_zones: Vec<Zone>,
    video: Option<VideoProps>,
    last_timestamp: Option<f64>,
    metrics: Arc<Metrics>,
}

impl Engine {
    /// Build an engine from validated configuration.
    /// Invalid thresholds are fatal here, never at frame time.
    pub fn new(config: Config) -> Result<Self, EngineError> {
        Self::with_metrics(config, Arc::new(Metrics::new()))
    }

    /// Build an engine that records into an externally owned metrics handle
    pub fn with_metrics(config: Config, metrics: Arc<Metrics>) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            store: TrackStore::new(&config),
            loitering: LoiteringDetector::new(&config),
            abandoned: AbandonedObjectDetector::new(&config),
            movement: SuspiciousMovementDetector::new(&config),
            restricted_zones: config.restricted_zones().to_vec(),
            monitoring_zones: config.monitoring_zones().to_vec(),
            video: None,
            last_timestamp: None,
            metrics,
        })
    }

    /// Configure spatial parameters before the first frame.
    ///
    /// When no monitoring zones are configured, the default entrance/center/
    /// exit thirds of the frame are installed. Zones are carried as opaque
    /// data only.
    pub fn initialize(&mut self, width: u32, height: u32, fps: f64) {
        self.video = Some(VideoProps { width, height, fps });
        if self.monitoring_zones.is_empty() {
            let (w, h) = (width as f64, height as f64);
            self.monitoring_zones = vec![
                Zone {
                    name: "entrance".to_string(),
                    bbox: crate::domain::types::BoundingBox::new(0.0, 0.0, w / 3.0, h / 3.0),
                },
                Zone {
                    name: "center".to_string(),
                    bbox: crate::domain::types::BoundingBox::new(w / 3.0, h / 3.0, w / 3.0, h / 3.0),
                },
                Zone {
                    name: "exit".to_string(),
                    bbox: crate::domain::types::BoundingBox::new(
                        2.0 * w / 3.0,
                        2.0 * h / 3.0,
                        w / 3.0,
                        h / 3.0,
                    ),
                },
            ];
        }
    }

    /// Process one frame and return its anomaly events.
    ///
    /// Output order is loitering, abandoned-object, suspicious-movement.
    /// An empty result is valid and frequent.
    pub fn detect_anomalies(
        &mut self,
        detections: &[Detection],
        frame_number: u64,
        timestamp: f64,
    ) -> Vec<AnomalyEvent> {
        let frame_start = Instant::now();

        if let Some(last) = self.last_timestamp {
            if timestamp < last {
                warn!(
                    frame_number = %frame_number,
                    timestamp = %timestamp,
                    last_timestamp = %last,
                    "timestamp_regressed"
                );
            }
        }
        self.last_timestamp = Some(timestamp);

        // Drop detections the engine cannot safely process
        let valid: Vec<&Detection> = detections
            .iter()
            .filter(|d| match d.validate() {
                Ok(()) => true,
                Err(error) => {
                    warn!(frame_number = %frame_number, error = %error, "detection_skipped");
                    self.metrics.record_malformed_detection();
                    false
                }
            })
            .collect();

        // Association: every detection ends up on an existing or fresh track
        let mut seen = FxHashSet::default();
        for detection in &valid {
            let assoc = self.store.associate(detection, timestamp);
            if assoc.created {
                self.metrics.record_track_created();
            }
            seen.insert(assoc.track_id);
        }

        // Classifiers are fault-isolated: one failing contributes no events
        let mut anomalies = Vec::new();
        let result = self.loitering.scan(&self.store);
        anomalies.extend(self.guard("loitering", result));
        let result = self.abandoned.scan(&valid, timestamp);
        anomalies.extend(self.guard("abandoned_object", result));
        let result = self.movement.scan(&self.store);
        anomalies.extend(self.guard("suspicious_movement", result));

        for event in &anomalies {
            match event.kind {
                AnomalyKind::Loitering => self.metrics.record_loitering(),
                AnomalyKind::AbandonedObject => self.metrics.record_abandoned_object(),
                AnomalyKind::SuspiciousMovement => self.metrics.record_suspicious_movement(),
            }
        }

        // Sweep after classification so this frame's classifiers saw the data
        let tracks_expired = self.store.sweep(timestamp, &seen);
        if tracks_expired > 0 {
            self.metrics.record_tracks_expired(tracks_expired as u64);
        }
        let candidates_expired = self.abandoned.sweep(timestamp);
        if candidates_expired > 0 {
            self.metrics.record_candidates_expired(candidates_expired as u64);
        }

        let latency_us = frame_start.elapsed().as_micros() as u64;
        self.metrics.record_frame(detections.len() as u64, latency_us);
        debug!(
            frame_number = %frame_number,
            detections = %detections.len(),
            anomalies = %anomalies.len(),
            active_tracks = %self.store.len(),
            "frame_processed"
        );

        anomalies
    }

    /// Fail-soft boundary around one classifier
    fn guard(
        &self,
        classifier: &'static str,
        result: Result<Vec<AnomalyEvent>, EngineError>,
    ) -> Vec<AnomalyEvent> {
        match result {
            Ok(events) => events,
            Err(e) => {
                error!(classifier = %classifier, error = %e, "classifier_failed");
                self.metrics.record_classifier_failure();
                Vec::new()
            }
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn active_tracks(&self) -> usize {
        self.store.len()
    }

    pub fn candidate_count(&self) -> usize {
        self.abandoned.candidate_count()
    }

    pub fn video_props(&self) -> Option<VideoProps> {
        self.video
    }

    pub fn restricted_zones(&self) -> &[Zone] {
        &self.restricted_zones
    }

    pub fn monitoring_zones(&self) -> &[Zone] {
        &self.monitoring_zones
    }
}
