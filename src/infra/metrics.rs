//! Lock-free metrics collection
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Engine counters, safe to share behind an `Arc`
#[derive(Debug, Default)]
pub struct Metrics {
    frames_processed: AtomicU64,
    detections_seen: AtomicU64,
    detections_malformed: AtomicU64,
    tracks_created: AtomicU64,
    tracks_expired: AtomicU64,
    candidates_expired: AtomicU64,
    loitering_events: AtomicU64,
    abandoned_events: AtomicU64,
    suspicious_movement_events: AtomicU64,
    classifier_failures: AtomicU64,
    max_frame_latency_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self, detections: u64, latency_us: u64) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
        self.detections_seen.fetch_add(detections, Ordering::Relaxed);
        update_atomic_max(&self.max_frame_latency_us, latency_us);
    }

    pub fn record_malformed_detection(&self) {
        self.detections_malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_track_created(&self) {
        self.tracks_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tracks_expired(&self, count: u64) {
        self.tracks_expired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_candidates_expired(&self, count: u64) {
        self.candidates_expired.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_loitering(&self) {
        self.loitering_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned_object(&self) {
        self.abandoned_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_suspicious_movement(&self) {
        self.suspicious_movement_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classifier_failure(&self) {
        self.classifier_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn tracks_created(&self) -> u64 {
        self.tracks_created.load(Ordering::Relaxed)
    }

    pub fn anomalies_total(&self) -> u64 {
        self.loitering_events.load(Ordering::Relaxed)
            + self.abandoned_events.load(Ordering::Relaxed)
            + self.suspicious_movement_events.load(Ordering::Relaxed)
    }

    /// Log a summary of all counters
    pub fn report(&self) {
        info!(
            frames = %self.frames_processed.load(Ordering::Relaxed),
            detections = %self.detections_seen.load(Ordering::Relaxed),
            malformed = %self.detections_malformed.load(Ordering::Relaxed),
            tracks_created = %self.tracks_created.load(Ordering::Relaxed),
            tracks_expired = %self.tracks_expired.load(Ordering::Relaxed),
            candidates_expired = %self.candidates_expired.load(Ordering::Relaxed),
            loitering = %self.loitering_events.load(Ordering::Relaxed),
            abandoned = %self.abandoned_events.load(Ordering::Relaxed),
            suspicious_movement = %self.suspicious_movement_events.load(Ordering::Relaxed),
            classifier_failures = %self.classifier_failures.load(Ordering::Relaxed),
            max_frame_latency_us = %self.max_frame_latency_us.load(Ordering::Relaxed),
            "metrics_report"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_and_anomaly_counters() {
        let metrics = Metrics::new();
        metrics.record_frame(3, 120);
        metrics.record_frame(1, 80);
        metrics.record_loitering();
        metrics.record_abandoned_object();
        metrics.record_suspicious_movement();

        assert_eq!(metrics.frames_processed(), 2);
        assert_eq!(metrics.anomalies_total(), 3);
    }

    #[test]
    fn test_max_latency_keeps_maximum() {
        let metrics = Metrics::new();
        metrics.record_frame(0, 500);
        metrics.record_frame(0, 200);
        assert_eq!(metrics.max_frame_latency_us.load(Ordering::Relaxed), 500);
    }
}
