//! Track model - position and movement state for one tracked object
//!
//! Both histories are FIFO rings: positions bound memory and limit the
//! statistics to recent behavior, step distances feed the variance-based
//! erratic-movement check.

use crate::domain::types::{BoundingBox, TrackId};
use std::collections::VecDeque;

/// Retained position samples per track
pub const POSITION_HISTORY_CAP: usize = 30;

/// Retained step distances per track
pub const MOVEMENT_HISTORY_CAP: usize = 10;

/// Side length of the synthesized box reported for track-based anomalies.
/// The engine keeps centers only, not original detection boxes.
const MARKER_BOX_SIZE: f64 = 50.0;

/// One observed center position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub x: f64,
    pub y: f64,
    pub timestamp: f64,
}

/// Persistent identity for one physically-tracked object
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub class_label: String,
    /// Last N center positions, oldest evicted first
    pub position_history: VecDeque<PositionSample>,
    /// Last N step distances between consecutive positions
    pub movement_history: VecDeque<f64>,
    pub first_seen: f64,
    pub last_seen: f64,
    /// Accumulated seconds of sub-threshold displacement; resets on movement
    pub stationary_time: f64,
}

impl Track {
    /// Create a track from its first observation
    pub fn new(id: TrackId, class_label: &str, x: f64, y: f64, timestamp: f64) -> Self {
        let mut position_history = VecDeque::with_capacity(POSITION_HISTORY_CAP);
        position_history.push_back(PositionSample { x, y, timestamp });
        Self {
            id,
            class_label: class_label.to_string(),
            position_history,
            movement_history: VecDeque::with_capacity(MOVEMENT_HISTORY_CAP),
            first_seen: timestamp,
            last_seen: timestamp,
            stationary_time: 0.0,
        }
    }

    /// Record a matched observation and update movement statistics.
    ///
    /// Appends the position (evicting beyond capacity), then derives the step
    /// distance from the previous sample: a step below `movement_threshold`
    /// accumulates the inter-sample delta into `stationary_time`, a step at or
    /// above it resets the counter. Returns the step distance when one exists.
    pub fn observe(
        &mut self,
        x: f64,
        y: f64,
        timestamp: f64,
        movement_threshold: f64,
    ) -> Option<f64> {
        let prev = self.position_history.back().copied();

        if self.position_history.len() == POSITION_HISTORY_CAP {
            self.position_history.pop_front();
        }
        self.position_history.push_back(PositionSample { x, y, timestamp });
        self.last_seen = timestamp;

        let prev = prev?;
        let step = ((x - prev.x).powi(2) + (y - prev.y).powi(2)).sqrt();

        if self.movement_history.len() == MOVEMENT_HISTORY_CAP {
            self.movement_history.pop_front();
        }
        self.movement_history.push_back(step);

        if step < movement_threshold {
            self.stationary_time += timestamp - prev.timestamp;
        } else {
            self.stationary_time = 0.0;
        }

        Some(step)
    }

    /// Most recent position, if the track has ever been observed
    pub fn last_position(&self) -> Option<PositionSample> {
        self.position_history.back().copied()
    }

    /// Fixed-size box centered on the last known position
    pub fn marker_bbox(&self) -> Option<BoundingBox> {
        self.last_position()
            .map(|p| BoundingBox::centered(p.x, p.y, MARKER_BOX_SIZE, MARKER_BOX_SIZE))
    }
}
