//! Track store and detection-to-track association
//!
//! Owns the set of live tracks. Each incoming detection is matched to the
//! nearest same-class track within the distance and recency gates, or starts
//! a new track. Matching is O(detections × live_tracks) per frame, which is
//! fine at the tens-of-objects scale this engine targets; a spatial index
//! could replace the scan without changing the contract.

use crate::domain::track::Track;
use crate::domain::types::{Detection, TrackId};
use crate::infra::config::Config;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Result of associating one detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub track_id: TrackId,
    /// True when no eligible track existed and a new one was created
    pub created: bool,
}

/// Live tracks keyed by id, exclusively owned by one engine instance
pub struct TrackStore {
    tracks: FxHashMap<TrackId, Track>,
    max_distance_px: f64,
    max_age_secs: f64,
    movement_threshold_px: f64,
    staleness_secs: f64,
}

impl TrackStore {
    pub fn new(config: &Config) -> Self {
        Self {
            tracks: FxHashMap::default(),
            max_distance_px: config.association_distance_px(),
            max_age_secs: config.association_recency_secs(),
            movement_threshold_px: config.movement_px(),
            staleness_secs: config.track_staleness_secs(),
        }
    }

    /// Match a detection to an existing track or create a new one, then
    /// record the observation (position, step distance, stationary time).
    pub fn associate(&mut self, detection: &Detection, timestamp: f64) -> Association {
        let (cx, cy) = detection.center();

        if let Some(track_id) = self.find_match(detection, cx, cy, timestamp) {
            // Eligible match found: update histories and counters
            let track = self
                .tracks
                .get_mut(&track_id)
                .unwrap_or_else(|| unreachable!("matched id always present"));
            let step = track.observe(cx, cy, timestamp, self.movement_threshold_px);
            debug!(
                track_id = %track_id,
                step = ?step,
                stationary_secs = %track.stationary_time,
                "track_updated"
            );
            return Association { track_id, created: false };
        }

        let track_id = self.fresh_id(&detection.class, timestamp);
        debug!(track_id = %track_id, class = %detection.class, "track_created");
        self.tracks
            .insert(track_id.clone(), Track::new(track_id.clone(), &detection.class, cx, cy, timestamp));
        Association { track_id, created: true }
    }

    /// Nearest same-class track within the distance and recency gates.
    /// Strictly-smaller comparison keeps the first candidate under equal
    /// distances; iteration order decides such ties.
    fn find_match(&self, detection: &Detection, cx: f64, cy: f64, timestamp: f64) -> Option<TrackId> {
        let mut best: Option<(&TrackId, f64)> = None;

        for (id, track) in &self.tracks {
            if track.class_label != detection.class {
                continue;
            }
            let Some(last) = track.last_position() else {
                continue;
            };
            if timestamp - last.timestamp > self.max_age_secs {
                continue;
            }
            let distance = ((cx - last.x).powi(2) + (cy - last.y).powi(2)).sqrt();
            if distance >= self.max_distance_px {
                continue;
            }
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((id, distance)),
            }
        }

        best.map(|(id, _)| id.clone())
    }

    /// Id seeded from class and timestamp; a collision within the same
    /// millisecond gets a sequence suffix so ids stay unique.
    fn fresh_id(&self, class: &str, timestamp: f64) -> TrackId {
        let seed = TrackId::seeded(class, timestamp);
        if !self.tracks.contains_key(&seed) {
            return seed;
        }
        let mut seq = 1;
        loop {
            let candidate = seed.with_seq(seq);
            if !self.tracks.contains_key(&candidate) {
                return candidate;
            }
            seq += 1;
        }
    }

    /// Remove tracks absent from this frame whose last observation is older
    /// than the staleness window. Returns the number removed.
    pub fn sweep(&mut self, timestamp: f64, seen: &FxHashSet<TrackId>) -> usize {
        let before = self.tracks.len();
        let staleness = self.staleness_secs;
        self.tracks.retain(|id, track| {
            if seen.contains(id) || timestamp - track.last_seen <= staleness {
                true
            } else {
                debug!(
                    track_id = %id,
                    last_seen = %track.last_seen,
                    age_secs = %(timestamp - track.last_seen),
                    "track_expired"
                );
                false
            }
        });
        before - self.tracks.len()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn get(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.get(id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::BoundingBox;

    fn detection(class: &str, x: f64, y: f64) -> Detection {
        // Center lands at (x, y)
        Detection {
            class: class.to_string(),
            confidence: 0.9,
            bbox: BoundingBox::centered(x, y, 20.0, 40.0),
        }
    }

    fn store() -> TrackStore {
        TrackStore::new(&Config::default())
    }

    #[test]
    fn test_first_detection_creates_track() {
        let mut store = store();
        let assoc = store.associate(&detection("person", 100.0, 100.0), 0.0);
        assert!(assoc.created);
        assert_eq!(store.len(), 1);
        assert_eq!(assoc.track_id.as_str(), "person_0");
    }

    #[test]
    fn test_nearby_detection_matches() {
        let mut store = store();
        let first = store.associate(&detection("person", 100.0, 100.0), 0.0);
        let second = store.associate(&detection("person", 150.0, 100.0), 0.5);
        assert!(!second.created);
        assert_eq!(second.track_id, first.track_id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_recency_gate_is_inclusive() {
        // Frames exactly 1.0s apart (1 fps) must still associate
        let mut store = store();
        let first = store.associate(&detection("person", 100.0, 100.0), 0.0);
        let second = store.associate(&detection("person", 100.0, 100.0), 1.0);
        assert_eq!(second.track_id, first.track_id);
    }

    #[test]
    fn test_too_far_creates_new_track() {
        let mut store = store();
        store.associate(&detection("person", 100.0, 100.0), 0.0);
        let assoc = store.associate(&detection("person", 250.0, 100.0), 0.5);
        assert!(assoc.created);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_distance_bound_is_exclusive() {
        let mut store = store();
        store.associate(&detection("person", 100.0, 100.0), 0.0);
        // Exactly 100px away is not an eligible match
        let assoc = store.associate(&detection("person", 200.0, 100.0), 0.5);
        assert!(assoc.created);
    }

    #[test]
    fn test_stale_track_not_matched() {
        let mut store = store();
        store.associate(&detection("person", 100.0, 100.0), 0.0);
        let assoc = store.associate(&detection("person", 100.0, 100.0), 1.5);
        assert!(assoc.created);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_class_must_match() {
        let mut store = store();
        store.associate(&detection("person", 100.0, 100.0), 0.0);
        let assoc = store.associate(&detection("backpack", 100.0, 100.0), 0.5);
        assert!(assoc.created);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_nearest_track_wins() {
        let mut store = store();
        // 150px apart, so the second detection starts its own track
        let far = store.associate(&detection("person", 100.0, 100.0), 0.0);
        let near = store.associate(&detection("person", 250.0, 100.0), 0.0);
        assert!(near.created);
        assert_ne!(far.track_id, near.track_id);

        // 80px from `far`, 70px from `near`: both eligible, closer one wins
        let assoc = store.associate(&detection("person", 180.0, 100.0), 0.5);
        assert!(!assoc.created);
        assert_eq!(assoc.track_id, near.track_id);
    }

    #[test]
    fn test_same_timestamp_ids_are_unique() {
        let mut store = store();
        let a = store.associate(&detection("person", 100.0, 100.0), 0.0);
        // Far enough away to start a second track in the same millisecond
        let b = store.associate(&detection("person", 500.0, 100.0), 0.0);
        assert!(b.created);
        assert_ne!(a.track_id, b.track_id);
        assert_eq!(b.track_id.as_str(), "person_0_1");
    }

    #[test]
    fn test_sweep_removes_stale_unseen_tracks() {
        let mut store = store();
        store.associate(&detection("person", 100.0, 100.0), 0.0);
        let kept = store.associate(&detection("person", 500.0, 100.0), 4.0);

        let mut seen = FxHashSet::default();
        seen.insert(kept.track_id.clone());

        // First track is 5.01s stale, second is recent
        let removed = store.sweep(5.01, &seen);
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(&kept.track_id).is_some());
    }

    #[test]
    fn test_sweep_keeps_tracks_within_window() {
        let mut store = store();
        store.associate(&detection("person", 100.0, 100.0), 0.0);
        let removed = store.sweep(5.0, &FxHashSet::default());
        assert_eq!(removed, 0);
        assert_eq!(store.len(), 1);
    }
}
