//! Domain models - core types for detections, tracks, and anomaly events
//!
//! This module contains the canonical data types used throughout the engine:
//! - `Detection` / `DetectionFrame` - per-frame detector output
//! - `Track` - persistent identity with bounded position/movement histories
//! - `AnomalyEvent` - the engine's output record
//! - `EngineError` - error taxonomy (malformed input, classifier faults, config)

pub mod error;
pub mod track;
pub mod types;

pub use error::EngineError;
pub use track::Track;
pub use types::{AnomalyEvent, AnomalyKind, BoundingBox, Detection, DetectionFrame, Severity, TrackId};
