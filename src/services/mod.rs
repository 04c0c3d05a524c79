//! Services - tracking and anomaly inference logic
//!
//! This module contains the core engine components:
//! - `engine` - Per-frame orchestration facade
//! - `store` - Track store, detection-to-track association, track sweep
//! - `loitering` - Stationary-person classifier
//! - `abandoned` - Unattended-object classifier and candidate registry
//! - `movement` - Erratic-movement classifier

pub mod abandoned;
pub mod engine;
pub mod loitering;
pub mod movement;
pub mod store;

// Re-export commonly used types
pub use engine::Engine;
pub use store::TrackStore;
