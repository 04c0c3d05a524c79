//! IO modules - replay input and event egress
//!
//! This module contains the engine's file interfaces:
//! - `replay` - JSONL detection-frame reader (recorded streams, test stubs)
//! - `egress` - Anomaly event output to file (JSONL format)
//!
//! Video decoding, detector inference, and persistence belong to the host
//! application, not to this crate.

pub mod egress;
pub mod replay;

// Re-export commonly used types
pub use egress::Egress;
pub use replay::{read_frames, FrameReader};
