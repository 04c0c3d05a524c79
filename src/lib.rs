//! Behavioral anomaly detection engine
//!
//! Turns a per-frame stream of object detections into loitering,
//! abandoned-object, and erratic-movement events. Exposes modules for
//! integration testing and binary reuse.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
