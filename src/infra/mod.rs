//! Infrastructure - configuration and metrics
//!
//! This module contains infrastructure concerns:
//! - `config` - Engine configuration (TOML loading, defaults, validation)
//! - `metrics` - Lock-free metrics collection

pub mod config;
pub mod metrics;

pub use config::Config;
pub use metrics::Metrics;
