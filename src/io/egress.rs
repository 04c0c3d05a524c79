//! Anomaly egress - writes events to file
//!
//! Events are written in JSONL format (one JSON object per line)
//! to the file specified in config.

use crate::domain::types::AnomalyEvent;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Egress writer for anomaly events
pub struct Egress {
    file_path: String,
}

impl Egress {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "egress_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Write one event to the egress file.
    /// Returns true if successful, false otherwise.
    pub fn write_event(&self, event: &AnomalyEvent) -> bool {
        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                error!(kind = %event.kind.as_str(), error = %e, "event_serialize_failed");
                return false;
            }
        };

        match self.append_line(&json) {
            Ok(()) => {
                info!(
                    kind = %event.kind.as_str(),
                    severity = %event.severity.as_str(),
                    source_id = %event.source_id,
                    "anomaly_egressed"
                );
                true
            }
            Err(e) => {
                error!(kind = %event.kind.as_str(), error = %e, "anomaly_egress_failed");
                false
            }
        }
    }

    /// Append a line to the egress file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "egress_written");

        Ok(())
    }

    /// Write multiple events, returning how many succeeded
    pub fn write_events(&self, events: &[AnomalyEvent]) -> usize {
        events.iter().filter(|e| self.write_event(e)).count()
    }
}
