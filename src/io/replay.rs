//! Detection stream replay - reads JSONL frame records
//!
//! One JSON object per line: `{"frame_number": N, "timestamp": T,
//! "detections": [{"class": "...", "confidence": C, "bbox": [x, y, w, h]}]}`.
//! Blank lines are skipped. Any detector that emits this contract can feed
//! the engine; the reader is how recorded streams are replayed in tests and
//! from the CLI.

use crate::domain::types::DetectionFrame;
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Streaming reader over a JSONL detection file
pub struct FrameReader {
    lines: Lines<BufReader<File>>,
    line_no: usize,
    path: String,
}

impl FrameReader {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open detection stream {}", path.display()))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            path: path.display().to_string(),
        })
    }
}

impl Iterator for FrameReader {
    type Item = anyhow::Result<DetectionFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line_no += 1;
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(e).with_context(|| {
                        format!("Failed to read {} line {}", self.path, self.line_no)
                    }))
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).with_context(|| {
                format!("Malformed frame record at {} line {}", self.path, self.line_no)
            }));
        }
    }
}

/// Read an entire stream into memory; convenience for tests and small files
pub fn read_frames<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<DetectionFrame>> {
    FrameReader::open(path)?.collect()
}
