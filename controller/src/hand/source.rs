//! Landmark sources: adapters from an external hand detector to frames.
//!
//! The detector runs out of process and prints one JSON detection result
//! per line:
//!
//! ```text
//! {"hands": [{"landmarks": [{"x": 0.5, "y": 0.8, "z": 0.0}, ...], "score": 0.93}]}
//! ```
//!
//! An empty `hands` list means no hand was seen in that camera frame.
//! Only the first hand is used.

use std::io::BufRead;

use serde::Deserialize;
use tracing::debug;

use super::landmarks::{LandmarkFrame, Point2, JOINT_COUNT};

/// Errors while acquiring a frame.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read detector output: {0}")]
    Io(#[from] std::io::Error),

    #[error("detection result is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("malformed detection result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected 21 landmarks, got {0}")]
    LandmarkCount(usize),

    #[error("detector reported an error: {0}")]
    Detector(String),
}

impl SourceError {
    /// Whether the source itself is broken, as opposed to one bad frame.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// A frame-synchronous producer of landmark frames.
pub trait LandmarkSource {
    /// Next frame.  `Ok(None)` marks the end of the stream; an error is a
    /// failed acquisition for this iteration only.
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, SourceError>;
}

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
    #[serde(default)]
    #[allow(dead_code)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    landmarks: Vec<LandmarkJson>,
    #[serde(default)]
    score: Option<f32>,
}

#[derive(Deserialize, Debug)]
struct DetectionResult {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Reads newline-delimited JSON detection results.
pub struct JsonLinesSource<R> {
    reader: R,
    line: Vec<u8>,
    /// Lines consumed so far, for diagnostics.
    pub line_number: u64,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> LandmarkSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, SourceError> {
        loop {
            self.line.clear();
            // raw bytes, so one undecodable line costs one frame only
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let trimmed = std::str::from_utf8(&self.line)?.trim();
            if trimmed.is_empty() {
                continue;
            }
            return parse_detection(trimmed).map(Some);
        }
    }
}

/// Parse one detection result line into a frame.
pub fn parse_detection(line: &str) -> Result<LandmarkFrame, SourceError> {
    let result: DetectionResult = serde_json::from_str(line)?;
    if let Some(err) = result.error {
        return Err(SourceError::Detector(err));
    }

    let Some(hand) = result.hands.into_iter().next() else {
        return Ok(LandmarkFrame::absent());
    };

    if hand.landmarks.len() != JOINT_COUNT {
        return Err(SourceError::LandmarkCount(hand.landmarks.len()));
    }

    let mut points = [Point2::default(); JOINT_COUNT];
    for (slot, lm) in points.iter_mut().zip(&hand.landmarks) {
        *slot = Point2::new(lm.x, lm.y);
    }
    if let Some(score) = hand.score {
        debug!(score, "hand detected");
    }
    Ok(LandmarkFrame::present(points))
}
