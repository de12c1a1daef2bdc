//! Landmark source abstraction: stdin, replay file, and detector subprocess.
//!
//! Every backend speaks the same JSON Lines wire format (one frame per
//! line), so they differ only in where the bytes come from.

pub mod detector;
pub mod jsonl;

use std::path::PathBuf;

use crate::gesture::landmarks::DetectedHand;

pub use detector::DetectorProcess;
pub use jsonl::JsonLinesSource;

/// One frame's worth of detector output.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Capture time in seconds, if the source stamps frames.
    pub timestamp: Option<f64>,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Detected hands in detection order (empty when none visible).
    pub hands: Vec<DetectedHand>,
}

/// The source could not deliver a frame. Ends the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("landmark source read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame on line {line}: {source}")]
    Parse {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("detector handshake failed: {0}")]
    Handshake(String),

    #[error("frame on line {line} has invalid dimensions {width}x{height}")]
    InvalidDimensions { line: u64, width: u32, height: u32 },
}

/// Anything that yields hand landmarks frame by frame.
///
/// Sources are driven from their own reader thread, hence `Send`.
pub trait LandmarkSource: Send {
    /// Short backend name for logging.
    fn name(&self) -> &'static str;

    /// Block until the next frame is available.
    ///
    /// `Ok(None)` is a clean end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, FrameError>;
}

/// Detection thresholds handed to the external landmark model.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum palm detection confidence (0.0-1.0).
    pub min_detection_confidence: f64,
    /// Minimum landmark tracking confidence (0.0-1.0).
    pub min_tracking_confidence: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.8,
            min_tracking_confidence: 0.5,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("min-detection-confidence", self.min_detection_confidence),
            ("min-tracking-confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{name} must be within 0.0..=1.0, got {value}");
            }
        }
        Ok(())
    }

    /// Command-line arguments forwarded to a detector subprocess.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "--min-detection-confidence".to_string(),
            self.min_detection_confidence.to_string(),
            "--min-tracking-confidence".to_string(),
            self.min_tracking_confidence.to_string(),
        ]
    }
}

/// Source backend selector.
#[derive(Debug, Clone)]
pub enum SourceType {
    /// JSON Lines on standard input.
    Stdin,
    /// A recorded JSON Lines file.
    Replay(PathBuf),
    /// A detector program speaking JSON Lines on its stdout.
    Command { program: String, args: Vec<String> },
}

/// Open the selected landmark source.
pub fn open(
    source: SourceType,
    detector: &DetectorConfig,
) -> anyhow::Result<Box<dyn LandmarkSource>> {
    detector.validate()?;
    match source {
        SourceType::Stdin => Ok(Box::new(JsonLinesSource::stdin())),
        SourceType::Replay(path) => Ok(Box::new(JsonLinesSource::replay(&path)?)),
        SourceType::Command { program, args } => {
            Ok(Box::new(DetectorProcess::spawn(&program, &args, detector)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.min_detection_confidence, 0.8);
        assert_eq!(config.min_tracking_confidence, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_detector_validate_range() {
        let config = DetectorConfig {
            min_detection_confidence: 1.5,
            ..DetectorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min-detection-confidence"));
    }

    #[test]
    fn test_detector_args() {
        let args = DetectorConfig::default().to_args();
        assert_eq!(
            args,
            vec![
                "--min-detection-confidence",
                "0.8",
                "--min-tracking-confidence",
                "0.5"
            ]
        );
    }

    #[test]
    fn test_open_replay_missing_file() {
        let result = open(
            SourceType::Replay(PathBuf::from("/nonexistent/frames.jsonl")),
            &DetectorConfig::default(),
        );
        assert!(result.is_err());
    }
}
