//! JSON Lines frame reader.
//!
//! Wire format, one object per line:
//!
//! ```text
//! {"timestamp": 12.5, "width": 640, "height": 480,
//!  "hands": [{"handedness": "Right", "score": 0.97,
//!             "landmarks": [{"x": 0.51, "y": 0.62, "z": -0.03}, ...]}]}
//! ```
//!
//! `timestamp` is optional; `hands` may be absent, null, or empty.  A
//! broken hand entry never fails the line: it decodes as an empty hand.
//! Blank lines are ignored.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::trace;

use super::{Frame, FrameError, LandmarkSource};
use crate::gesture::landmarks::DetectedHand;

#[derive(Deserialize)]
struct FrameRecord {
    #[serde(default)]
    timestamp: Option<f64>,
    width: u32,
    height: u32,
    #[serde(default)]
    hands: Option<Vec<serde_json::Value>>,
}

/// Reads frames from any buffered reader.
pub struct JsonLinesSource<R> {
    reader: R,
    name: &'static str,
    /// 1-based number of the last line read.
    line: u64,
    buf: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R, name: &'static str) -> Self {
        Self {
            reader,
            name,
            line: 0,
            buf: String::new(),
        }
    }

    fn parse(&self, raw: &str) -> Result<Frame, FrameError> {
        let record: FrameRecord =
            serde_json::from_str(raw).map_err(|source| FrameError::Parse {
                line: self.line,
                source,
            })?;

        if record.width == 0 || record.height == 0 {
            return Err(FrameError::InvalidDimensions {
                line: self.line,
                width: record.width,
                height: record.height,
            });
        }

        Ok(Frame {
            timestamp: record.timestamp,
            width: record.width,
            height: record.height,
            hands: record
                .hands
                .unwrap_or_default()
                .into_iter()
                .map(DetectedHand::from_value)
                .collect(),
        })
    }
}

impl JsonLinesSource<BufReader<io::Stdin>> {
    /// Frames piped into standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()), "stdin")
    }
}

impl JsonLinesSource<BufReader<File>> {
    /// A recorded session.
    pub fn replay(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening replay file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file), "replay"))
    }
}

impl<R: BufRead + Send> LandmarkSource for JsonLinesSource<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let raw = self.buf.trim();
            if raw.is_empty() {
                continue;
            }
            trace!("{} line {}: {} bytes", self.name, self.line, raw.len());
            return self.parse(raw).map(Some);
        }
    }
}
