//! Detector subprocess backend.
//!
//! Runs an external hand-landmark program (camera capture + model), hands
//! it the detection thresholds on its command line, waits for a `READY`
//! line, then reads JSON Lines frames from its stdout.  The child owns the
//! camera; when it exits the stream ends.

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};

use anyhow::Context;
use tracing::{debug, info, warn};

use super::{DetectorConfig, Frame, FrameError, JsonLinesSource, LandmarkSource};

/// Handshake line the detector prints once its model is loaded.
pub const READY_LINE: &str = "READY";

pub struct DetectorProcess {
    child: Child,
    frames: JsonLinesSource<BufReader<ChildStdout>>,
}

impl DetectorProcess {
    /// Spawn `program args… --min-detection-confidence X --min-tracking-confidence Y`
    /// and wait for its handshake.
    pub fn spawn(program: &str, args: &[String], config: &DetectorConfig) -> anyhow::Result<Self> {
        info!("Starting landmark detector: {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .args(config.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to start detector {program}"))?;

        let stdout = child
            .stdout
            .take()
            .context("detector stdout was not captured")?;
        let mut reader = BufReader::new(stdout);

        if let Err(e) = wait_ready(&mut reader) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e.into());
        }
        info!("Landmark detector ready (pid {})", child.id());

        Ok(Self {
            child,
            frames: JsonLinesSource::new(reader, "detector"),
        })
    }
}

/// Read the first line and require it to be the handshake.
fn wait_ready<R: BufRead>(reader: &mut R) -> Result<(), FrameError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(FrameError::Handshake(
            "detector exited before signalling ready".to_string(),
        ));
    }
    if line.trim() != READY_LINE {
        return Err(FrameError::Handshake(format!(
            "expected {READY_LINE:?}, got {:?}",
            line.trim()
        )));
    }
    Ok(())
}

impl LandmarkSource for DetectorProcess {
    fn name(&self) -> &'static str {
        "detector"
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        let frame = self.frames.next_frame()?;
        if frame.is_none() {
            match self.child.try_wait() {
                Ok(Some(status)) => info!("Landmark detector exited: {}", status),
                Ok(None) => debug!("Landmark detector closed stdout"),
                Err(e) => warn!("Could not query detector status: {}", e),
            }
        }
        Ok(frame)
    }
}

impl Drop for DetectorProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            debug!("Stopping landmark detector (pid {})", self.child.id());
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
