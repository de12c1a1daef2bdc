//! Session state: the single struct holding everything the loop mutates.
//!
//! `ToggleState` owns the debouncer, counters and timing window.  Only the
//! pipeline thread touches it; nothing here is shared or persisted.

use std::fmt;

use tracing::{debug, trace};

use crate::effector::ActionEffector;
use crate::gesture::{
    debounce::{ConfigError, Debouncer, Decision, GestureConfig},
    geometry,
    landmarks::{self, HandSample},
};
use crate::source::Frame;
use crate::timing::FrameTiming;

/// Per-session counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames pulled from the source.
    pub frames: u64,
    /// Frames with at least one detected hand.
    pub frames_with_hand: u64,
    /// Hands present but missing fingertip landmarks.
    pub malformed: u64,
    /// Frames without usable distances.
    pub skipped: u64,
    /// Frames where the pinch was formed (fired or not).
    pub gestures: u64,
    /// Frames that fired the effector.
    pub fires: u64,
    /// Frames where the pinch was held back by the cooldown.
    pub suppressed: u64,
}

impl PipelineStats {
    fn record(&mut self, decision: Decision) {
        match decision {
            Decision::Skipped => self.skipped += 1,
            Decision::Idle => {}
            Decision::Suppressed => {
                self.gestures += 1;
                self.suppressed += 1;
            }
            Decision::Fire => {
                self.gestures += 1;
                self.fires += 1;
            }
        }
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frame(s), {} with hand, {} malformed, {} pinch frame(s), {} fire(s), {} suppressed",
            self.frames,
            self.frames_with_hand,
            self.malformed,
            self.gestures,
            self.fires,
            self.suppressed,
        )
    }
}

/// Central session state.
pub struct ToggleState {
    pub debouncer: Debouncer,
    pub stats: PipelineStats,
    pub timing: FrameTiming,
    /// Cleared to stop the loop after the current frame.
    pub running: bool,
}

impl ToggleState {
    pub fn new(config: GestureConfig, timing: FrameTiming) -> Result<Self, ConfigError> {
        Ok(Self {
            debouncer: Debouncer::new(config)?,
            stats: PipelineStats::default(),
            timing,
            running: true,
        })
    }

    /// Run one frame through the gesture core and fire the effector if the
    /// debouncer says so.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
        now: f64,
        effector: &mut dyn ActionEffector,
    ) -> Decision {
        self.stats.frames += 1;

        let sample = landmarks::select_hand(&frame.hands).and_then(|hand| {
            self.stats.frames_with_hand += 1;
            let sample = HandSample::from_detected(hand, frame.width, frame.height);
            if sample.is_none() {
                self.stats.malformed += 1;
                debug!(
                    "Skipping {} hand with {} landmark(s), missing {}",
                    hand.handedness.as_str(),
                    hand.landmarks.iter().flatten().count(),
                    hand.missing_tip().map_or("none", |lm| lm.as_str()),
                );
            }
            sample
        });

        let distances = geometry::evaluate(sample.as_ref());
        if let Some(d) = &distances {
            trace!(
                "Dist. Thumb-Index: {:.2}  Dist. Thumb-Middle: {:.2}",
                d.thumb_index,
                d.thumb_middle
            );
        }

        let decision = self.debouncer.decide(distances, now);
        self.stats.record(decision);

        if decision == Decision::Fire {
            effector.fire();
        }
        trace!("Frame at {:.3}s: {}", now, decision.as_str());
        decision
    }
}
