//! Fingertip distance metrics.

use super::landmarks::{HandSample, Point2D};

/// Thumb-to-fingertip distances for one frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistancePair {
    pub thumb_index: f64,
    pub thumb_middle: f64,
}

impl DistancePair {
    pub fn new(thumb_index: f64, thumb_middle: f64) -> Self {
        Self {
            thumb_index,
            thumb_middle,
        }
    }
}

/// Euclidean distance between two 2D points.
pub fn distance(a: &Point2D, b: &Point2D) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Compute the distance pair for a frame.
///
/// `None` in means no usable hand this frame, and `None` out tells the
/// debouncer to skip the frame.
pub fn evaluate(sample: Option<&HandSample>) -> Option<DistancePair> {
    let sample = sample?;
    Some(DistancePair::new(
        distance(&sample.thumb_tip, &sample.index_tip),
        distance(&sample.thumb_tip, &sample.middle_tip),
    ))
}
