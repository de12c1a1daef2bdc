//! Hand landmark topology and per-frame hand samples.
//!
//! Models the 21-point hand topology emitted by palm/landmark detectors.
//! Only the thumb, index and middle fingertips feed the gesture core.

use serde::{Deserialize, Deserializer};
use tracing::{debug, trace};

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in detector output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    LittleMcp,
    LittlePip,
    LittleDip,
    LittleTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Convert landmark enum to detector index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::LittleMcp => "little-mcp",
            Self::LittlePip => "little-pip",
            Self::LittleDip => "little-dip",
            Self::LittleTip => "little-tip",
        }
    }
}

// ── Handedness ─────────────────────────────────────────────

/// Which hand the detector believes it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Handedness {
    /// Parse the detector's label ("Left", "right", ...).
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Unknown => "unknown",
        }
    }
}

impl<'de> Deserialize<'de> for Handedness {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map_or(Self::Unknown, Self::parse))
    }
}

// ── Detector output ────────────────────────────────────────

/// One landmark in normalized image space, as the detector reports it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct NormalizedLandmark {
    /// 0.0 = left edge, 1.0 = right edge.
    pub x: f64,
    /// 0.0 = top edge, 1.0 = bottom edge.
    pub y: f64,
}

/// One hand exactly as delivered by the landmark source.
///
/// Nothing guarantees `landmarks` is complete: a point the detector left
/// out or garbled is `None`, and the list may stop short of 21 entries.
/// See [`HandSample::from_detected`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct DetectedHand {
    #[serde(default)]
    pub handedness: Handedness,
    /// Detector confidence (0.0-1.0).
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "lenient_landmarks")]
    pub landmarks: Vec<Option<NormalizedLandmark>>,
}

impl DetectedHand {
    pub fn landmark(&self, landmark: HandLandmark) -> Option<&NormalizedLandmark> {
        self.landmarks.get(landmark.index())?.as_ref()
    }

    /// First of the three fingertips the gesture core needs that is absent.
    pub fn missing_tip(&self) -> Option<HandLandmark> {
        [
            HandLandmark::ThumbTip,
            HandLandmark::IndexTip,
            HandLandmark::MiddleTip,
        ]
        .into_iter()
        .find(|&tip| self.landmark(tip).is_none())
    }

    /// Decode one entry of a frame's `hands` array.
    ///
    /// An entry that is not a hand at all (wrong type, bad field) becomes an
    /// empty hand, which the gesture core then skips as malformed.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            debug!("Undecodable hand treated as empty: {}", e);
            Self::default()
        })
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A landmark that fails to decode leaves a gap instead of failing the hand.
fn lenient_landmarks<'de, D>(deserializer: D) -> Result<Vec<Option<NormalizedLandmark>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|value| serde_json::from_value(value).ok())
        .collect())
}

/// Pick the hand the gesture core tracks: the first in detection order.
pub fn select_hand(hands: &[DetectedHand]) -> Option<&DetectedHand> {
    let hand = hands.first()?;
    if hands.len() > 1 {
        debug!("{} hands detected, tracking the first", hands.len());
    }
    trace!(
        "Tracking {} hand (score {:.2}, {}/{} landmarks)",
        hand.handedness.as_str(),
        hand.score,
        hand.landmarks.iter().flatten().count(),
        LANDMARK_COUNT,
    );
    Some(hand)
}

// ── Pixel-space sample ─────────────────────────────────────

/// A point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The three fingertips the gesture core consumes, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandSample {
    pub thumb_tip: Point2D,
    pub index_tip: Point2D,
    pub middle_tip: Point2D,
}

impl HandSample {
    /// Project a detected hand onto a `width` x `height` frame.
    ///
    /// Coordinates are truncated to whole pixels. Returns `None` when any
    /// of the three tips is missing from the detector output. Gaps in the
    /// other 18 points do not matter.
    pub fn from_detected(hand: &DetectedHand, width: u32, height: u32) -> Option<Self> {
        let project = |landmark: HandLandmark| {
            hand.landmark(landmark)
                .map(|lm| to_pixel(lm, width, height))
        };

        let sample = Self {
            thumb_tip: project(HandLandmark::ThumbTip)?,
            index_tip: project(HandLandmark::IndexTip)?,
            middle_tip: project(HandLandmark::MiddleTip)?,
        };
        Some(sample)
    }
}

/// Scale a normalized landmark to a whole-pixel position.
fn to_pixel(lm: &NormalizedLandmark, width: u32, height: u32) -> Point2D {
    Point2D::new(
        (lm.x * f64::from(width)).trunc(),
        (lm.y * f64::from(height)).trunc(),
    )
}

// ── Test helpers ───────────────────────────────────────────

/// Build a complete 21-point hand with every landmark at (x, y).
#[cfg(test)]
pub(crate) fn test_hand(x: f64, y: f64) -> DetectedHand {
    DetectedHand {
        handedness: Handedness::Right,
        score: 0.95,
        landmarks: vec![Some(NormalizedLandmark { x, y }); LANDMARK_COUNT],
    }
}

#[cfg(test)]
pub(crate) fn set_landmark(hand: &mut DetectedHand, landmark: HandLandmark, x: f64, y: f64) {
    hand.landmarks[landmark.index()] = Some(NormalizedLandmark { x, y });
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_indices() {
        assert_eq!(HandLandmark::Wrist.index(), 0);
        assert_eq!(HandLandmark::ThumbTip.index(), 4);
        assert_eq!(HandLandmark::IndexTip.index(), 8);
        assert_eq!(HandLandmark::MiddleTip.index(), 12);
        assert_eq!(HandLandmark::LittleTip.index(), 20);
        assert_eq!(LANDMARK_COUNT, 21);
    }

    #[test]
    fn test_landmark_as_str() {
        assert_eq!(HandLandmark::ThumbTip.as_str(), "thumb-tip");
        assert_eq!(HandLandmark::MiddleTip.as_str(), "middle-tip");
    }

    #[test]
    fn test_handedness_parse() {
        assert_eq!(Handedness::parse("Left"), Handedness::Left);
        assert_eq!(Handedness::parse("RIGHT"), Handedness::Right);
        assert_eq!(Handedness::parse("ambidextrous"), Handedness::Unknown);
    }

    #[test]
    fn test_project_truncates_to_pixels() {
        let mut hand = test_hand(0.0, 0.0);
        set_landmark(&mut hand, HandLandmark::ThumbTip, 0.5, 0.25);
        set_landmark(&mut hand, HandLandmark::IndexTip, 0.1234, 0.9999);
        set_landmark(&mut hand, HandLandmark::MiddleTip, 1.0, 1.0);

        let sample = HandSample::from_detected(&hand, 640, 480).unwrap();
        assert_eq!(sample.thumb_tip, Point2D::new(320.0, 120.0));
        // 0.1234 * 640 = 78.976, 0.9999 * 480 = 479.952
        assert_eq!(sample.index_tip, Point2D::new(78.0, 479.0));
        assert_eq!(sample.middle_tip, Point2D::new(640.0, 480.0));
    }

    #[test]
    fn test_project_truncates_toward_zero_off_frame() {
        let mut hand = test_hand(0.0, 0.0);
        set_landmark(&mut hand, HandLandmark::ThumbTip, -0.0015, 0.5);
        let sample = HandSample::from_detected(&hand, 1000, 100).unwrap();
        // -1.5 truncates to -1, not -2
        assert_eq!(sample.thumb_tip.x, -1.0);
    }

    #[test]
    fn test_malformed_hand_yields_none() {
        let mut hand = test_hand(0.5, 0.5);
        hand.landmarks.truncate(HandLandmark::MiddleTip.index());
        assert!(HandSample::from_detected(&hand, 640, 480).is_none());

        let empty = DetectedHand::default();
        assert!(HandSample::from_detected(&empty, 640, 480).is_none());
    }

    #[test]
    fn test_partial_hand_with_tips_is_usable() {
        // Only 13 points: enough to reach the middle tip.
        let mut hand = test_hand(0.5, 0.5);
        hand.landmarks.truncate(HandLandmark::MiddleTip.index() + 1);
        assert!(HandSample::from_detected(&hand, 640, 480).is_some());
    }

    #[test]
    fn test_select_first_hand() {
        let first = test_hand(0.1, 0.1);
        let second = test_hand(0.9, 0.9);
        let hands = vec![first.clone(), second];
        assert_eq!(select_hand(&hands), Some(&first));
        assert!(select_hand(&[]).is_none());
    }

    #[test]
    fn test_deserialize_hand() {
        let json = r#"{"handedness":"Left","score":0.91,"landmarks":[{"x":0.1,"y":0.2,"z":-0.01},{"x":0.3,"y":0.4}]}"#;
        let hand: DetectedHand = serde_json::from_str(json).unwrap();
        assert_eq!(hand.handedness, Handedness::Left);
        assert!((hand.score - 0.91).abs() < f64::EPSILON);
        assert_eq!(hand.landmarks.len(), 2);
        assert_eq!(hand.landmarks[0], Some(NormalizedLandmark { x: 0.1, y: 0.2 }));
    }

    #[test]
    fn test_deserialize_tolerates_nulls_and_bad_points() {
        let json = r#"{"handedness":null,"score":null,"landmarks":[{"x":0.1},null,"junk",{"x":0.3,"y":0.4}]}"#;
        let hand: DetectedHand = serde_json::from_str(json).unwrap();
        assert_eq!(hand.handedness, Handedness::Unknown);
        assert_eq!(hand.score, 0.0);
        assert_eq!(
            hand.landmarks,
            vec![None, None, None, Some(NormalizedLandmark { x: 0.3, y: 0.4 })]
        );

        let hand: DetectedHand = serde_json::from_str(r#"{"landmarks":null}"#).unwrap();
        assert!(hand.landmarks.is_empty());
        assert_eq!(hand.missing_tip(), Some(HandLandmark::ThumbTip));
    }

    #[test]
    fn test_from_value_falls_back_to_empty_hand() {
        let hand = DetectedHand::from_value(serde_json::json!(42));
        assert_eq!(hand, DetectedHand::default());
        let hand = DetectedHand::from_value(serde_json::json!({"score": "high"}));
        assert!(hand.landmarks.is_empty());
    }

    #[test]
    fn test_gap_outside_tips_keeps_hand_usable() {
        let mut hand = test_hand(0.5, 0.5);
        hand.landmarks[HandLandmark::LittleMcp.index()] = None;
        assert_eq!(hand.missing_tip(), None);
        assert!(HandSample::from_detected(&hand, 640, 480).is_some());

        hand.landmarks[HandLandmark::IndexTip.index()] = None;
        assert_eq!(hand.missing_tip(), Some(HandLandmark::IndexTip));
        assert!(HandSample::from_detected(&hand, 640, 480).is_none());
    }
}
