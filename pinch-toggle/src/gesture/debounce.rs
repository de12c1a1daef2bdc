//! Pinch gesture debouncer.
//!
//! Classifies each frame's distance pair against the pinch thresholds and
//! decides whether the action fires, enforcing a minimum interval between
//! fires.  The only state is the time of the last fire.

use tracing::debug;

use super::geometry::DistancePair;

// ── Config ─────────────────────────────────────────────────

/// How the debouncer becomes ready to fire again after a fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RearmPolicy {
    /// Re-arm once the cooldown has elapsed, even if the pinch is still held.
    #[default]
    Cooldown,
    /// Re-arm once the cooldown has elapsed and the pinch has been let go.
    Release,
}

impl RearmPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cooldown => "cooldown",
            Self::Release => "release",
        }
    }
}

/// Thresholds and timing for the pinch gesture.
#[derive(Debug, Clone)]
pub struct GestureConfig {
    /// Maximum thumb-to-index distance (pixels, inclusive).
    pub index_threshold: f64,
    /// Minimum thumb-to-middle distance (pixels, inclusive).
    pub middle_threshold: f64,
    /// Minimum seconds between two fires (exclusive).
    pub cooldown_secs: f64,
    pub rearm: RearmPolicy,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            index_threshold: 20.0,
            middle_threshold: 80.0,
            cooldown_secs: 1.0,
            rearm: RearmPolicy::Cooldown,
        }
    }
}

/// Rejected gesture configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("cooldown must be a positive number of seconds, got {0}")]
    Cooldown(f64),
    #[error("{name} threshold must be a finite non-negative distance, got {value}")]
    Threshold { name: &'static str, value: f64 },
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cooldown_secs.is_finite() && self.cooldown_secs > 0.0) {
            return Err(ConfigError::Cooldown(self.cooldown_secs));
        }
        for (name, value) in [
            ("index", self.index_threshold),
            ("middle", self.middle_threshold),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Threshold { name, value });
            }
        }
        Ok(())
    }

    /// Whether a distance pair forms the pinch: thumb touching the index
    /// while the middle finger stays away.
    pub fn is_gesture(&self, distances: &DistancePair) -> bool {
        distances.thumb_index <= self.index_threshold
            && distances.thumb_middle >= self.middle_threshold
    }
}

// ── State ──────────────────────────────────────────────────

/// Timing state, alive for the whole session.
#[derive(Debug, Clone, PartialEq)]
pub struct DebounceState {
    /// Timestamp (seconds) of the most recent fire, `None` if never fired.
    pub last_fire_time: Option<f64>,
    pub cooldown_secs: f64,
}

impl DebounceState {
    pub fn new(cooldown_secs: f64) -> Self {
        Self {
            last_fire_time: None,
            cooldown_secs,
        }
    }

    /// Whether more than `cooldown_secs` have passed since the last fire.
    pub fn cooled_down(&self, now: f64) -> bool {
        match self.last_fire_time {
            None => true,
            Some(last) => now - last > self.cooldown_secs,
        }
    }
}

/// Outcome of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No distances this frame (no hand, or an unusable one).
    Skipped,
    /// Hand present, pinch not formed.
    Idle,
    /// Pinch formed but still inside the cooldown window (or not released).
    Suppressed,
    /// Pinch formed and armed: fire the action.
    Fire,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Idle => "idle",
            Self::Suppressed => "suppressed",
            Self::Fire => "fire",
        }
    }
}

/// The debounce state machine.
#[derive(Debug, Clone)]
pub struct Debouncer {
    config: GestureConfig,
    state: DebounceState,
    /// Pinch seen released since the last fire (only consulted under
    /// `RearmPolicy::Release`).
    released: bool,
}

impl Debouncer {
    pub fn new(config: GestureConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = DebounceState::new(config.cooldown_secs);
        Ok(Self {
            config,
            state,
            released: true,
        })
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    /// Process one frame.
    ///
    /// `now` is in seconds on any monotonic clock.  Frames are processed in
    /// call order; a repeated timestamp is treated as a later frame.
    pub fn decide(&mut self, distances: Option<DistancePair>, now: f64) -> Decision {
        let Some(distances) = distances else {
            return Decision::Skipped;
        };

        if !self.config.is_gesture(&distances) {
            self.released = true;
            return Decision::Idle;
        }

        let armed = match self.config.rearm {
            RearmPolicy::Cooldown => true,
            RearmPolicy::Release => self.released,
        };

        if !(armed && self.state.cooled_down(now)) {
            return Decision::Suppressed;
        }

        self.state.last_fire_time = Some(now);
        self.released = false;
        debug!(
            "Pinch fired at {:.3}s (thumb-index {:.2}, thumb-middle {:.2})",
            now, distances.thumb_index, distances.thumb_middle,
        );
        Decision::Fire
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn pinch() -> Option<DistancePair> {
        Some(DistancePair::new(15.0, 100.0))
    }

    fn open() -> Option<DistancePair> {
        Some(DistancePair::new(50.0, 100.0))
    }

    fn debouncer() -> Debouncer {
        Debouncer::new(GestureConfig::default()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = GestureConfig::default();
        assert_eq!(config.index_threshold, 20.0);
        assert_eq!(config.middle_threshold, 80.0);
        assert_eq!(config.cooldown_secs, 1.0);
        assert_eq!(config.rearm, RearmPolicy::Cooldown);
        assert!(debouncer().state().last_fire_time.is_none());
    }

    #[test]
    fn test_threshold_bounds_inclusive() {
        let config = GestureConfig::default();
        assert!(config.is_gesture(&DistancePair::new(20.0, 80.0)));
        assert!(!config.is_gesture(&DistancePair::new(21.0, 80.0)));
        assert!(!config.is_gesture(&DistancePair::new(20.0, 79.999)));
    }

    #[test]
    fn test_boundary_fires() {
        let mut d = debouncer();
        assert_eq!(d.decide(Some(DistancePair::new(20.0, 80.0)), 0.0), Decision::Fire);

        let mut d = debouncer();
        assert_eq!(d.decide(Some(DistancePair::new(21.0, 80.0)), 0.0), Decision::Idle);

        let mut d = debouncer();
        assert_eq!(d.decide(Some(DistancePair::new(20.0, 79.999)), 0.0), Decision::Idle);
    }

    #[test]
    fn test_cooldown_enforced() {
        let mut d = debouncer();
        assert_eq!(d.decide(pinch(), 0.0), Decision::Fire);
        assert_eq!(d.decide(pinch(), 0.5), Decision::Suppressed);
        assert_eq!(d.decide(pinch(), 1.01), Decision::Fire);
    }

    #[test]
    fn test_cooldown_is_exclusive() {
        let mut d = debouncer();
        assert_eq!(d.decide(pinch(), 2.0), Decision::Fire);
        assert_eq!(d.decide(pinch(), 3.0), Decision::Suppressed);
        assert_eq!(d.decide(pinch(), 3.000001), Decision::Fire);
    }

    #[test]
    fn test_fire_records_exact_time() {
        let mut d = debouncer();
        assert_eq!(d.decide(pinch(), 7.25), Decision::Fire);
        assert_eq!(d.state().last_fire_time, Some(7.25));
        assert_eq!(d.decide(pinch(), 8.0), Decision::Suppressed);
        assert_eq!(d.state().last_fire_time, Some(7.25));
    }

    #[test]
    fn test_first_fire_at_time_zero() {
        // "Never fired" must not be confused with a fire at t = 0.
        let mut d = debouncer();
        assert_eq!(d.decide(pinch(), 0.0), Decision::Fire);
    }

    #[test]
    fn test_skip_never_mutates_state() {
        let mut d = debouncer();
        for t in [0.0, 0.5, 10.0] {
            assert_eq!(d.decide(None, t), Decision::Skipped);
        }
        assert!(d.state().last_fire_time.is_none());

        d.decide(pinch(), 11.0);
        let before = d.state().clone();
        assert_eq!(d.decide(None, 20.0), Decision::Skipped);
        assert_eq!(d.state(), &before);
    }

    #[test]
    fn test_idle_leaves_last_fire_time() {
        let mut d = debouncer();
        d.decide(pinch(), 1.0);
        assert_eq!(d.decide(open(), 5.0), Decision::Idle);
        assert_eq!(d.state().last_fire_time, Some(1.0));
    }

    #[test]
    fn test_held_pinch_rearms_by_time() {
        let mut d = debouncer();
        let fires = (0..40)
            .map(|i| d.decide(pinch(), i as f64 * 0.1))
            .filter(|&decision| decision == Decision::Fire)
            .count();
        // Fires at 0.0, ~1.1, ~2.2, ~3.3 while the pinch is never released.
        assert_eq!(fires, 4);
    }

    #[test]
    fn test_release_policy_requires_release() {
        let mut d = Debouncer::new(GestureConfig {
            rearm: RearmPolicy::Release,
            ..GestureConfig::default()
        })
        .unwrap();
        assert_eq!(d.decide(pinch(), 0.0), Decision::Fire);
        assert_eq!(d.decide(pinch(), 5.0), Decision::Suppressed);
        assert_eq!(d.decide(open(), 5.1), Decision::Idle);
        assert_eq!(d.decide(pinch(), 5.2), Decision::Fire);
    }

    #[test]
    fn test_release_policy_still_honours_cooldown() {
        let mut d = Debouncer::new(GestureConfig {
            rearm: RearmPolicy::Release,
            ..GestureConfig::default()
        })
        .unwrap();
        assert_eq!(d.decide(pinch(), 0.0), Decision::Fire);
        assert_eq!(d.decide(open(), 0.2), Decision::Idle);
        assert_eq!(d.decide(pinch(), 0.4), Decision::Suppressed);
        assert_eq!(d.decide(pinch(), 1.5), Decision::Fire);
    }

    #[test]
    fn test_duplicate_timestamps_sequential() {
        let mut d = debouncer();
        let frames = [
            (0.0, DistancePair::new(15.0, 100.0)),
            (0.3, DistancePair::new(15.0, 100.0)),
            (1.2, DistancePair::new(15.0, 100.0)),
            (1.2, DistancePair::new(15.0, 100.0)),
            (1.2, DistancePair::new(50.0, 100.0)),
        ];
        let fired: Vec<f64> = frames
            .iter()
            .filter(|(t, pair)| d.decide(Some(*pair), *t) == Decision::Fire)
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(fired, vec![0.0, 1.2]);
    }

    #[test]
    fn test_validate_rejects_bad_cooldown() {
        for cooldown in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = GestureConfig {
                cooldown_secs: cooldown,
                ..GestureConfig::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Cooldown(_))));
            assert!(Debouncer::new(config).is_err());
        }
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let config = GestureConfig {
            middle_threshold: -5.0,
            ..GestureConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Threshold {
                name: "middle",
                value: -5.0
            })
        );
    }

    #[test]
    fn test_decision_as_str() {
        assert_eq!(Decision::Fire.as_str(), "fire");
        assert_eq!(Decision::Suppressed.as_str(), "suppressed");
        assert_eq!(RearmPolicy::Release.as_str(), "release");
    }
}
