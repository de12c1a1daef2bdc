//! Per-frame latency instrumentation.
//!
//! Tracks how long each frame spends waiting on the landmark source and
//! how long the gesture core plus effector take, with rolling percentiles
//! for the periodic status line.

use std::collections::VecDeque;
use std::fmt;

/// Rolling frame timing statistics over a window of samples.
#[derive(Debug)]
pub struct FrameTiming {
    /// Per-frame time blocked on the landmark source.
    pub acquire_times: VecDeque<f64>,
    /// Per-frame time in evaluate + decide + fire.
    pub process_times: VecDeque<f64>,
    /// Per-frame total time.
    pub total_times: VecDeque<f64>,
    /// Maximum number of samples to keep.
    pub window_size: usize,
    /// Total frames recorded.
    pub total_frames: u64,
    /// Frames whose total exceeded the budget.
    pub over_budget_frames: u64,
    /// Frame budget in milliseconds (33.3 for a 30 fps camera).
    pub budget_ms: f64,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(1000, 33.3)
    }
}

impl FrameTiming {
    pub fn new(window_size: usize, budget_ms: f64) -> Self {
        Self {
            acquire_times: VecDeque::with_capacity(window_size),
            process_times: VecDeque::with_capacity(window_size),
            total_times: VecDeque::with_capacity(window_size),
            window_size,
            total_frames: 0,
            over_budget_frames: 0,
            budget_ms,
        }
    }

    /// Record one frame's timing data.
    pub fn record_frame(&mut self, acquire_ms: f64, process_ms: f64) {
        let total = acquire_ms + process_ms;

        let window = self.window_size;
        for (samples, value) in [
            (&mut self.acquire_times, acquire_ms),
            (&mut self.process_times, process_ms),
            (&mut self.total_times, total),
        ] {
            samples.push_back(value);
            while samples.len() > window {
                samples.pop_front();
            }
        }

        self.total_frames += 1;
        if total > self.budget_ms {
            self.over_budget_frames += 1;
        }
    }

    /// Nearest-rank value at `pct` percent; 0.0 for an empty window.
    fn percentile(sorted: &[f64], pct: f64) -> f64 {
        let Some(last) = sorted.len().checked_sub(1) else {
            return 0.0;
        };
        let rank = (last as f64 * pct / 100.0).round() as usize;
        sorted[rank.min(last)]
    }

    fn sorted(samples: &VecDeque<f64>) -> Vec<f64> {
        let mut sorted: Vec<f64> = samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        sorted
    }

    pub fn stats(&self) -> FrameTimingStats {
        let acquire = Self::sorted(&self.acquire_times);
        let process = Self::sorted(&self.process_times);
        let total = Self::sorted(&self.total_times);

        let total_p50 = Self::percentile(&total, 50.0);
        FrameTimingStats {
            acquire_p50: Self::percentile(&acquire, 50.0),
            process_p50: Self::percentile(&process, 50.0),
            process_p99: Self::percentile(&process, 99.0),
            total_p50,
            total_p99: Self::percentile(&total, 99.0),
            fps: if total_p50 > 0.0 { 1000.0 / total_p50 } else { 0.0 },
            over_budget_pct: if self.total_frames > 0 {
                (self.over_budget_frames as f64 / self.total_frames as f64) * 100.0
            } else {
                0.0
            },
        }
    }
}

/// Computed frame timing statistics.
#[derive(Debug, Clone)]
pub struct FrameTimingStats {
    pub acquire_p50: f64,
    pub process_p50: f64,
    pub process_p99: f64,
    pub total_p50: f64,
    pub total_p99: f64,
    pub fps: f64,
    pub over_budget_pct: f64,
}

impl fmt::Display for FrameTimingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "acquire p50 {:.1}ms, process p50 {:.2}ms p99 {:.2}ms, total p50 {:.1}ms p99 {:.1}ms, ~{:.0} fps, {:.1}% over budget",
            self.acquire_p50,
            self.process_p50,
            self.process_p99,
            self.total_p50,
            self.total_p99,
            self.fps,
            self.over_budget_pct,
        )
    }
}
