//! Frame pipeline driver.
//!
//! The source is read on its own thread and frames are handed over a
//! one-slot channel; everything else (gesture core, effector, stop checks)
//! runs on the calling thread.  Stops on end of stream, a frame the source
//! cannot deliver, SIGINT or SIGTERM, or the optional exit timer, even while
//! the source is stalled.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::effector::ActionEffector;
use crate::source::{Frame, FrameError, LandmarkSource};
use crate::state::ToggleState;

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Longest the loop waits on the source before re-checking the stop conditions.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Loop configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Stop after this long (testing / unattended runs).
    pub exit_after: Option<Duration>,
    /// How often to log the status line.
    pub status_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            exit_after: None,
            status_interval: Duration::from_secs(60),
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    FrameUnavailable,
    Signal,
    ExitTimer,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndOfStream => "end of stream",
            Self::FrameUnavailable => "frame unavailable",
            Self::Signal => "quit signal",
            Self::ExitTimer => "exit timer",
        }
    }
}

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
///
/// The first signal asks the loop to stop; the handler then restores the
/// default action so a second one terminates the process outright.
pub fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
    unsafe {
        libc::signal(sig, libc::SIG_DFL);
    }
}

// ── Time axis ──────────────────────────────────────────────

/// Puts every frame on one time axis, chosen by the first frame.
///
/// A stream that starts stamped stays on source time: a later unstamped
/// frame is placed at the last stamp plus the wall time since it arrived.
/// A stream that starts unstamped stays on the loop clock and ignores any
/// stamps that show up later.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FrameClock {
    Unlatched,
    Source { last: f64, seen_at: Instant },
    Loop,
}

impl FrameClock {
    fn now(&mut self, timestamp: Option<f64>, start: Instant) -> f64 {
        match (*self, timestamp) {
            (Self::Unlatched | Self::Source { .. }, Some(ts)) => {
                *self = Self::Source {
                    last: ts,
                    seen_at: Instant::now(),
                };
                ts
            }
            (Self::Source { last, seen_at }, None) => last + seen_at.elapsed().as_secs_f64(),
            (Self::Unlatched, None) => {
                *self = Self::Loop;
                start.elapsed().as_secs_f64()
            }
            (Self::Loop, stamped) => {
                if stamped.is_some() {
                    debug!("Ignoring frame timestamp; stream started on the loop clock");
                }
                start.elapsed().as_secs_f64()
            }
        }
    }
}

// ── Loop ───────────────────────────────────────────────────

type FrameResult = Result<Option<Frame>, FrameError>;

/// Move the source onto a reader thread.
///
/// The thread ends after delivering end of stream or an error, or once the
/// loop has hung up.  The source is dropped there (a detector child is
/// killed on drop).
fn spawn_reader(mut source: Box<dyn LandmarkSource>) -> io::Result<Receiver<FrameResult>> {
    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name(format!("{}-reader", source.name()))
        .spawn(move || loop {
            let result = source.next_frame();
            let last = !matches!(result, Ok(Some(_)));
            if tx.send(result).is_err() || last {
                break;
            }
        })?;
    Ok(rx)
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Run the pipeline until it stops.
///
/// Frame timestamps are placed on one time axis (see `FrameClock`).  A read
/// failure ends the loop; it is not an error for the caller.
pub fn run(
    state: &mut ToggleState,
    source: Box<dyn LandmarkSource>,
    effector: &mut dyn ActionEffector,
    config: &PipelineConfig,
) -> StopReason {
    run_until(state, source, effector, config, &SHUTDOWN_REQUESTED)
}

fn run_until(
    state: &mut ToggleState,
    source: Box<dyn LandmarkSource>,
    effector: &mut dyn ActionEffector,
    config: &PipelineConfig,
    shutdown: &AtomicBool,
) -> StopReason {
    let start_time = Instant::now();
    let mut last_status_log = Instant::now();
    let mut clock = FrameClock::Unlatched;
    let source_name = source.name();

    info!(
        "Pipeline started: source {}, effector {}, thresholds index <= {} middle >= {}, cooldown {}s ({} rearm)",
        source_name,
        effector.name(),
        state.debouncer.config().index_threshold,
        state.debouncer.config().middle_threshold,
        state.debouncer.config().cooldown_secs,
        state.debouncer.config().rearm.as_str(),
    );

    let frames = match spawn_reader(source) {
        Ok(frames) => frames,
        Err(e) => {
            warn!("Could not start reader for {}: {}", source_name, e);
            state.running = false;
            return StopReason::FrameUnavailable;
        }
    };

    let mut acquire_start = Instant::now();
    let reason = loop {
        if !state.running {
            break StopReason::Signal;
        }

        // Check global shutdown flag (set by signal handler)
        if shutdown.load(Ordering::SeqCst) {
            info!("Shutdown signal received, exiting");
            break StopReason::Signal;
        }

        if let Some(dur) = config.exit_after {
            if start_time.elapsed() >= dur {
                info!("Exit timer fired after {:.1}s", dur.as_secs_f64());
                break StopReason::ExitTimer;
            }
        }

        if last_status_log.elapsed() >= config.status_interval {
            info!("Status: {}; {}", state.stats, state.timing.stats());
            last_status_log = Instant::now();
        }

        let frame = match frames.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => {
                info!("Landmark source {} reached end of stream", source_name);
                break StopReason::EndOfStream;
            }
            Ok(Err(e)) => {
                warn!("Landmark source {} failed: {}", source_name, e);
                break StopReason::FrameUnavailable;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Landmark source {} reader stopped unexpectedly", source_name);
                break StopReason::FrameUnavailable;
            }
        };
        let acquire = acquire_start.elapsed();

        // A frame that raced the signal is dropped, not acted on.
        if shutdown.load(Ordering::SeqCst) {
            info!("Shutdown signal received, exiting");
            break StopReason::Signal;
        }

        let process_start = Instant::now();
        let now = clock.now(frame.timestamp, start_time);
        state.process_frame(&frame, now, effector);
        state.timing.record_frame(millis(acquire), millis(process_start.elapsed()));
        acquire_start = Instant::now();
    };

    state.running = false;
    info!(
        "Pipeline stopped ({}): {}; {}; {} effector failure(s)",
        reason.as_str(),
        state.stats,
        state.timing.stats(),
        effector.failures(),
    );
    reason
}
