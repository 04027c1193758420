//! Control session: the frame loop.
//!
//! Pulls frames from a landmark source, runs each through the pipeline,
//! and stops on end of input, on SIGINT/SIGTERM, or when the source
//! breaks.  Every exit path releases the actuators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{error, info, warn};

use crate::hand::LandmarkSource;
use crate::pipeline::Pipeline;
use crate::transport::{DispatchStats, Transport};

/// Global flag set by SIGTERM/SIGINT handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Interval between status lines.
const STATUS_INTERVAL: Duration = Duration::from_secs(60);

/// Install signal handlers for graceful shutdown (SIGTERM, SIGINT).
///
/// The flag is checked between frames, so a blocked read is only left
/// once the next detection result (or end of input) arrives.
pub fn install_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as *const () as libc::sighandler_t);
        libc::signal(libc::SIGINT, signal_handler as *const () as libc::sighandler_t);
    }
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    EndOfInput,
    Signal,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EndOfInput => "end-of-input",
            Self::Signal => "signal",
        }
    }
}

/// Totals for one finished session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub reason: ExitReason,
    pub frames: u64,
    pub absent_frames: u64,
    /// Iterations skipped because no frame could be acquired.
    pub acquisition_failures: u64,
    pub dispatch: DispatchStats,
    pub elapsed: Duration,
    /// Whether the final stop command reached the transport.
    pub stop_delivered: bool,
}

/// Run until end of input or a shutdown signal.
pub fn run<S, T>(pipeline: &mut Pipeline<T>, source: &mut S) -> anyhow::Result<SessionSummary>
where
    S: LandmarkSource,
    T: Transport,
{
    run_until(pipeline, source, &SHUTDOWN_REQUESTED)
}

/// Run until end of input or until `shutdown` is raised.
pub fn run_until<S, T>(
    pipeline: &mut Pipeline<T>,
    source: &mut S,
    shutdown: &AtomicBool,
) -> anyhow::Result<SessionSummary>
where
    S: LandmarkSource,
    T: Transport,
{
    let start_time = Instant::now();
    let mut last_status_log = start_time;
    let mut acquisition_failures = 0u64;

    let reason = loop {
        if shutdown.load(Ordering::SeqCst) {
            info!("Shutdown signal received, stopping");
            break ExitReason::Signal;
        }

        if last_status_log.elapsed() >= STATUS_INTERVAL {
            info!(
                frames = pipeline.frames,
                absent = pipeline.absent_frames,
                skipped = acquisition_failures,
                status = %pipeline.dispatcher().status_sexp(),
                "session status"
            );
            last_status_log = Instant::now();
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Landmark stream ended");
                break ExitReason::EndOfInput;
            }
            Err(e) if e.is_fatal() => {
                error!(error = %e, "landmark source failed");
                if let Err(stop_err) = pipeline.shutdown() {
                    warn!(error = %stop_err, "final stop not delivered");
                }
                return Err(e).context("landmark source failed");
            }
            Err(e) => {
                acquisition_failures += 1;
                warn!(error = %e, "skipping frame");
                continue;
            }
        };

        pipeline.process(&frame, Instant::now());
    };

    // best effort: the dispatcher already logged the failure
    let stop_delivered = pipeline.shutdown().is_ok();

    let summary = SessionSummary {
        reason,
        frames: pipeline.frames,
        absent_frames: pipeline.absent_frames,
        acquisition_failures,
        dispatch: pipeline.dispatcher().stats(),
        elapsed: start_time.elapsed(),
        stop_delivered,
    };
    info!(
        reason = summary.reason.as_str(),
        frames = summary.frames,
        sent = summary.dispatch.sent,
        suppressed = summary.dispatch.suppressed,
        failed = summary.dispatch.failed,
        skipped = summary.acquisition_failures,
        stop_delivered = summary.stop_delivered,
        "Session finished after {:.1}s",
        summary.elapsed.as_secs_f64()
    );
    Ok(summary)
}
