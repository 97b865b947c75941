//! Drive a host from a tokio interval instead of an external frame loop.

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::application::host::{Host, TickReport};

const MIN_FRAME: Duration = Duration::from_millis(1);

/// Tick `host` every `frame` until `until` accepts a tick report.
///
/// Each tick passes the time measured since the previous one, so a late
/// interval shows up as a longer delta rather than extra ticks.
/// Returns the report that satisfied `until`.
pub async fn drive<P>(host: &Host, frame: Duration, mut until: P) -> TickReport
where
    P: FnMut(&TickReport) -> bool,
{
    let mut ticker = interval(frame.max(MIN_FRAME));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately and only fixes the start point.
    let mut last = ticker.tick().await;
    debug!(frame_ms = frame.as_millis() as u64, "Real-time driver started");

    loop {
        let now = ticker.tick().await;
        let report = host.tick(now.duration_since(last));
        last = now;

        for (chain, err) in report.faults() {
            warn!(chain = %chain, error = %err, "Run faulted");
        }
        if until(&report) {
            debug!(frame = report.frame, "Real-time driver stopped");
            return report;
        }
    }
}

/// Tick until nothing is in flight, or until `max_frames` ticks have run.
///
/// Always ticks at least once. Check [`TickReport::is_idle`] on the result to
/// tell the two apart.
pub async fn drive_until_idle(host: &Host, frame: Duration, max_frames: u64) -> TickReport {
    let mut remaining = max_frames.max(1);
    drive(host, frame, |report| {
        remaining -= 1;
        report.is_idle() || remaining == 0
    })
    .await
}
