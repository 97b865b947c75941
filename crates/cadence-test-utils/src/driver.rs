//! Manual frame driver for deterministic tests.

use cadence_core::{Host, TickReport};
use std::time::Duration;

/// Ticks a host by a fixed frame length on demand
#[derive(Debug, Clone)]
pub struct FrameDriver {
    host: Host,
    frame: Duration,
}

impl FrameDriver {
    /// Drive `host` in steps of `frame`
    pub fn new(host: Host, frame: Duration) -> Self {
        Self { host, frame }
    }

    /// Drive a default host at 60 frames per second
    pub fn sixty_fps() -> Self {
        Self::new(Host::new(), Duration::from_micros(16_667))
    }

    /// The driven host
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Frame length
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Advance one frame
    pub fn tick(&self) -> TickReport {
        self.host.tick(self.frame)
    }

    /// Advance `frames` frames and return every report
    pub fn ticks(&self, frames: usize) -> Vec<TickReport> {
        (0..frames).map(|_| self.tick()).collect()
    }

    /// Tick until `done` holds, at most `max_frames` times.
    ///
    /// Returns the number of ticks taken, or `None` if `done` never held.
    pub fn run_until<P>(&self, max_frames: usize, mut done: P) -> Option<usize>
    where
        P: FnMut(&TickReport) -> bool,
    {
        (1..=max_frames).find(|_| {
            let report = self.tick();
            done(&report)
        })
    }

    /// Tick until nothing is in flight; `None` if that takes more than `max_frames`
    pub fn run_until_idle(&self, max_frames: usize) -> Option<usize> {
        if self.host.in_flight() == 0 {
            return Some(0);
        }
        self.run_until(max_frames, TickReport::is_idle)
    }
}
