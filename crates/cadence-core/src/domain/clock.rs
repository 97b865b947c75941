//! Frame clock advanced by the host once per tick.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{FlowError, FlowResult};

/// Frame counter plus scaled and unscaled elapsed time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    /// Number of ticks processed so far
    pub frame: u64,
    /// Elapsed time multiplied by the time scale at each tick
    pub scaled: Duration,
    /// Elapsed wall time, unaffected by the time scale
    pub unscaled: Duration,
    /// Multiplier applied to scaled time; 0 pauses it
    pub time_scale: f64,
}

impl FrameClock {
    /// Create a clock at frame 0 with the given time scale
    pub fn new(time_scale: f64) -> FlowResult<Self> {
        check_time_scale(time_scale)?;
        Ok(Self {
            frame: 0,
            scaled: Duration::ZERO,
            unscaled: Duration::ZERO,
            time_scale,
        })
    }

    /// Advance by one tick of `delta` wall time.
    ///
    /// Both times saturate at `Duration::MAX` instead of overflowing.
    pub fn advance(&mut self, delta: Duration) {
        self.frame = self.frame.saturating_add(1);
        self.unscaled = self.unscaled.saturating_add(delta);
        let scaled = Duration::try_from_secs_f64(delta.as_secs_f64() * self.time_scale)
            .unwrap_or(Duration::MAX);
        self.scaled = self.scaled.saturating_add(scaled);
    }

    /// Current time on the clock a chain reads from
    pub fn now(&self, ignore_time_scale: bool) -> Duration {
        if ignore_time_scale {
            self.unscaled
        } else {
            self.scaled
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            frame: 0,
            scaled: Duration::ZERO,
            unscaled: Duration::ZERO,
            time_scale: 1.0,
        }
    }
}

fn check_time_scale(time_scale: f64) -> FlowResult<()> {
    if time_scale.is_finite() && time_scale >= 0.0 {
        Ok(())
    } else {
        Err(FlowError::Configuration(format!(
            "time scale must be finite and non-negative (got {})",
            time_scale
        )))
    }
}

/// Clock handle shared between a host, its owners and running steps
#[derive(Debug, Clone)]
pub struct SharedClock {
    inner: Arc<Mutex<FrameClock>>,
}

impl SharedClock {
    /// Wrap a clock for sharing
    pub fn new(clock: FrameClock) -> Self {
        Self {
            inner: Arc::new(Mutex::new(clock)),
        }
    }

    /// Advance by one tick and return the new state
    pub fn advance(&self, delta: Duration) -> FrameClock {
        let mut clock = self.inner.lock();
        clock.advance(delta);
        *clock
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> FrameClock {
        *self.inner.lock()
    }

    /// Current time, scaled unless `ignore_time_scale`
    pub fn now(&self, ignore_time_scale: bool) -> Duration {
        self.inner.lock().now(ignore_time_scale)
    }

    /// Current frame number
    pub fn frame(&self) -> u64 {
        self.inner.lock().frame
    }

    /// Change the multiplier applied to future ticks
    pub fn set_time_scale(&self, time_scale: f64) -> FlowResult<()> {
        check_time_scale(time_scale)?;
        self.inner.lock().time_scale = time_scale;
        Ok(())
    }
}
