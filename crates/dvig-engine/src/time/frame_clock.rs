use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Wall-clock time of the previous iteration.
    pub dt: Duration,

    /// Time since the clock was created.
    pub elapsed: Duration,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

impl FrameTime {
    pub fn dt_secs(&self) -> f32 {
        self.dt.as_secs_f32()
    }
}

/// Monotonic clock for the frame loop.
///
/// The origin is captured on construction; `tick` measures the time between
/// consecutive calls. Deltas are reported unclamped unless a maximum is set,
/// since clamping discards time the fixed-step accumulator would otherwise
/// catch up on.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    last: Instant,
    frame_index: u64,
    dt_max: Option<Duration>,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            origin: now,
            last: now,
            frame_index: 0,
            dt_max: None,
        }
    }

    /// Creates a clock that caps each delta at `dt_max`.
    ///
    /// Useful when a debugger pause should not turn into hundreds of catch-up steps.
    pub fn with_max_dt(dt_max: Duration) -> Self {
        Self {
            dt_max: Some(dt_max),
            ..Self::new()
        }
    }

    /// Time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Number of ticks so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Resets the delta baseline without moving the origin.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the clock and returns the delta since the previous tick.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let mut dt = now.saturating_duration_since(self.last);

        if let Some(max) = self.dt_max {
            dt = dt.min(max);
        }

        self.last = now;

        let ft = FrameTime {
            dt,
            elapsed: now.saturating_duration_since(self.origin),
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
