use std::time::Instant;

/// Source of frame timestamps, in seconds
pub trait FrameClock {
    fn now(&mut self) -> f64;
}

/// Monotonic wall clock measured from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn now(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Deterministic clock that advances a fixed step on every read
#[derive(Debug, Clone, Copy)]
pub struct ManualClock {
    current: f64,
    step: f64,
}

impl ManualClock {
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            current: start,
            step,
        }
    }

    /// Clock ticking at `fps` frames per second, starting at zero
    pub fn at_fps(fps: u32) -> Self {
        Self::new(0.0, 1.0 / f64::from(fps.max(1)))
    }

    pub fn peek(&self) -> f64 {
        self.current
    }
}

impl FrameClock for ManualClock {
    fn now(&mut self) -> f64 {
        self.current += self.step;
        self.current
    }
}
