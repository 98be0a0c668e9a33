use std::time::Duration;

/// Deterministic frame metadata for the render loop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (seconds).
    pub dt_s: f64,
    /// Loop time at the start of the frame (seconds).
    pub time_s: f64,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time_s: index as f64 * dt_s,
        }
    }

    /// First frame of a loop running at `rate` frames per second.
    pub fn at_rate(rate: u32) -> Self {
        Self::new(0, 1.0 / f64::from(rate.max(1)))
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.dt_s.max(0.0))
    }
}
