//! Frame pacing measured against the simulation tick budget

use std::time::{Duration, Instant};

use super::ring_buffer::RingBuffer;

pub struct FrameTimer {
    started: Option<Instant>,
    samples: RingBuffer<Duration>,
    budget: Duration,
    frames: u64,
    over_budget: u64,
}

impl FrameTimer {
    /// Rolling window of `window` frames with a 60 Hz budget.
    pub fn new(window: usize) -> Self {
        Self {
            started: None,
            samples: RingBuffer::new(window),
            budget: Duration::from_secs_f64(1.0 / 60.0),
            frames: 0,
            over_budget: 0,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn begin(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Close the frame opened by `begin`. Without one, nothing is recorded.
    pub fn end(&mut self) -> Duration {
        let Some(started) = self.started.take() else {
            return Duration::ZERO;
        };
        let elapsed = started.elapsed();
        self.record(elapsed);
        elapsed
    }

    /// Feed a frame time measured elsewhere.
    pub fn record(&mut self, elapsed: Duration) {
        self.samples.push(elapsed);
        self.frames += 1;
        if elapsed > self.budget {
            self.over_budget += 1;
        }
    }

    pub fn fps(&self) -> f64 {
        let seconds = self.samples.average().as_secs_f64();
        if seconds > 0.0 { seconds.recip() } else { 0.0 }
    }

    pub fn frame_time_ms(&self) -> f64 {
        crate::as_millis_f64(self.samples.average())
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        let (fastest, slowest) = self.samples.min_max();
        (crate::as_millis_f64(fastest), crate::as_millis_f64(slowest))
    }

    /// Frames recorded since creation, not just those in the window.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn over_budget_frames(&self) -> u64 {
        self.over_budget
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_frames_over_budget() {
        let mut timer = FrameTimer::new(4).with_budget(Duration::from_millis(10));
        timer.record(Duration::from_millis(5));
        timer.record(Duration::from_millis(15));
        timer.record(Duration::from_millis(10));

        assert_eq!(timer.frames(), 3);
        assert_eq!(timer.over_budget_frames(), 1);
        assert!((timer.frame_time_ms() - 10.0).abs() < 1e-6);
        assert!((timer.fps() - 100.0).abs() < 1e-3);
        let (fastest, slowest) = timer.frame_time_range_ms();
        assert!((fastest - 5.0).abs() < 1e-6);
        assert!((slowest - 15.0).abs() < 1e-6);
    }

    #[test]
    fn end_without_begin_records_nothing() {
        let mut timer = FrameTimer::new(4);
        assert_eq!(timer.end(), Duration::ZERO);
        assert_eq!(timer.frames(), 0);
        assert_eq!(timer.fps(), 0.0);

        timer.begin();
        timer.end();
        assert_eq!(timer.frames(), 1);
    }
}
