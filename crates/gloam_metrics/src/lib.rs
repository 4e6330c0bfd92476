//! Gloam Metrics - frame pacing, phase timing and run counters
//!
//! With the `metrics` feature off every type is swapped for a no-op of the
//! same shape, so `World` can time its phases unconditionally and the cost
//! disappears from release builds that don't ask for it.
//!
//! # Usage
//!
//! ```ignore
//! use gloam_metrics::{FrameTimer, SystemProfiler};
//!
//! let mut timer = FrameTimer::new(120);
//! let mut profiler = SystemProfiler::new(60);
//! timer.begin();
//! let moved = profiler.time_system("movement", || run_movement());
//! timer.end();
//! tracing::info!(over_budget = timer.over_budget_frames(), "frame");
//! ```

use std::time::Duration;

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod system_profiler;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use system_profiler::SystemProfiler;

#[cfg(not(feature = "metrics"))]
mod noop;
#[cfg(not(feature = "metrics"))]
pub use noop::{Counter, FrameTimer, RingBuffer, SystemProfiler};

/// Fractional milliseconds, for log fields.
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_api_with_or_without_the_feature() {
        let mut timer = FrameTimer::new(60).with_budget(Duration::from_millis(16));
        timer.begin();
        timer.end();
        timer.record(Duration::from_millis(1));

        let mut profiler = SystemProfiler::new(8);
        assert_eq!(profiler.time_system("phase", || 7), 7);
        profiler.record("phase", Duration::from_millis(1));

        let mut counter = Counter::new();
        counter.increment("spawned", 1);
        assert!(counter.iter().count() <= 1);
    }

    #[test]
    fn millis_formatting() {
        assert!((as_millis_f64(Duration::from_micros(1500)) - 1.5).abs() < 1e-9);
    }
}
