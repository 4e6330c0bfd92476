//! Per-phase timing with a rolling window

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::ring_buffer::RingBuffer;

pub struct SystemProfiler {
    window: usize,
    timings: HashMap<&'static str, RingBuffer<Duration>>,
    /// Phase names in first-seen order, for stable reports.
    order: Vec<&'static str>,
}

impl SystemProfiler {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            timings: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn time_system<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(name, start.elapsed());
        result
    }

    /// Record a measurement taken by the caller.
    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        let window = self.window;
        let order = &mut self.order;
        self.timings
            .entry(name)
            .or_insert_with(|| {
                order.push(name);
                RingBuffer::new(window)
            })
            .push(elapsed);
    }

    pub fn last(&self, name: &'static str) -> Duration {
        self.timings
            .get(name)
            .and_then(|samples| samples.latest())
            .unwrap_or(Duration::ZERO)
    }

    pub fn average(&self, name: &'static str) -> Duration {
        self.timings
            .get(name)
            .map_or(Duration::ZERO, |samples| samples.average())
    }

    /// (name, rolling average) for every phase seen so far.
    pub fn phases(&self) -> impl Iterator<Item = (&'static str, Duration)> + '_ {
        self.order.iter().map(|&name| (name, self.average(name)))
    }
}

impl Default for SystemProfiler {
    fn default() -> Self {
        Self::new(60)
    }
}
