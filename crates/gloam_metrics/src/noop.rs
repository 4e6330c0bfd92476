//! Zero-cost stand-ins used when the `metrics` feature is off.

use std::marker::PhantomData;
use std::time::Duration;

pub struct FrameTimer;

impl FrameTimer {
    pub fn new(_window: usize) -> Self {
        Self
    }
    pub fn with_budget(self, _budget: Duration) -> Self {
        self
    }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) -> Duration {
        Duration::ZERO
    }
    pub fn record(&mut self, _elapsed: Duration) {}
    pub fn fps(&self) -> f64 {
        0.0
    }
    pub fn frame_time_ms(&self) -> f64 {
        0.0
    }
    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        (0.0, 0.0)
    }
    pub fn frames(&self) -> u64 {
        0
    }
    pub fn over_budget_frames(&self) -> u64 {
        0
    }
}

pub struct RingBuffer<T>(PhantomData<T>);

impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self {
        Self(PhantomData)
    }
    pub fn push(&mut self, _sample: T) {}
    pub fn latest(&self) -> Option<T> {
        None
    }
    pub fn len(&self) -> usize {
        0
    }
    pub fn is_empty(&self) -> bool {
        true
    }
    pub fn clear(&mut self) {}
}

#[derive(Default)]
pub struct Counter;

impl Counter {
    pub fn new() -> Self {
        Self
    }
    pub fn increment(&mut self, _name: &'static str, _value: usize) {}
    pub fn set(&mut self, _name: &'static str, _value: usize) {}
    pub fn get(&self, _name: &'static str) -> usize {
        0
    }
    pub fn reset_all(&mut self) {}
    pub fn iter(&self) -> std::iter::Empty<(&'static str, usize)> {
        std::iter::empty()
    }
}

#[derive(Default)]
pub struct SystemProfiler;

impl SystemProfiler {
    pub fn new(_window: usize) -> Self {
        Self
    }
    pub fn time_system<F, R>(&mut self, _name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        f()
    }
    pub fn record(&mut self, _name: &'static str, _elapsed: Duration) {}
    pub fn last(&self, _name: &'static str) -> Duration {
        Duration::ZERO
    }
    pub fn average(&self, _name: &'static str) -> Duration {
        Duration::ZERO
    }
    pub fn phases(&self) -> std::iter::Empty<(&'static str, Duration)> {
        std::iter::empty()
    }
}
