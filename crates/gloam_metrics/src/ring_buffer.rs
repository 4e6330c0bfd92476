//! Bounded sample window, oldest samples fall off the front

use std::collections::VecDeque;
use std::time::Duration;

pub struct RingBuffer<T> {
    window: VecDeque<T>,
    limit: usize,
}

impl<T: Copy> RingBuffer<T> {
    /// A window of at least one sample.
    pub fn new(capacity: usize) -> Self {
        let limit = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.window.len() == self.limit {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    pub fn latest(&self) -> Option<T> {
        self.window.back().copied()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.window.iter().copied()
    }

    pub fn capacity(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

impl RingBuffer<Duration> {
    /// Mean of the window, zero when empty.
    pub fn average(&self) -> Duration {
        match u32::try_from(self.window.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(count) => self.iter().sum::<Duration>() / count,
        }
    }

    /// (shortest, longest), both zero when empty.
    pub fn min_max(&self) -> (Duration, Duration) {
        self.iter().fold(None, |range, sample| match range {
            None => Some((sample, sample)),
            Some((lo, hi)) => Some((sample.min(lo), sample.max(hi))),
        })
        .unwrap_or_default()
    }
}

impl RingBuffer<f64> {
    pub fn average(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.iter().sum::<f64>() / self.window.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn oldest_sample_is_evicted() {
        let mut window = RingBuffer::new(3);
        for value in [10, 20, 30] {
            window.push(ms(value));
        }
        assert_eq!(window.average(), ms(20));

        window.push(ms(40));
        assert_eq!(window.len(), 3);
        assert_eq!(window.iter().collect::<Vec<_>>(), vec![ms(20), ms(30), ms(40)]);
        assert_eq!(window.latest(), Some(ms(40)));
        assert_eq!(window.min_max(), (ms(20), ms(40)));
    }

    #[test]
    fn empty_window_reports_zero() {
        let mut window: RingBuffer<Duration> = RingBuffer::new(0);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.average(), Duration::ZERO);
        assert_eq!(window.min_max(), (Duration::ZERO, Duration::ZERO));

        window.push(ms(5));
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.latest(), None);
    }

    #[test]
    fn float_average() {
        let mut window = RingBuffer::new(4);
        window.push(1.0);
        window.push(2.0);
        assert!((window.average() - 1.5).abs() < 1e-12);
    }
}
