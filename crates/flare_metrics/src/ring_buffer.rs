//! Rolling window of the most recent samples

use std::collections::VecDeque;
use std::time::Duration;

/// Keeps at most `capacity` samples; pushing into a full window evicts the
/// oldest one.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    window: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// A zero capacity is bumped to one sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.window.iter()
    }
}

impl RingBuffer<Duration> {
    pub fn average(&self) -> Duration {
        match self.window.len() {
            0 => Duration::ZERO,
            n => self.window.iter().sum::<Duration>() / n as u32,
        }
    }

    pub fn min_max(&self) -> (Duration, Duration) {
        self.window
            .iter()
            .fold(None, |acc: Option<(Duration, Duration)>, &d| match acc {
                None => Some((d, d)),
                Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
            })
            .unwrap_or_default()
    }

    /// Nearest-rank percentile, `pct` in `[0, 100]`.
    pub fn percentile(&self, pct: f64) -> Duration {
        let mut sorted: Vec<Duration> = self.window.iter().copied().collect();
        if sorted.is_empty() {
            return Duration::ZERO;
        }
        sorted.sort_unstable();
        let rank = (pct.clamp(0.0, 100.0) * sorted.len() as f64 / 100.0).ceil() as usize;
        sorted[rank.clamp(1, sorted.len()) - 1]
    }
}
