//! Frame timing utilities

use super::ring_buffer::RingBuffer;
use crate::FrameStats;
use std::time::{Duration, Instant};

pub struct FrameTimer {
    frame_start: Instant,
    frame_times: RingBuffer<Duration>,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frame_start: Instant::now(),
            frame_times: RingBuffer::new(capacity),
        }
    }

    pub fn begin(&mut self) {
        self.frame_start = Instant::now();
    }

    pub fn end(&mut self) {
        let elapsed = self.frame_start.elapsed();
        self.frame_times.push(elapsed);
    }

    /// Record a frame measured elsewhere.
    pub fn record(&mut self, elapsed: Duration) {
        self.frame_times.push(elapsed);
    }

    pub fn fps(&self) -> f64 {
        let avg = self.frame_times.average();
        if avg.as_secs_f64() > 0.0 {
            1.0 / avg.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.frame_times.average().as_secs_f64() * 1000.0
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.frame_times.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }

    pub fn stats(&self) -> FrameStats {
        let (min_ms, max_ms) = self.frame_time_range_ms();
        FrameStats {
            samples: self.frame_times.len(),
            average_ms: self.frame_time_ms(),
            min_ms,
            max_ms,
            p95_ms: self.frame_times.percentile(95.0).as_secs_f64() * 1000.0,
            fps: self.fps(),
        }
    }

    pub fn reset(&mut self) {
        self.frame_times.clear();
    }
}
