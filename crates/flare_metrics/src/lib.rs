//! Flare Metrics - frame and step instrumentation for benchmark runs
//!
//! Collection compiles away entirely unless the `metrics` feature is on.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use flare_metrics::FrameTimer;
//!
//! let mut timer = FrameTimer::new(600);
//! timer.begin();
//! system.step(dt, now)?;
//! timer.end();
//! let stats = timer.stats();
//! println!("avg {:.3} ms, p95 {:.3} ms", stats.average_ms, stats.p95_ms);
//! ```

#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod system_profiler;

#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use system_profiler::{PhaseTiming, SystemProfiler};

/// Summary of the frames currently held by a [`FrameTimer`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub samples: usize,
    pub average_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p95_ms: f64,
    pub fps: f64,
}

/// Whether this build collects metrics at all.
pub const fn enabled() -> bool {
    cfg!(feature = "metrics")
}

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn record(&mut self, _elapsed: std::time::Duration) {}
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn stats(&self) -> FrameStats { FrameStats::default() }
    pub fn reset(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug)]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
    pub fn clear(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &str, _value: usize) {}
    pub fn set(&mut self, _name: &str, _value: usize) {}
    pub fn get(&self, _name: &str) -> usize { 0 }
    pub fn reset_all(&mut self) {}
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct SystemProfiler;

#[cfg(not(feature = "metrics"))]
impl SystemProfiler {
    pub fn new() -> Self { Self }
    pub fn time_system<F, R>(&mut self, _name: &str, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn get_timing(&self, _name: &str) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn calls(&self, _name: &str) -> u64 { 0 }
    pub fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_api_compiles_in_either_mode() {
        let mut timer = super::FrameTimer::new(60);
        timer.begin();
        timer.end();
        let _ = timer.stats();
        let mut _buffer = super::RingBuffer::<f64>::new(10);
        let mut counter = super::Counter::new();
        counter.increment("particles.spawned", 3);
        let mut profiler = super::SystemProfiler::new();
        let value = profiler.time_system("particles.step", || 7);
        assert_eq!(value, 7);
    }

    #[cfg(not(feature = "metrics"))]
    #[test]
    fn test_stubs_report_nothing() {
        let mut counter = super::Counter::new();
        counter.increment("particles.spawned", 3);
        assert_eq!(counter.get("particles.spawned"), 0);
        assert!(!super::enabled());
    }
}
