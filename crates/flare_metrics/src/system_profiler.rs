//! Profiler for timing named simulation phases

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Accumulated time and call count for one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTiming {
    pub total: Duration,
    pub calls: u64,
}

impl PhaseTiming {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total.div_f64(self.calls as f64)
        }
    }
}

#[derive(Debug, Default)]
pub struct SystemProfiler {
    timings: BTreeMap<String, PhaseTiming>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_system<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let entry = self.timings.entry(name.to_string()).or_default();
        entry.total += elapsed;
        entry.calls += 1;
        result
    }

    pub fn get_timing(&self, name: &str) -> Duration {
        self.timings.get(name).map(|t| t.total).unwrap_or(Duration::ZERO)
    }

    pub fn calls(&self, name: &str) -> u64 {
        self.timings.get(name).map(|t| t.calls).unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PhaseTiming)> {
        self.timings.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_accumulate_calls() {
        let mut profiler = SystemProfiler::new();
        for _ in 0..3 {
            profiler.time_system("particles.step", || std::hint::black_box(1 + 1));
        }
        assert_eq!(profiler.calls("particles.step"), 3);
        assert_eq!(profiler.calls("particles.feed"), 0);
        assert_eq!(profiler.get_timing("particles.feed"), Duration::ZERO);

        let (name, timing) = profiler.iter().next().unwrap();
        assert_eq!(name, "particles.step");
        assert!(timing.average() <= timing.total);
    }

    #[test]
    fn average_survives_huge_call_counts() {
        let timing = PhaseTiming {
            total: Duration::from_secs(1 << 32),
            calls: 1 << 32,
        };
        assert_eq!(timing.average(), Duration::from_secs(1));

        let timing = PhaseTiming {
            total: Duration::from_millis(30),
            calls: 3,
        };
        let average_ms = timing.average().as_secs_f64() * 1000.0;
        assert!((average_ms - 10.0).abs() < 1e-6);
        assert_eq!(PhaseTiming::default().average(), Duration::ZERO);
    }
}
