//! Deterministic time system
//!
//! Fixed tick rate; the clock hands out `(delta_time, current_time)` pairs
//! derived from the tick count so long runs do not accumulate drift.

use std::time::Duration;

/// Default simulation tick rate (60 Hz = 16.666ms per tick)
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

/// One advanced tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: u64,
    pub delta_time: f32,
    pub current_time: f32,
}

/// Simulation time tracker
#[derive(Debug, Clone)]
pub struct SimulationClock {
    tick_rate_hz: u32,
    tick_count: u64,
}

impl SimulationClock {
    /// A zero rate is bumped to 1 Hz.
    pub fn new(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz: tick_rate_hz.max(1),
            tick_count: 0,
        }
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn delta_time(&self) -> f32 {
        (1.0 / self.tick_rate_hz as f64) as f32
    }

    pub fn current_time(&self) -> f32 {
        (self.tick_count as f64 / self.tick_rate_hz as f64) as f32
    }

    pub fn advance_tick(&mut self) -> Tick {
        self.tick_count += 1;
        Tick {
            index: self.tick_count,
            delta_time: self.delta_time(),
            current_time: self.current_time(),
        }
    }

    pub fn total_time(&self) -> Duration {
        Duration::from_secs_f64(self.tick_count as f64 / self.tick_rate_hz as f64)
    }

    pub fn reset(&mut self) {
        self.tick_count = 0;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE_HZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_advance_time() {
        let mut clock = SimulationClock::new(10);
        let first = clock.advance_tick();
        assert_eq!(first.index, 1);
        assert!((first.delta_time - 0.1).abs() < 1e-6);
        assert!((first.current_time - 0.1).abs() < 1e-6);

        for _ in 0..9 {
            clock.advance_tick();
        }
        assert!((clock.current_time() - 1.0).abs() < 1e-6);
        assert_eq!(clock.total_time(), Duration::from_secs(1));
    }

    #[test]
    fn no_drift_over_long_runs() {
        let mut clock = SimulationClock::default();
        for _ in 0..(60 * 60 * 10) {
            clock.advance_tick();
        }
        assert!((clock.current_time() - 600.0).abs() < 1e-3);
    }

    #[test]
    fn zero_rate_is_clamped() {
        let clock = SimulationClock::new(0);
        assert_eq!(clock.tick_rate_hz(), 1);
    }

    #[test]
    fn reset_rewinds() {
        let mut clock = SimulationClock::new(30);
        clock.advance_tick();
        clock.reset();
        assert_eq!(clock.tick_count(), 0);
        assert_eq!(clock.current_time(), 0.0);
    }
}
