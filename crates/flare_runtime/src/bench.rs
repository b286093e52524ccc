//! Benchmark driver
//!
//! Runs the same scene through each requested backend on a fixed clock and
//! collects frame timings plus simulation totals.

use crate::settings::BenchmarkSettings;
use anyhow::Result;
use flare_core::time::SimulationClock;
use flare_metrics::FrameTimer;
use flare_particles::{BackendKind, ParticleSystem};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct BackendReport {
    pub backend: BackendKind,
    pub slots: usize,
    pub frames: u32,
    pub average_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub p95_ms: f64,
    pub fps: f64,
    pub step_ms_total: f64,
    pub feed_ms_total: f64,
    pub wall_ms: f64,
    pub spawned: u64,
    pub expired: u64,
    pub collisions: u64,
    pub visible: usize,
}

/// Largest per-slot difference between a backend and the reference run.
#[derive(Debug, Clone, Serialize)]
pub struct Deviation {
    pub reference: BackendKind,
    pub backend: BackendKind,
    pub max_position: f32,
    pub max_velocity: f32,
    pub mismatched_slots: usize,
}

impl Deviation {
    pub fn is_equivalent(&self, tolerance: f32) -> bool {
        self.mismatched_slots == 0
            && self.max_position <= tolerance
            && self.max_velocity <= tolerance
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub version: &'static str,
    pub metrics_enabled: bool,
    pub tick_rate_hz: u32,
    pub backends: Vec<BackendReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Vec<Deviation>>,
}

/// Drive one backend through the scene. Returns the finished system so the
/// caller can compare end states.
pub fn run_backend(kind: BackendKind, settings: &BenchmarkSettings) -> Result<(BackendReport, ParticleSystem)> {
    let mut system = ParticleSystem::new(kind);
    system.configure(settings.particles.clone())?;
    let mut clock = SimulationClock::new(settings.tick_rate_hz);

    if !settings.particles.generation.enabled {
        system.burst(clock.current_time())?;
    }

    for _ in 0..settings.warmup_frames {
        let tick = clock.advance_tick();
        system.step(tick.delta_time, tick.current_time)?;
    }

    let mut timer = FrameTimer::new(settings.frames.max(1) as usize);
    let started = Instant::now();
    for _ in 0..settings.frames {
        let tick = clock.advance_tick();
        timer.begin();
        system.step(tick.delta_time, tick.current_time)?;
        timer.end();
    }
    let wall_ms = started.elapsed().as_secs_f64() * 1000.0;

    let frames = timer.stats();
    let stats = *system.stats();
    let profiler = system.profiler();
    let report = BackendReport {
        backend: kind,
        slots: settings.particles.max_particles,
        frames: settings.frames,
        average_ms: frames.average_ms,
        min_ms: frames.min_ms,
        max_ms: frames.max_ms,
        p95_ms: frames.p95_ms,
        fps: frames.fps,
        step_ms_total: profiler.get_timing("particles.step").as_secs_f64() * 1000.0,
        feed_ms_total: profiler.get_timing("particles.feed").as_secs_f64() * 1000.0,
        wall_ms,
        spawned: stats.spawned,
        expired: stats.expired,
        collisions: stats.collisions,
        visible: system.snapshot()?.visible,
    };
    info!(
        backend = %kind,
        avg_ms = report.average_ms,
        p95_ms = report.p95_ms,
        visible = report.visible,
        "backend finished"
    );
    Ok((report, system))
}

/// Compare each system's end state against the first one.
pub fn compare(systems: &[ParticleSystem]) -> Result<Vec<Deviation>> {
    let Some((reference, rest)) = systems.split_first() else {
        return Ok(Vec::new());
    };
    let expected = reference.snapshot()?;
    rest.iter()
        .map(|system| -> Result<Deviation> {
            let actual = system.snapshot()?;
            let mut deviation = Deviation {
                reference: reference.backend_kind(),
                backend: system.backend_kind(),
                max_position: 0.0,
                max_velocity: 0.0,
                mismatched_slots: 0,
            };
            for (a, b) in expected.particles.iter().zip(actual.particles) {
                deviation.max_position = deviation.max_position.max((a.position - b.position).length());
                deviation.max_velocity = deviation.max_velocity.max((a.velocity - b.velocity).length());
                if a.is_expired() != b.is_expired() {
                    deviation.mismatched_slots += 1;
                }
            }
            deviation.mismatched_slots += expected.len().abs_diff(actual.len());
            Ok(deviation)
        })
        .collect()
}

pub fn run(settings: &BenchmarkSettings, compare_backends: bool) -> Result<Report> {
    info!(
        frames = settings.frames,
        slots = settings.particles.max_particles,
        backends = settings.backends.len(),
        "starting benchmark"
    );
    let mut reports = Vec::with_capacity(settings.backends.len());
    let mut systems = Vec::with_capacity(settings.backends.len());
    for &kind in &settings.backends {
        let (report, system) = run_backend(kind, settings)?;
        reports.push(report);
        systems.push(system);
    }

    let comparison = if compare_backends {
        Some(compare(&systems)?)
    } else {
        None
    };

    Ok(Report {
        version: flare_core::VERSION,
        metrics_enabled: flare_metrics::enabled(),
        tick_rate_hz: settings.tick_rate_hz,
        backends: reports,
        comparison,
    })
}
