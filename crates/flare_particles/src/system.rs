//! The particle system facade.
//!
//! [`ParticleSystem`] owns the slot buffers, the render feed and the
//! persistent throttle, and drives one [`Backend`] per step:
//!
//! ```ignore
//! let mut system = ParticleSystem::new(BackendKind::InPlaceParallel);
//! system.configure(ParticleConfig::default())?;
//! system.step(1.0 / 60.0, 1.0 / 60.0)?;
//! let snapshot = system.snapshot()?;
//! queue.write_buffer(&instances, 0, snapshot.instance_bytes());
//! ```

use crate::backend::{Backend, BackendKind, WorkerPool};
use crate::buffer::ParticleBuffer;
use crate::config::{ParticleConfig, SimulationParams};
use crate::error::SimulationError;
use crate::feed::{RenderFeed, Snapshot};
use crate::kernel::{StepContext, StepStats};
use crate::particle::Particle;
use crate::spawn;
use crate::throttle::GenerationThrottle;
use flare_metrics::{metrics, Counter, SystemProfiler};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Totals since the last configure or reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub steps: u64,
    pub spawned: u64,
    pub expired: u64,
    pub collisions: u64,
    pub last: StepStats,
}

impl SimulationStats {
    fn record(&mut self, step: StepStats) {
        self.steps += 1;
        self.spawned += u64::from(step.spawned);
        self.expired += u64::from(step.expired);
        self.collisions += u64::from(step.collisions);
        self.last = step;
    }
}

struct Configured {
    params: SimulationParams,
    buffer: ParticleBuffer,
    feed: RenderFeed,
    throttle: GenerationThrottle,
    time: f32,
}

impl Configured {
    fn refresh_feed(&mut self) {
        let render = &self.params.config.render;
        self.feed
            .rebuild(self.buffer.current(), render, self.params.config.seed);
    }
}

pub struct ParticleSystem {
    backend: Box<dyn Backend>,
    /// Worker count the backend's pool was built with.
    workers: Option<usize>,
    state: Option<Configured>,
    stats: SimulationStats,
    profiler: SystemProfiler,
    counters: Counter,
}

impl ParticleSystem {
    /// Unconfigured system using `kind` on the global rayon pool.
    pub fn new(kind: BackendKind) -> Self {
        Self::with_backend(kind.build(WorkerPool::global()))
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            workers: None,
            state: None,
            stats: SimulationStats::default(),
            profiler: SystemProfiler::new(),
            counters: Counter::new(),
        }
    }

    /// Validate `config` and (re)allocate every slot as empty.
    ///
    /// On error the system is left unconfigured, even if it was configured
    /// before.
    pub fn configure(&mut self, config: ParticleConfig) -> Result<(), SimulationError> {
        self.state = None;
        let params = SimulationParams::resolve(config)?;

        if params.config.workers != self.workers {
            self.backend = self.backend.kind().create(params.config.workers)?;
            self.workers = params.config.workers;
        }

        let slots = params.config.max_particles;
        let buffer = ParticleBuffer::new(slots, self.backend.buffering());
        let feed = RenderFeed::new(slots);
        info!(
            backend = %self.backend.kind(),
            slots,
            workers = ?self.workers,
            generation = params.config.generation.enabled,
            "particle system configured"
        );

        self.state = Some(Configured {
            params,
            buffer,
            feed,
            throttle: GenerationThrottle::new(),
            time: 0.0,
        });
        self.clear_stats();
        Ok(())
    }

    /// Advance every slot by `delta_time` to clock time `current_time`.
    ///
    /// A negative or non-finite `delta_time` is treated as zero. A
    /// non-finite `current_time` keeps the previous clock time: no slot
    /// respawns or ages during that step.
    pub fn step(&mut self, delta_time: f32, current_time: f32) -> Result<StepStats, SimulationError> {
        let state = self.state.as_mut().ok_or(SimulationError::NotConfigured)?;

        let delta_time = if delta_time.is_finite() && delta_time >= 0.0 {
            delta_time
        } else {
            warn!(delta_time, "invalid delta time; stepping with zero");
            0.0
        };

        // Non-finite clock: reuse the previous time, generation stays closed.
        let clock_valid = current_time.is_finite();
        let current_time = if clock_valid {
            current_time
        } else {
            warn!(current_time, "non-finite clock time; skipping generation and aging");
            state.time
        };

        let generation = state.params.config.generation;
        let step_throttle = if clock_valid
            && generation.enabled
            && state.throttle.window_open(current_time, generation.delay)
        {
            let batch_size = generation.batch_size as usize;
            let cutoff = self.backend.grant_cutoff(state.buffer.current(), batch_size);
            state.throttle.open(current_time, generation.batch_size, cutoff)
        } else {
            state.throttle.closed()
        };

        let ctx = StepContext {
            params: &state.params,
            delta_time,
            now: current_time,
            throttle: &step_throttle,
        };
        let backend = &self.backend;
        let buffer = &mut state.buffer;
        let stats = self
            .profiler
            .time_system("particles.step", || backend.step(buffer, &ctx));

        state.throttle.finish_step(&step_throttle);
        state.time = current_time;
        self.profiler
            .time_system("particles.feed", || state.refresh_feed());

        self.stats.record(stats);
        metrics! {
            self.counters.increment("particles.spawned", stats.spawned as usize);
            self.counters.increment("particles.expired", stats.expired as usize);
            self.counters.increment("particles.collisions", stats.collisions as usize);
            self.counters.set("particles.visible", stats.visible as usize);
        }
        debug!(
            time = current_time,
            spawned = stats.spawned,
            expired = stats.expired,
            collisions = stats.collisions,
            visible = stats.visible,
            "step"
        );
        Ok(stats)
    }

    /// Borrow the current state for rendering.
    pub fn snapshot(&self) -> Result<Snapshot<'_>, SimulationError> {
        let state = self.state.as_ref().ok_or(SimulationError::NotConfigured)?;
        Ok(Snapshot {
            particles: state.buffer.current(),
            instances: state.feed.instances(),
            visible: state.feed.visible(),
            time: state.time,
        })
    }

    /// Empty every slot and rewind the throttle. Keeps the configuration.
    pub fn reset(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.buffer.reset();
            state.feed.clear();
            state.throttle.reset();
            state.time = 0.0;
            info!(slots = state.buffer.len(), "particle system reset");
        }
        self.clear_stats();
    }

    /// Respawn every slot at clock time `now`, bypassing the throttle.
    pub fn burst(&mut self, now: f32) -> Result<usize, SimulationError> {
        let state = self.state.as_mut().ok_or(SimulationError::NotConfigured)?;
        let config = &state.params.config;
        state
            .buffer
            .current_mut()
            .par_iter_mut()
            .for_each(|slot| *slot = spawn::respawn(slot.id, now, config));
        state.refresh_feed();

        let spawned = state.buffer.len();
        self.stats.spawned += spawned as u64;
        metrics! {
            self.counters.increment("particles.spawned", spawned);
        }
        info!(spawned, time = now, "burst");
        Ok(spawned)
    }

    /// Overwrite every slot with `f(id)`. The slot id is kept regardless of
    /// the id the closure returns.
    pub fn seed_with<F>(&mut self, mut f: F) -> Result<(), SimulationError>
    where
        F: FnMut(u32) -> Particle,
    {
        let state = self.state.as_mut().ok_or(SimulationError::NotConfigured)?;
        for slot in state.buffer.current_mut() {
            let id = slot.id;
            *slot = Particle { id, ..f(id) };
        }
        state.refresh_feed();
        Ok(())
    }

    /// Switch strategy without touching the simulation state.
    pub fn set_backend(&mut self, kind: BackendKind) -> Result<(), SimulationError> {
        if kind == self.backend.kind() {
            return Ok(());
        }
        self.backend = kind.create(self.workers)?;
        if let Some(state) = self.state.as_mut() {
            state.buffer.set_buffering(self.backend.buffering());
        }
        info!(backend = %kind, "backend switched");
        Ok(())
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn is_configured(&self) -> bool {
        self.state.is_some()
    }

    pub fn config(&self) -> Option<&ParticleConfig> {
        self.state.as_ref().map(|s| &s.params.config)
    }

    /// Time of the most recent generation event.
    pub fn last_generation_time(&self) -> Option<f32> {
        self.state.as_ref().map(|s| s.throttle.last_generation_time())
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Phase timings (`particles.step`, `particles.feed`).
    pub fn profiler(&self) -> &SystemProfiler {
        &self.profiler
    }

    pub fn counters(&self) -> &Counter {
        &self.counters
    }

    fn clear_stats(&mut self) {
        self.stats = SimulationStats::default();
        self.profiler.reset();
        self.counters.reset_all();
    }
}

impl std::fmt::Debug for ParticleSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleSystem")
            .field("backend", &self.backend.kind())
            .field("workers", &self.workers)
            .field("configured", &self.state.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}
