//! Backend executors.
//!
//! Three interchangeable strategies advance every slot by one step through
//! the shared [`kernel::advance`](crate::kernel::advance):
//!
//! | Backend | Threads | Buffers |
//! |---------|---------|---------|
//! | [`Sequential`] | 1 | current, updated in index order |
//! | [`DoubleBuffered`] | rayon | read current, write next, swap |
//! | [`InPlaceParallel`] | rayon | current, each worker owns its slots |
//!
//! Each slot's update depends only on its own previous state and the step
//! context, so all three produce identical results.

mod double_buffered;
mod in_place;
mod sequential;

pub use double_buffered::DoubleBuffered;
pub use in_place::InPlaceParallel;
pub use sequential::Sequential;

use crate::buffer::{Buffering, ParticleBuffer};
use crate::error::SimulationError;
use crate::kernel::{StepContext, StepStats};
use crate::lifecycle;
use crate::particle::Particle;
use crate::throttle;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slots handed to one rayon task.
pub(crate) const CHUNK_SIZE: usize = 1024;

/// Strategy that advances the particle buffer by one step.
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Buffer layout this backend writes into.
    fn buffering(&self) -> Buffering {
        Buffering::Single
    }

    /// Index one past the last slot allowed to respawn this step.
    ///
    /// Scans in slot order and stops after `batch_size` candidates.
    fn grant_cutoff(&self, particles: &[Particle], batch_size: usize) -> usize {
        let candidates = particles
            .iter()
            .enumerate()
            .filter(|(_, p)| lifecycle::is_respawn_candidate(p))
            .map(|(slot, _)| slot);
        throttle::grant_cutoff(candidates, batch_size)
    }

    /// Advance every slot. When this returns, `buffer.current()` holds the
    /// new state and no worker is still writing.
    fn step(&self, buffer: &mut ParticleBuffer, ctx: &StepContext<'_>) -> StepStats;
}

/// Selectable backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    #[serde(rename = "sequential")]
    Sequential,
    #[serde(rename = "double-buffered")]
    DoubleBuffered,
    #[serde(rename = "in-place", alias = "in-place-parallel")]
    InPlaceParallel,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::Sequential,
        BackendKind::DoubleBuffered,
        BackendKind::InPlaceParallel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Sequential => "sequential",
            BackendKind::DoubleBuffered => "double-buffered",
            BackendKind::InPlaceParallel => "in-place",
        }
    }

    /// Build the backend. `workers` sizes a dedicated rayon pool for the
    /// parallel backends; `None` uses the global pool.
    pub fn create(self, workers: Option<usize>) -> Result<Box<dyn Backend>, SimulationError> {
        let pool = match self {
            BackendKind::Sequential => WorkerPool::global(),
            _ => WorkerPool::new(workers)?,
        };
        Ok(self.build(pool))
    }

    /// Build the backend on an existing pool. Sequential ignores it.
    pub fn build(self, pool: WorkerPool) -> Box<dyn Backend> {
        match self {
            BackendKind::Sequential => Box::new(Sequential::new()),
            BackendKind::DoubleBuffered => Box::new(DoubleBuffered::new(pool)),
            BackendKind::InPlaceParallel => Box::new(InPlaceParallel::new(pool)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBackend(pub String);

impl fmt::Display for UnknownBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown backend '{}' (expected sequential, double-buffered or in-place)",
            self.0
        )
    }
}

impl std::error::Error for UnknownBackend {}

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "scalar" => Ok(BackendKind::Sequential),
            "double-buffered" | "double" | "ping-pong" => Ok(BackendKind::DoubleBuffered),
            "in-place" | "in-place-parallel" | "inplace" => Ok(BackendKind::InPlaceParallel),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// Optional dedicated rayon pool.
#[derive(Debug, Default)]
pub struct WorkerPool {
    pool: Option<ThreadPool>,
}

impl WorkerPool {
    pub fn new(workers: Option<usize>) -> Result<Self, ThreadPoolBuildError> {
        let pool = workers
            .map(|n| {
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("flare-worker-{i}"))
                    .build()
            })
            .transpose()?;
        Ok(Self { pool })
    }

    /// Global rayon pool.
    pub fn global() -> Self {
        Self::default()
    }

    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, ThreadPool::current_num_threads)
    }

    /// Run `op` inside this pool so nested rayon calls use its workers.
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ParticleConfig, SimulationParams, ValueRange};
    use crate::kernel::StepContext;
    use crate::throttle::GenerationThrottle;
    use glam::Vec3;

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.as_str().parse::<BackendKind>(), Ok(kind));
            assert_eq!(kind.to_string(), kind.as_str());
        }
        assert_eq!("ping-pong".parse(), Ok(BackendKind::DoubleBuffered));
        assert_eq!(" In-Place-Parallel ".parse(), Ok(BackendKind::InPlaceParallel));
        assert!("gpu".parse::<BackendKind>().is_err());
    }

    #[test]
    fn kind_serde_names() {
        let json = serde_json::to_string(&BackendKind::ALL).unwrap();
        assert_eq!(json, r#"["sequential","double-buffered","in-place"]"#);
        let parsed: BackendKind = serde_json::from_str(r#""in-place-parallel""#).unwrap();
        assert_eq!(parsed, BackendKind::InPlaceParallel);
    }

    #[test]
    fn created_backends_report_their_kind() {
        for kind in BackendKind::ALL {
            let backend = kind.create(Some(2)).unwrap();
            assert_eq!(backend.kind(), kind);
        }
        assert_eq!(
            BackendKind::DoubleBuffered.create(None).unwrap().buffering(),
            Buffering::Double
        );
        assert_eq!(
            BackendKind::InPlaceParallel.create(None).unwrap().buffering(),
            Buffering::Single
        );
    }

    #[test]
    fn worker_pool_sizes() {
        assert_eq!(WorkerPool::new(Some(3)).unwrap().threads(), 3);
        assert!(WorkerPool::global().threads() >= 1);
        assert_eq!(WorkerPool::new(Some(2)).unwrap().install(|| 5), 5);
    }

    #[test]
    fn default_cutoff_stops_after_batch() {
        let backend = Sequential::new();
        let mut particles: Vec<Particle> = (0..8).map(Particle::empty).collect();
        particles[0] = Particle::new(0, Vec3::ZERO, Vec3::ZERO);
        particles[2] = Particle::new(2, Vec3::ZERO, Vec3::ZERO);
        // candidates: 1, 3, 4, 5, 6, 7
        assert_eq!(backend.grant_cutoff(&particles, 2), 4);
        assert_eq!(backend.grant_cutoff(&particles, 6), 8);
        assert_eq!(backend.grant_cutoff(&particles, 7), usize::MAX);
    }

    fn mixed_population(slots: u32) -> Vec<Particle> {
        (0..slots)
            .map(|id| match id % 4 {
                0 => Particle::empty(id),
                1 => Particle::new(id, Vec3::new(id as f32 * 0.01, 3.0, 0.0), Vec3::new(0.5, -1.0, 0.2))
                    .with_lifetime(0.0, 0.5 + (id % 7) as f32 * 0.3),
                2 => Particle::new(id, Vec3::new(0.0, 0.02, -(id as f32) * 0.01), Vec3::new(0.0, -4.0, 1.0))
                    .with_weight(1.0 + (id % 3) as f32 * 0.25),
                _ => Particle::new(id, Vec3::new(1.0, 8.0, 1.0), Vec3::new(-3.0, 6.0, 2.0))
                    .with_lifetime(0.2, 1.7),
            })
            .collect()
    }

    fn run(kind: BackendKind, params: &SimulationParams, steps: usize) -> (Vec<Particle>, Vec<StepStats>) {
        let backend = kind.create(Some(4)).unwrap();
        let mut buffer = ParticleBuffer::new(params.config.max_particles, backend.buffering());
        buffer
            .current_mut()
            .copy_from_slice(&mixed_population(params.config.max_particles as u32));

        let mut throttle = GenerationThrottle::new();
        let generation = params.config.generation;
        let dt = 1.0 / 30.0;
        let mut history = Vec::new();
        for frame in 1..=steps {
            let now = frame as f32 * dt;
            let step = if generation.enabled && throttle.window_open(now, generation.delay) {
                let cutoff = backend.grant_cutoff(buffer.current(), generation.batch_size as usize);
                throttle.open(now, generation.batch_size, cutoff)
            } else {
                throttle.closed()
            };
            let ctx = StepContext {
                params,
                delta_time: dt,
                now,
                throttle: &step,
            };
            history.push(backend.step(&mut buffer, &ctx));
            throttle.finish_step(&step);
        }
        (buffer.current().to_vec(), history)
    }

    #[test]
    fn backends_agree_after_many_steps() {
        let mut config = ParticleConfig {
            max_particles: 5_000,
            max_velocity: 6.0,
            weight: ValueRange::new(0.5, 2.0),
            ..Default::default()
        };
        config.generation.delay = 0.1;
        config.generation.batch_size = 40;
        config.generation.lifetime = ValueRange::new(0.3, 1.2);
        config.generation.spawn_time_jitter = 0.05;
        config.fluid.enabled = true;
        config.ground.as_mut().unwrap().pitch_degrees = 10.0;
        let params = SimulationParams::resolve(config).unwrap();

        let (reference, reference_stats) = run(BackendKind::Sequential, &params, 90);
        for kind in [BackendKind::DoubleBuffered, BackendKind::InPlaceParallel] {
            let (particles, stats) = run(kind, &params, 90);
            assert_eq!(stats, reference_stats, "{kind} step stats diverged");
            for (a, b) in reference.iter().zip(&particles) {
                assert_eq!(a.id, b.id);
                assert!((a.position - b.position).length() <= 1e-5, "{kind}: slot {}", a.id);
                assert!((a.velocity - b.velocity).length() <= 1e-5, "{kind}: slot {}", a.id);
                assert!((a.lifetime - b.lifetime).abs() <= 1e-6, "{kind}: slot {}", a.id);
                assert_eq!(a.lifetime_percentage, b.lifetime_percentage);
            }
        }
        assert!(reference_stats.iter().any(|s| s.spawned > 0));
        assert!(reference_stats.iter().any(|s| s.collisions > 0));
        assert!(reference_stats.iter().any(|s| s.expired > 0));
    }

    #[test]
    fn every_backend_respects_generation_cap() {
        let mut config = ParticleConfig {
            max_particles: 3_000,
            ..Default::default()
        };
        config.generation.batch_size = 17;
        let params = SimulationParams::resolve(config).unwrap();
        for kind in BackendKind::ALL {
            let (_, stats) = run(kind, &params, 20);
            assert!(stats.iter().all(|s| s.spawned <= 17), "{kind}");
            assert!(stats.iter().any(|s| s.spawned == 17), "{kind}");
        }
    }
}
