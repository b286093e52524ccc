use super::{Backend, BackendKind, WorkerPool, CHUNK_SIZE};
use crate::buffer::ParticleBuffer;
use crate::kernel::{self, StepContext, StepStats};
use rayon::prelude::*;

/// Single-buffer parallel backend.
///
/// Each worker owns a disjoint chunk of slots and overwrites them in place.
/// Sound because a slot's update reads nothing from other slots; the only
/// shared state is the step's atomic throttle.
#[derive(Debug, Default)]
pub struct InPlaceParallel {
    pool: WorkerPool,
}

impl InPlaceParallel {
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }
}

impl Backend for InPlaceParallel {
    fn kind(&self) -> BackendKind {
        BackendKind::InPlaceParallel
    }

    fn step(&self, buffer: &mut ParticleBuffer, ctx: &StepContext<'_>) -> StepStats {
        let particles = buffer.current_mut();
        self.pool.install(|| {
            particles
                .par_chunks_mut(CHUNK_SIZE)
                .enumerate()
                .map(|(chunk, slots)| {
                    let base = chunk * CHUNK_SIZE;
                    let mut stats = StepStats::default();
                    for (offset, particle) in slots.iter_mut().enumerate() {
                        let (next, transition) = kernel::advance(particle, base + offset, ctx);
                        *particle = next;
                        stats.record(transition);
                    }
                    stats
                })
                .reduce(StepStats::default, StepStats::merge)
        })
    }
}
