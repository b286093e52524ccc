use super::{Backend, BackendKind, WorkerPool, CHUNK_SIZE};
use crate::buffer::{Buffering, ParticleBuffer};
use crate::kernel::{self, StepContext, StepStats};
use rayon::prelude::*;

/// Ping-pong backend.
///
/// Workers read slot `i` from the current buffer and write slot `i` of the
/// next buffer, so no worker ever observes a half-updated neighbour. The
/// end of the parallel sweep is the barrier; the buffers are then swapped.
#[derive(Debug, Default)]
pub struct DoubleBuffered {
    pool: WorkerPool,
}

impl DoubleBuffered {
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }
}

impl Backend for DoubleBuffered {
    fn kind(&self) -> BackendKind {
        BackendKind::DoubleBuffered
    }

    fn buffering(&self) -> Buffering {
        Buffering::Double
    }

    fn step(&self, buffer: &mut ParticleBuffer, ctx: &StepContext<'_>) -> StepStats {
        let (read, write) = buffer.slice_rw();
        let stats = self.pool.install(|| {
            write
                .par_chunks_mut(CHUNK_SIZE)
                .zip(read.par_chunks(CHUNK_SIZE))
                .enumerate()
                .map(|(chunk, (dst, src))| {
                    let base = chunk * CHUNK_SIZE;
                    let mut stats = StepStats::default();
                    for (offset, (out, particle)) in dst.iter_mut().zip(src).enumerate() {
                        let (next, transition) = kernel::advance(particle, base + offset, ctx);
                        *out = next;
                        stats.record(transition);
                    }
                    stats
                })
                .reduce(StepStats::default, StepStats::merge)
        });
        buffer.swap_buffers();
        stats
    }
}
