use super::{Backend, BackendKind};
use crate::buffer::ParticleBuffer;
use crate::kernel::{self, StepContext, StepStats};

/// Single-threaded reference backend. Updates slots in index order.
#[derive(Debug, Default)]
pub struct Sequential;

impl Sequential {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for Sequential {
    fn kind(&self) -> BackendKind {
        BackendKind::Sequential
    }

    fn step(&self, buffer: &mut ParticleBuffer, ctx: &StepContext<'_>) -> StepStats {
        let mut stats = StepStats::default();
        for (slot, particle) in buffer.current_mut().iter_mut().enumerate() {
            let (next, transition) = kernel::advance(particle, slot, ctx);
            *particle = next;
            stats.record(transition);
        }
        stats
    }
}
