//! Generation throttle.
//!
//! [`GenerationThrottle`] persists across steps and only remembers when
//! particles were last generated. Each step builds a [`StepThrottle`]: the
//! shared context that every worker consults before respawning a slot. It
//! owns the only cross-worker mutable state in a step:
//!
//! - `generated`: an atomic counter bounded by `batch_size`
//! - `latest`: an atomic monotonic maximum of the generation timestamp
//!
//! Which slots may win is fixed before the sweep: the first `batch_size`
//! candidates in slot order. Sequential and parallel backends therefore
//! respawn exactly the same slots.

use std::sync::atomic::{AtomicU32, Ordering};

/// Map an `f32` to a `u32` whose unsigned order matches the float order.
#[inline]
fn ordered_bits(value: f32) -> u32 {
    let bits = value.to_bits();
    if bits & 0x8000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000
    }
}

#[inline]
fn from_ordered_bits(bits: u32) -> f32 {
    if bits & 0x8000_0000 != 0 {
        f32::from_bits(bits & 0x7fff_ffff)
    } else {
        f32::from_bits(!bits)
    }
}

/// Index one past the last slot granted a respawn.
///
/// `candidates` must yield slot indices in ascending order. When fewer than
/// `batch_size` candidates exist every candidate is granted.
pub fn grant_cutoff<I>(candidates: I, batch_size: usize) -> usize
where
    I: IntoIterator<Item = usize>,
{
    if batch_size == 0 {
        return 0;
    }
    let mut seen = 0;
    for slot in candidates {
        seen += 1;
        if seen == batch_size {
            return slot + 1;
        }
    }
    usize::MAX
}

/// Persistent throttle state.
#[derive(Debug, Clone, Default)]
pub struct GenerationThrottle {
    last_generation_time: f32,
}

impl GenerationThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_generation_time(&self) -> f32 {
        self.last_generation_time
    }

    /// Whether `delay` has elapsed since the last generation event.
    pub fn window_open(&self, now: f32, delay: f32) -> bool {
        now - self.last_generation_time >= delay
    }

    /// Throttle context for a step in which no slot may respawn.
    pub fn closed(&self) -> StepThrottle {
        StepThrottle::new(0.0, 0, 0, self.last_generation_time)
    }

    /// Throttle context granting slots below `cutoff`, at most `batch_size` of them.
    pub fn open(&self, now: f32, batch_size: u32, cutoff: usize) -> StepThrottle {
        StepThrottle::new(now, batch_size, cutoff, self.last_generation_time)
    }

    /// Fold a finished step's generation timestamp back in.
    pub fn finish_step(&mut self, step: &StepThrottle) {
        self.last_generation_time = self
            .last_generation_time
            .max(step.latest_generation_time());
    }

    pub fn reset(&mut self) {
        self.last_generation_time = 0.0;
    }
}

/// Per-step throttle context shared by all workers.
#[derive(Debug)]
pub struct StepThrottle {
    now: f32,
    batch_size: u32,
    cutoff: usize,
    generated: AtomicU32,
    latest: AtomicU32,
}

impl StepThrottle {
    fn new(now: f32, batch_size: u32, cutoff: usize, last_generation_time: f32) -> Self {
        Self {
            now,
            batch_size,
            cutoff,
            generated: AtomicU32::new(0),
            latest: AtomicU32::new(ordered_bits(last_generation_time)),
        }
    }

    /// Try to respawn `slot`, which must be a respawn candidate.
    ///
    /// Safe to call from many threads; never grants more than `batch_size`.
    pub fn try_claim(&self, slot: usize) -> bool {
        if slot >= self.cutoff {
            return false;
        }
        let batch_size = self.batch_size;
        let claimed = self
            .generated
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < batch_size).then_some(n + 1)
            })
            .is_ok();
        if claimed {
            self.latest.fetch_max(ordered_bits(self.now), Ordering::AcqRel);
        }
        claimed
    }

    pub fn generated(&self) -> u32 {
        self.generated.load(Ordering::Acquire)
    }

    pub fn latest_generation_time(&self) -> f32 {
        from_ordered_bits(self.latest.load(Ordering::Acquire))
    }
}
