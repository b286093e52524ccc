use crate::particle::Particle;

/// How many copies of the slot array a backend needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buffering {
    Single,
    Double,
}

/// Fixed-size particle storage, optionally double-buffered.
///
/// Reading always happens from the `cur` buffer. Double-buffered backends
/// write into `nxt`, and `swap_buffers` flips their roles at the end of the
/// step. Slots are allocated once; stepping never grows either buffer.
#[derive(Debug, Clone)]
pub struct ParticleBuffer {
    cur: Vec<Particle>,
    nxt: Vec<Particle>,
}

impl ParticleBuffer {
    /// Allocate `slots` empty particles with ids `0..slots`.
    pub fn new(slots: usize, buffering: Buffering) -> Self {
        let cur: Vec<Particle> = (0..slots as u32).map(Particle::empty).collect();
        let nxt = match buffering {
            Buffering::Single => Vec::new(),
            Buffering::Double => cur.clone(),
        };
        Self { cur, nxt }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cur.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cur.is_empty()
    }

    pub fn buffering(&self) -> Buffering {
        if self.nxt.len() == self.cur.len() && !self.cur.is_empty() {
            Buffering::Double
        } else {
            Buffering::Single
        }
    }

    /// Allocate or release the write buffer. Does not touch `cur`.
    pub fn set_buffering(&mut self, buffering: Buffering) {
        match buffering {
            Buffering::Single => self.nxt = Vec::new(),
            Buffering::Double if self.nxt.len() != self.cur.len() => self.nxt = self.cur.clone(),
            Buffering::Double => {}
        }
    }

    /// Read-only view of the current state.
    #[inline]
    pub fn current(&self) -> &[Particle] {
        &self.cur
    }

    /// Mutable view of the current state, for in-place backends.
    #[inline]
    pub fn current_mut(&mut self) -> &mut [Particle] {
        &mut self.cur
    }

    /// Borrow the current buffer for reading and the next one for writing.
    pub fn slice_rw(&mut self) -> (&[Particle], &mut [Particle]) {
        if self.nxt.len() != self.cur.len() {
            tracing::warn!(slots = self.cur.len(), "write buffer missing; allocating");
            self.set_buffering(Buffering::Double);
        }
        (&self.cur, &mut self.nxt)
    }

    /// Swap current/next buffers at the end of a step. No copy.
    #[inline]
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.cur, &mut self.nxt);
    }

    /// Return every slot to the empty state, keeping ids.
    pub fn reset(&mut self) {
        for (id, slot) in self.cur.iter_mut().enumerate() {
            *slot = Particle::empty(id as u32);
        }
        if !self.nxt.is_empty() {
            self.nxt.copy_from_slice(&self.cur);
        }
    }
}
