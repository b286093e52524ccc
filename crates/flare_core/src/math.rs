//! Deterministic math utilities
//!
//! Re-exports glam with a keyed random source. Every draw is a pure
//! function of `(seed, slot, time, salt)`, so any worker on any thread
//! reproduces the same value for the same particle and frame.

pub use glam::*;

const GOLDEN: u32 = 0x9e37_79b9;

/// Integer avalanche hash (lowbias32).
#[inline]
pub fn hash_u32(n: u32) -> u32 {
    let mut x = n;
    x ^= x >> 16;
    x = x.wrapping_mul(0x7feb_352d);
    x ^= x >> 15;
    x = x.wrapping_mul(0x846c_a68b);
    x ^= x >> 16;
    x
}

/// Bit pattern of a timestamp with `-0.0` folded onto `0.0`.
#[inline]
fn time_bits(time: f32) -> u32 {
    if time == 0.0 {
        0
    } else {
        time.to_bits()
    }
}

/// Random stream keyed by particle slot, clock time, and a field salt.
#[derive(Debug, Clone, Copy)]
pub struct KeyedRng {
    state: u32,
}

impl KeyedRng {
    pub fn new(seed: u32, slot: u32, time: f32, salt: u32) -> Self {
        let mut h = hash_u32(seed ^ GOLDEN);
        h = hash_u32(h ^ slot);
        h = hash_u32(h ^ time_bits(time));
        h = hash_u32(h ^ salt.wrapping_mul(GOLDEN));
        Self { state: h }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = hash_u32(self.state.wrapping_add(GOLDEN));
        self.state
    }

    /// Uniform in `[0, 1)` with 24 bits of mantissa.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }

    /// Uniform in `[min, max]`; a collapsed range returns `min`.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    /// Uniform in `[-half_extent, half_extent]`.
    pub fn symmetric(&mut self, half_extent: f32) -> f32 {
        self.range(-half_extent, half_extent)
    }

    /// Uniform point inside the box spanned by `min` and `max`.
    pub fn point_in_box(&mut self, min: Vec3, max: Vec3) -> Vec3 {
        Vec3::new(
            self.range(min.x, max.x),
            self.range(min.y, max.y),
            self.range(min.z, max.z),
        )
    }
}

/// Single uniform draw in `[0, 1)` for `(seed, slot, time, salt)`.
#[inline]
pub fn keyed_unit(seed: u32, slot: u32, time: f32, salt: u32) -> f32 {
    KeyedRng::new(seed, slot, time, salt).next_f32()
}
