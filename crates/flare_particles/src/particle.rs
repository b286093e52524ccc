//! Particle record stored in every simulation slot.

use glam::Vec3;

/// State of one particle slot.
///
/// Slots are allocated once at configuration and recycled forever. An
/// empty slot is indistinguishable from an expired particle: its
/// `lifetime_percentage` is `1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Clock time of the last (re)spawn.
    pub spawn_time: f32,
    /// Seconds until expiry; `<= 0` never expires via the timer.
    pub lifetime: f32,
    /// Normalized age in `[0, 1]`; `1.0` is expired.
    pub lifetime_percentage: f32,
    /// Gravity divisor assigned at spawn.
    pub weight: f32,
    /// Stable slot identity.
    pub id: u32,
}

impl Particle {
    /// Percentage at which a particle counts as expired.
    pub const EXPIRED: f32 = 1.0;

    /// An empty slot.
    pub fn empty(id: u32) -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            spawn_time: 0.0,
            lifetime: 0.0,
            lifetime_percentage: Self::EXPIRED,
            weight: 1.0,
            id,
        }
    }

    /// A live, immortal particle spawned at time zero with unit weight.
    pub fn new(id: u32, position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            spawn_time: 0.0,
            lifetime: 0.0,
            lifetime_percentage: 0.0,
            weight: 1.0,
            id,
        }
    }

    pub fn with_lifetime(mut self, spawn_time: f32, lifetime: f32) -> Self {
        self.spawn_time = spawn_time;
        self.lifetime = lifetime;
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.lifetime_percentage >= Self::EXPIRED
    }

    #[inline]
    pub fn is_immortal(&self) -> bool {
        self.lifetime <= 0.0
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::empty(0)
    }
}
