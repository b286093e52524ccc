//! Respawn sampling.
//!
//! Every field draws from its own keyed stream `(seed, slot, now, salt)`,
//! so the same slot respawned at the same time is bit-identical no matter
//! which backend or thread performs it.

use crate::config::ParticleConfig;
use crate::forces::clamp_speed;
use crate::particle::Particle;
use flare_core::math::KeyedRng;
use glam::Vec3;

/// Per-field salts for keyed draws.
pub mod salt {
    pub const POSITION: u32 = 0x01;
    pub const VELOCITY: u32 = 0x02;
    pub const LIFETIME: u32 = 0x03;
    pub const SPAWN_JITTER: u32 = 0x04;
    pub const WEIGHT: u32 = 0x05;
    pub const COLOR: u32 = 0x06;
}

/// Reinitialize slot `id` at clock time `now`.
pub fn respawn(id: u32, now: f32, config: &ParticleConfig) -> Particle {
    let seed = config.seed;
    let generation = &config.generation;

    let position = KeyedRng::new(seed, id, now, salt::POSITION)
        .point_in_box(config.spawn_bounds.min, config.spawn_bounds.max);

    let mut rng = KeyedRng::new(seed, id, now, salt::VELOCITY);
    let s = config.spawn_speed;
    let velocity = Vec3::new(rng.symmetric(s), rng.symmetric(s), rng.symmetric(s));

    let lifetime = if generation.immortal {
        0.0
    } else {
        KeyedRng::new(seed, id, now, salt::LIFETIME)
            .range(generation.lifetime.min, generation.lifetime.max)
    };

    let jitter = KeyedRng::new(seed, id, now, salt::SPAWN_JITTER).next_f32()
        * generation.spawn_time_jitter;

    let weight = KeyedRng::new(seed, id, now, salt::WEIGHT).range(config.weight.min, config.weight.max);

    Particle {
        position,
        velocity: clamp_speed(velocity, config.max_velocity),
        spawn_time: now + jitter,
        lifetime,
        lifetime_percentage: 0.0,
        weight,
        id,
    }
}
