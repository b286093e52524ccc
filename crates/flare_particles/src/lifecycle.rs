//! Particle aging and expiry.

use crate::particle::Particle;
use glam::Vec3;

/// Normalized age at `now`.
///
/// Timed particles report `clamp((now - spawn_time) / lifetime, 0, 1)`.
/// Particles without a timer are immortal only while `generating`: they
/// keep their stored value (`0.0` live, `1.0` empty). Without generation a
/// timerless particle is expired as soon as it is stepped. The result never
/// falls below the stored value, so age cannot run backwards within a
/// lifespan.
#[inline]
pub fn lifetime_percentage(particle: &Particle, now: f32, generating: bool) -> f32 {
    if particle.lifetime > 0.0 {
        let pct = ((now - particle.spawn_time) / particle.lifetime).clamp(0.0, 1.0);
        pct.max(particle.lifetime_percentage)
    } else if generating {
        particle.lifetime_percentage
    } else {
        Particle::EXPIRED
    }
}

/// Mark a particle expired and stop it in place.
#[inline]
pub fn expire(particle: &mut Particle) {
    particle.lifetime_percentage = Particle::EXPIRED;
    particle.velocity = Vec3::ZERO;
}

/// Slots that may be handed to the generation throttle this step.
#[inline]
pub fn is_respawn_candidate(particle: &Particle) -> bool {
    particle.is_expired()
}
