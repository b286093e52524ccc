//! Per-particle update shared by every backend.
//!
//! [`advance`] is the single source of truth for one particle over one
//! step. It reads only its own slot plus the step context, which is what
//! lets the parallel backends run it on every slot concurrently.

use crate::collision;
use crate::config::SimulationParams;
use crate::forces;
use crate::lifecycle;
use crate::particle::Particle;
use crate::spawn;
use crate::throttle::StepThrottle;

/// Everything a worker needs for one step. Shared read-only by all workers.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub params: &'a SimulationParams,
    pub delta_time: f32,
    pub now: f32,
    pub throttle: &'a StepThrottle,
}

/// What happened to a slot during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transition {
    pub spawned: bool,
    pub expired: bool,
    pub collided: bool,
    pub visible: bool,
}

/// Counts reduced over all slots of a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub spawned: u32,
    pub expired: u32,
    pub collisions: u32,
    pub visible: u32,
}

impl StepStats {
    #[inline]
    pub fn record(&mut self, t: Transition) {
        self.spawned += t.spawned as u32;
        self.expired += t.expired as u32;
        self.collisions += t.collided as u32;
        self.visible += t.visible as u32;
    }

    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Self {
            spawned: self.spawned + other.spawned,
            expired: self.expired + other.expired,
            collisions: self.collisions + other.collisions,
            visible: self.visible + other.visible,
        }
    }
}

impl From<Transition> for StepStats {
    fn from(t: Transition) -> Self {
        let mut stats = Self::default();
        stats.record(t);
        stats
    }
}

/// Advance `particle` (stored in `slot`) by one step.
///
/// Order: respawn an expired slot if the throttle grants it, otherwise
/// age it, expire it, or integrate forces and resolve the ground plane.
/// A slot respawned this step does not integrate until the next one.
pub fn advance(particle: &Particle, slot: usize, ctx: &StepContext<'_>) -> (Particle, Transition) {
    let config = &ctx.params.config;
    let mut next = *particle;

    if lifecycle::is_respawn_candidate(particle) {
        if ctx.throttle.try_claim(slot) {
            let spawned = spawn::respawn(particle.id, ctx.now, config);
            return (
                spawned,
                Transition {
                    spawned: true,
                    visible: true,
                    ..Default::default()
                },
            );
        }
        next.velocity = glam::Vec3::ZERO;
        return (next, Transition::default());
    }

    next.lifetime_percentage =
        lifecycle::lifetime_percentage(particle, ctx.now, config.generation.enabled);
    if next.is_expired() {
        lifecycle::expire(&mut next);
        return (
            next,
            Transition {
                expired: true,
                ..Default::default()
            },
        );
    }

    let acceleration =
        forces::acceleration(next.velocity, next.weight, config.gravity, &config.fluid);
    let (position, velocity) = forces::integrate(
        next.position,
        next.velocity,
        acceleration,
        ctx.delta_time,
        config.max_velocity,
    );
    next.position = position;
    next.velocity = velocity;

    let mut collided = false;
    if let Some(ground) = &ctx.params.ground {
        let r = collision::resolve(
            next.position,
            next.velocity,
            ground,
            config.bounce_factor,
            config.max_velocity,
        );
        next.position = r.position;
        next.velocity = r.velocity;
        collided = r.collided;
    }

    (
        next,
        Transition {
            collided,
            visible: true,
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParticleConfig;
    use crate::throttle::GenerationThrottle;
    use glam::Vec3;

    fn params(config: ParticleConfig) -> SimulationParams {
        SimulationParams::resolve(config).unwrap()
    }

    #[test]
    fn live_particle_integrates_and_bounces() {
        let params = params(ParticleConfig {
            gravity: Vec3::ZERO,
            ..Default::default()
        });
        let throttle = GenerationThrottle::new().closed();
        let ctx = StepContext {
            params: &params,
            delta_time: 0.1,
            now: 0.1,
            throttle: &throttle,
        };
        let p = Particle::new(0, Vec3::new(0.0, 0.05, 0.0), Vec3::new(0.0, -2.0, 0.0));
        let (next, t) = advance(&p, 0, &ctx);
        assert!(t.collided && t.visible && !t.spawned && !t.expired);
        assert!(next.position.y.abs() < 1e-6);
        assert!((next.velocity.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn timed_out_particle_expires_in_place() {
        let params = params(ParticleConfig::default());
        let throttle = GenerationThrottle::new().closed();
        let ctx = StepContext {
            params: &params,
            delta_time: 0.1,
            now: 1.0,
            throttle: &throttle,
        };
        let p = Particle::new(0, Vec3::new(0.0, 5.0, 0.0), Vec3::X).with_lifetime(0.0, 1.0);
        let (next, t) = advance(&p, 0, &ctx);
        assert!(t.expired && !t.visible);
        assert!(next.is_expired());
        assert_eq!(next.position, p.position);
        assert_eq!(next.velocity, Vec3::ZERO);
    }

    #[test]
    fn granted_candidate_respawns() {
        let params = params(ParticleConfig::default());
        let throttle = GenerationThrottle::new().open(2.0, 1, usize::MAX);
        let ctx = StepContext {
            params: &params,
            delta_time: 0.1,
            now: 2.0,
            throttle: &throttle,
        };
        let (first, t) = advance(&Particle::empty(4), 4, &ctx);
        assert!(t.spawned);
        assert_eq!(first, spawn::respawn(4, 2.0, &params.config));

        let (second, t) = advance(&Particle::empty(5), 5, &ctx);
        assert!(!t.spawned);
        assert!(second.is_expired());
    }

    #[test]
    fn stats_merge_adds_counts() {
        let mut a = StepStats::default();
        a.record(Transition {
            spawned: true,
            visible: true,
            ..Default::default()
        });
        let b = StepStats::from(Transition {
            collided: true,
            visible: true,
            ..Default::default()
        });
        assert_eq!(
            a.merge(b),
            StepStats {
                spawned: 1,
                expired: 0,
                collisions: 1,
                visible: 2
            }
        );
    }
}
