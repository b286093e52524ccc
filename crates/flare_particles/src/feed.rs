//! Render feed.
//!
//! After every step the system derives one [`ParticleInstance`] per slot
//! from the current buffer. Instances are `Pod`, laid out for direct upload
//! as a GPU instance buffer. Invisible slots produce an all-zero instance
//! so the buffer stays index-aligned with the particle slots.

use crate::config::RenderConfig;
use crate::particle::Particle;
use crate::spawn::salt;
use flare_core::math::KeyedRng;
use glam::Vec3;
use rayon::prelude::*;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

impl ParticleInstance {
    pub fn is_visible(&self) -> bool {
        self.size > 0.0 || self.color[3] > 0.0
    }
}

/// Derive the render instance for one particle.
pub fn instance(particle: &Particle, render: &RenderConfig, seed: u32) -> ParticleInstance {
    if particle.is_expired() {
        return ParticleInstance::default();
    }
    let pct = particle.lifetime_percentage.clamp(0.0, 1.0);
    let size = render.point_size * (1.0 - render.shrink_over_life * pct);

    let mut rng = KeyedRng::new(seed, particle.id, 0.0, salt::COLOR);
    let j = render.color_jitter;
    let jitter = Vec3::new(rng.symmetric(j), rng.symmetric(j), rng.symmetric(j));
    let rgb = (render.base_color + jitter).clamp(Vec3::ZERO, Vec3::ONE);
    let alpha = if render.fade_out { 1.0 - pct } else { 1.0 };

    ParticleInstance {
        position: particle.position.to_array(),
        size,
        color: [rgb.x, rgb.y, rgb.z, alpha],
    }
}

/// Per-slot render instances, rebuilt in parallel.
#[derive(Debug, Clone, Default)]
pub struct RenderFeed {
    instances: Vec<ParticleInstance>,
    visible: usize,
}

impl RenderFeed {
    pub fn new(slots: usize) -> Self {
        Self {
            instances: vec![ParticleInstance::default(); slots],
            visible: 0,
        }
    }

    pub fn rebuild(&mut self, particles: &[Particle], render: &RenderConfig, seed: u32) {
        if self.instances.len() != particles.len() {
            self.instances.resize(particles.len(), ParticleInstance::default());
        }
        self.visible = self
            .instances
            .par_iter_mut()
            .zip(particles.par_iter())
            .map(|(out, particle)| {
                *out = instance(particle, render, seed);
                usize::from(!particle.is_expired())
            })
            .sum();
    }

    pub fn clear(&mut self) {
        self.instances.fill(ParticleInstance::default());
        self.visible = 0;
    }

    pub fn instances(&self) -> &[ParticleInstance] {
        &self.instances
    }

    pub fn visible(&self) -> usize {
        self.visible
    }
}

/// Read-only view of the simulation between steps.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub particles: &'a [Particle],
    pub instances: &'a [ParticleInstance],
    /// Number of visible (non-expired) slots.
    pub visible: usize,
    /// Clock time of the last completed step.
    pub time: f32,
}

impl<'a> Snapshot<'a> {
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Visible particles paired with their render instance.
    pub fn visible_particles(&self) -> impl Iterator<Item = (&'a Particle, &'a ParticleInstance)> + 'a {
        self.particles
            .iter()
            .zip(self.instances)
            .filter(|(p, _)| !p.is_expired())
    }

    /// Instance buffer as raw bytes for GPU upload.
    pub fn instance_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.instances)
    }
}
