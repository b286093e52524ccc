//! Force model: gravity scaled by particle weight plus optional fluid damping.
//!
//! All functions are pure. Degenerate inputs (zero velocity, zero gravity)
//! produce a zero contribution rather than NaNs.

use crate::config::FluidConfig;
use glam::Vec3;

/// Gravity divided by `weight`, so heavier particles fall more slowly.
///
/// A non-positive or non-finite weight leaves gravity unscaled.
#[inline]
pub fn adjusted_gravity(gravity: Vec3, weight: f32) -> Vec3 {
    if weight.is_finite() && weight > 0.0 {
        gravity / weight
    } else {
        gravity
    }
}

/// Pressure plus viscosity damping, clamped to
/// `|adjusted_gravity| * force_multiplier`.
#[inline]
pub fn fluid_damping(velocity: Vec3, adjusted_gravity: Vec3, fluid: &FluidConfig) -> Vec3 {
    let pressure = -velocity.normalize_or_zero() * fluid.pressure;
    let viscosity = -velocity * fluid.viscosity;
    let limit = adjusted_gravity.length() * fluid.force_multiplier;
    (pressure + viscosity).clamp_length_max(limit)
}

/// Total acceleration acting on a particle this step.
#[inline]
pub fn acceleration(velocity: Vec3, weight: f32, gravity: Vec3, fluid: &FluidConfig) -> Vec3 {
    let gravity = adjusted_gravity(gravity, weight);
    if fluid.enabled {
        gravity + fluid_damping(velocity, gravity, fluid)
    } else {
        gravity
    }
}

#[inline]
pub fn clamp_speed(velocity: Vec3, max_velocity: f32) -> Vec3 {
    velocity.clamp_length_max(max_velocity)
}

/// Semi-implicit Euler: velocity first (clamped), then position.
///
/// Returns `(position, velocity)`.
#[inline]
pub fn integrate(
    position: Vec3,
    velocity: Vec3,
    acceleration: Vec3,
    delta_time: f32,
    max_velocity: f32,
) -> (Vec3, Vec3) {
    let velocity = clamp_speed(velocity + acceleration * delta_time, max_velocity);
    (position + velocity * delta_time, velocity)
}
