//! Ground-plane collision.

use crate::config::GroundPlaneConfig;
use crate::error::ConfigError;
use crate::forces::clamp_speed;
use glam::{Quat, Vec3};

/// Plane `dot(p, normal) = height` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    pub normal: Vec3,
    pub height: f32,
}

impl GroundPlane {
    /// Rotate `base` by `pitch` about X, then by `yaw` about Y, and normalize.
    ///
    /// Returns `None` when the result cannot be normalized.
    pub fn from_angles(base: Vec3, pitch_degrees: f32, yaw_degrees: f32, height: f32) -> Option<Self> {
        let pitch = Quat::from_rotation_x(pitch_degrees.to_radians());
        let yaw = Quat::from_rotation_y(yaw_degrees.to_radians());
        let normal = (yaw * (pitch * base)).try_normalize()?;
        Some(Self { normal, height })
    }

    pub fn from_config(config: &GroundPlaneConfig) -> Result<Self, ConfigError> {
        Self::from_angles(
            config.normal,
            config.pitch_degrees,
            config.yaw_degrees,
            config.height,
        )
        .ok_or(ConfigError::DegenerateNormal {
            normal: config.normal.to_array(),
        })
    }

    /// Positive above the plane, negative below.
    #[inline]
    pub fn signed_distance(&self, position: Vec3) -> f32 {
        position.dot(self.normal) - self.height
    }
}

/// Mirror `v` about the plane with unit normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub position: Vec3,
    pub velocity: Vec3,
    pub collided: bool,
}

/// Push a penetrating particle back onto the plane and bounce its velocity.
pub fn resolve(
    position: Vec3,
    velocity: Vec3,
    plane: &GroundPlane,
    bounce_factor: f32,
    max_velocity: f32,
) -> Resolution {
    let d = plane.signed_distance(position);
    if d >= 0.0 || d.is_nan() {
        return Resolution {
            position,
            velocity,
            collided: false,
        };
    }

    let velocity = clamp_speed(reflect(velocity, plane.normal) * bounce_factor, max_velocity);
    Resolution {
        position: position - plane.normal * d,
        velocity,
        collided: true,
    }
}
