//! Simulation parameters.
//!
//! Every section deserializes with defaults, so a settings file only needs
//! the fields it changes:
//!
//! ```ignore
//! {
//!     "max_particles": 50000,
//!     "generation": { "delay": 0.05, "batch_size": 512 },
//!     "fluid": { "enabled": true }
//! }
//! ```
//!
//! [`SimulationParams::resolve`] validates a [`ParticleConfig`] and derives
//! the values the per-particle kernel needs (the rotated ground normal).

use crate::collision::GroundPlane;
use crate::error::ConfigError;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn constant(value: f32) -> Self {
        Self { min: value, max: value }
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        finite(field, self.min)?;
        finite(field, self.max)?;
        if self.min > self.max {
            return Err(ConfigError::InvalidRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Axis-aligned spawn volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl SpawnBounds {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub const fn point(at: Vec3) -> Self {
        Self { min: at, max: at }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        ValueRange::new(self.min.x, self.max.x).validate("spawn_bounds.x")?;
        ValueRange::new(self.min.y, self.max.y).validate("spawn_bounds.y")?;
        ValueRange::new(self.min.z, self.max.z).validate("spawn_bounds.z")
    }
}

impl Default for SpawnBounds {
    fn default() -> Self {
        Self::new(Vec3::new(-5.0, 8.0, -5.0), Vec3::new(5.0, 12.0, 5.0))
    }
}

/// Ground plane: a base normal rotated by pitch (about X) then yaw (about Y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundPlaneConfig {
    pub normal: Vec3,
    pub pitch_degrees: f32,
    pub yaw_degrees: f32,
    /// Signed distance of the plane from the origin along the normal.
    pub height: f32,
}

impl Default for GroundPlaneConfig {
    fn default() -> Self {
        Self {
            normal: Vec3::Y,
            pitch_degrees: 0.0,
            yaw_degrees: 0.0,
            height: 0.0,
        }
    }
}

/// Recurring respawn of expired slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub enabled: bool,
    /// Minimum clock time between generation events.
    pub delay: f32,
    /// Maximum respawns in a single step.
    pub batch_size: u32,
    pub lifetime: ValueRange,
    /// Spawn with `lifetime = 0` instead of sampling `lifetime`.
    pub immortal: bool,
    /// Upper bound of the random forward offset added to `spawn_time`.
    pub spawn_time_jitter: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: 0.0,
            batch_size: 256,
            lifetime: ValueRange::new(2.0, 5.0),
            immortal: false,
            spawn_time_jitter: 0.0,
        }
    }
}

/// Pressure/viscosity damping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidConfig {
    pub enabled: bool,
    pub pressure: f32,
    pub viscosity: f32,
    /// Damping is clamped to `|adjusted gravity| * force_multiplier`.
    pub force_multiplier: f32,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pressure: 0.5,
            viscosity: 0.1,
            force_multiplier: 1.0,
        }
    }
}

/// Inputs for the derived render attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub point_size: f32,
    /// Fraction of `point_size` lost by the end of life, in `[0, 1]`.
    pub shrink_over_life: f32,
    pub base_color: Vec3,
    /// Per-channel symmetric jitter keyed by slot id.
    pub color_jitter: f32,
    pub fade_out: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            point_size: 4.0,
            shrink_over_life: 0.5,
            base_color: Vec3::new(1.0, 0.6, 0.2),
            color_jitter: 0.1,
            fade_out: true,
        }
    }
}

/// Full particle simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub max_particles: usize,
    /// Seed mixed into every keyed random draw.
    pub seed: u32,
    pub spawn_bounds: SpawnBounds,
    /// Half-extent of the per-axis spawn velocity range.
    pub spawn_speed: f32,
    pub weight: ValueRange,
    pub gravity: Vec3,
    pub bounce_factor: f32,
    pub ground: Option<GroundPlaneConfig>,
    pub max_velocity: f32,
    pub generation: GenerationConfig,
    pub fluid: FluidConfig,
    pub render: RenderConfig,
    /// Worker threads for the parallel backends; `None` uses the global pool.
    pub workers: Option<usize>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_particles: 10_000,
            seed: 0x5eed,
            spawn_bounds: SpawnBounds::default(),
            spawn_speed: 1.0,
            weight: ValueRange::new(0.8, 1.2),
            gravity: Vec3::new(0.0, -9.8, 0.0),
            bounce_factor: 0.5,
            ground: Some(GroundPlaneConfig::default()),
            max_velocity: 50.0,
            generation: GenerationConfig::default(),
            fluid: FluidConfig::default(),
            render: RenderConfig::default(),
            workers: None,
        }
    }
}

impl ParticleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_particles == 0 {
            return Err(ConfigError::NoParticles);
        }
        let max_slots = u32::MAX as usize;
        if self.max_particles > max_slots {
            return Err(ConfigError::TooManyParticles {
                requested: self.max_particles,
                max: max_slots,
            });
        }
        if self.workers == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }

        self.spawn_bounds.validate()?;
        non_negative("spawn_speed", self.spawn_speed)?;
        self.weight.validate("weight")?;
        if self.weight.min <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "weight.min",
                value: self.weight.min,
            });
        }
        finite_vec("gravity", self.gravity)?;
        non_negative("bounce_factor", self.bounce_factor)?;
        non_negative("max_velocity", self.max_velocity)?;

        if let Some(ground) = &self.ground {
            finite_vec("ground.normal", ground.normal)?;
            finite("ground.pitch_degrees", ground.pitch_degrees)?;
            finite("ground.yaw_degrees", ground.yaw_degrees)?;
            finite("ground.height", ground.height)?;
        }

        let generation = &self.generation;
        non_negative("generation.delay", generation.delay)?;
        non_negative("generation.spawn_time_jitter", generation.spawn_time_jitter)?;
        generation.lifetime.validate("generation.lifetime")?;
        non_negative("generation.lifetime.min", generation.lifetime.min)?;
        if generation.enabled && generation.batch_size == 0 {
            return Err(ConfigError::ZeroBatch);
        }

        non_negative("fluid.pressure", self.fluid.pressure)?;
        non_negative("fluid.viscosity", self.fluid.viscosity)?;
        non_negative("fluid.force_multiplier", self.fluid.force_multiplier)?;

        non_negative("render.point_size", self.render.point_size)?;
        let shrink = self.render.shrink_over_life;
        finite("render.shrink_over_life", shrink)?;
        if !ValueRange::new(0.0, 1.0).contains(shrink) {
            return Err(ConfigError::OutOfRange {
                field: "render.shrink_over_life",
                value: shrink,
                min: 0.0,
                max: 1.0,
            });
        }
        finite_vec("render.base_color", self.render.base_color)?;
        non_negative("render.color_jitter", self.render.color_jitter)?;
        Ok(())
    }
}

/// A validated configuration plus values derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub config: ParticleConfig,
    pub ground: Option<GroundPlane>,
}

impl SimulationParams {
    pub fn resolve(config: ParticleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let ground = config
            .ground
            .as_ref()
            .map(GroundPlane::from_config)
            .transpose()?;
        Ok(Self { config, ground })
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn finite_vec(field: &'static str, value: Vec3) -> Result<(), ConfigError> {
    finite(field, value.x)?;
    finite(field, value.y)?;
    finite(field, value.z)
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let params = SimulationParams::resolve(ParticleConfig::default()).unwrap();
        let ground = params.ground.unwrap();
        assert!((ground.normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn zero_particles_rejected() {
        let config = ParticleConfig {
            max_particles: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoParticles));
    }

    #[test]
    fn inverted_ranges_rejected() {
        let mut config = ParticleConfig::default();
        config.generation.lifetime = ValueRange::new(3.0, 1.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRange {
                field: "generation.lifetime",
                min: 3.0,
                max: 1.0
            })
        );

        let mut config = ParticleConfig::default();
        config.spawn_bounds = SpawnBounds::new(Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { field: "spawn_bounds.y", .. })
        ));

        let mut config = ParticleConfig::default();
        config.weight = ValueRange::new(2.0, 1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { field: "weight", .. })
        ));
    }

    #[test]
    fn non_positive_weight_rejected() {
        let mut config = ParticleConfig::default();
        config.weight = ValueRange::new(0.0, 1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "weight.min", .. })
        ));
    }

    #[test]
    fn degenerate_ground_normal_rejected() {
        let mut config = ParticleConfig::default();
        config.ground = Some(GroundPlaneConfig {
            normal: Vec3::ZERO,
            ..Default::default()
        });
        assert!(matches!(
            SimulationParams::resolve(config),
            Err(ConfigError::DegenerateNormal { .. })
        ));

        let mut config = ParticleConfig::default();
        config.ground = Some(GroundPlaneConfig {
            normal: Vec3::new(f32::NAN, 1.0, 0.0),
            ..Default::default()
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite { field: "ground.normal", .. })
        ));
    }

    #[test]
    fn zero_batch_only_matters_when_generating() {
        let mut config = ParticleConfig::default();
        config.generation.batch_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroBatch));

        config.generation.enabled = false;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn negative_magnitudes_rejected() {
        let mut config = ParticleConfig::default();
        config.max_velocity = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative { field: "max_velocity", .. })
        ));

        let mut config = ParticleConfig::default();
        config.generation.delay = -0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative { field: "generation.delay", .. })
        ));

        let mut config = ParticleConfig::default();
        config.workers = Some(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroWorkers));
    }

    #[test]
    fn shrink_must_be_a_fraction() {
        let mut config = ParticleConfig::default();
        config.render.shrink_over_life = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "render.shrink_over_life", .. })
        ));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let json = r#"{
            "max_particles": 64,
            "gravity": [0.0, -1.0, 0.0],
            "ground": null,
            "generation": { "delay": 2.0, "batch_size": 1 },
            "fluid": { "enabled": true }
        }"#;
        let config: ParticleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_particles, 64);
        assert_eq!(config.gravity, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(config.ground, None);
        assert_eq!(config.generation.delay, 2.0);
        assert_eq!(config.generation.batch_size, 1);
        assert!(config.generation.enabled);
        assert_eq!(config.generation.lifetime, ValueRange::new(2.0, 5.0));
        assert!(config.fluid.enabled);
        assert_eq!(config.fluid.pressure, 0.5);
        assert_eq!(config.validate(), Ok(()));
    }
}
