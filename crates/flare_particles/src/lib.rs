//! Flare Particles
//!
//! CPU particle simulation with interchangeable execution backends.
//!
//! Every slot is advanced by the same per-particle kernel: lifecycle,
//! throttled respawn, forces, ground collision. The [`backend`] module
//! decides how the sweep is scheduled: a single thread, rayon workers over
//! a double buffer, or rayon workers in place. All three produce the same
//! state for the same inputs.
//!
//! # Feature Flags
//!
//! - `metrics` - Record step/feed phase timings and spawn counters (default: enabled)

pub mod backend;
pub mod buffer;
pub mod collision;
pub mod config;
pub mod error;
pub mod feed;
pub mod forces;
pub mod kernel;
pub mod lifecycle;
pub mod particle;
pub mod spawn;
pub mod system;
pub mod throttle;

pub use backend::{Backend, BackendKind};
pub use config::ParticleConfig;
pub use error::{ConfigError, SimulationError};
pub use feed::{ParticleInstance, Snapshot};
pub use kernel::StepStats;
pub use particle::Particle;
pub use system::{ParticleSystem, SimulationStats};

/// Common imports for embedding the simulation.
pub mod prelude {
    pub use crate::backend::{Backend, BackendKind};
    pub use crate::config::{
        FluidConfig, GenerationConfig, GroundPlaneConfig, ParticleConfig, RenderConfig,
        SpawnBounds, ValueRange,
    };
    pub use crate::error::{ConfigError, SimulationError};
    pub use crate::feed::{ParticleInstance, Snapshot};
    pub use crate::kernel::StepStats;
    pub use crate::particle::Particle;
    pub use crate::system::{ParticleSystem, SimulationStats};
}
