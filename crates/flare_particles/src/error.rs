use thiserror::Error;

/// Rejected simulation parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_particles must be greater than zero")]
    NoParticles,

    #[error("max_particles {requested} exceeds the slot id range ({max})")]
    TooManyParticles { requested: usize, max: usize },

    #[error("{field}: min {min} is greater than max {max}")]
    InvalidRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("generation batch_size must be at least 1 when generation is enabled")]
    ZeroBatch,

    #[error("ground plane normal {normal:?} cannot be normalized")]
    DegenerateNormal { normal: [f32; 3] },

    #[error("workers must be at least 1 when set")]
    ZeroWorkers,
}

/// Errors surfaced by [`ParticleSystem`](crate::ParticleSystem).
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid particle configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("particle system is not configured")]
    NotConfigured,

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
