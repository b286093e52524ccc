//! Benchmark settings

use anyhow::{Context, Result};
use flare_core::time::DEFAULT_TICK_RATE_HZ;
use flare_particles::{BackendKind, ParticleConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One benchmark run: which backends to drive, for how long, on what scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    pub frames: u32,
    pub tick_rate_hz: u32,
    pub backends: Vec<BackendKind>,
    /// Frames stepped before timing starts.
    pub warmup_frames: u32,
    pub particles: ParticleConfig,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            frames: 600,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            backends: BackendKind::ALL.to_vec(),
            warmup_frames: 30,
            particles: ParticleConfig::default(),
        }
    }
}

impl BenchmarkSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_defaults() {
        let settings = BenchmarkSettings::from_json(
            r#"{ "frames": 10, "backends": ["in-place"], "particles": { "max_particles": 64 } }"#,
        )
        .unwrap();
        assert_eq!(settings.frames, 10);
        assert_eq!(settings.tick_rate_hz, 60);
        assert_eq!(settings.backends, vec![BackendKind::InPlaceParallel]);
        assert_eq!(settings.particles.max_particles, 64);
        assert!(settings.particles.generation.enabled);
    }

    #[test]
    fn default_settings_survive_json() {
        let settings = BenchmarkSettings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(BenchmarkSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(BenchmarkSettings::from_json(r#"{ "backends": ["gpu"] }"#).is_err());
    }
}
