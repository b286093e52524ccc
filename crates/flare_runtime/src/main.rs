//! Flare Runtime
//!
//! Benchmark binary: steps the particle simulation on every backend and
//! prints a JSON report.

mod bench;
mod settings;

use anyhow::{bail, Result};
use clap::Parser;
use flare_particles::BackendKind;
use settings::BenchmarkSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "flare", version, about = "Particle simulation benchmark")]
struct Cli {
    /// JSON settings file; missing fields take their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Timed frames per backend
    #[arg(short, long)]
    frames: Option<u32>,

    /// Backend to run (repeatable): sequential, double-buffered, in-place
    #[arg(short, long = "backend")]
    backends: Vec<BackendKind>,

    /// Slot count override
    #[arg(short = 'n', long)]
    particles: Option<usize>,

    /// Worker threads for the parallel backends
    #[arg(short, long)]
    workers: Option<usize>,

    /// Check that all backends end in the same state
    #[arg(long)]
    compare: bool,

    /// Print the default settings as JSON and exit
    #[arg(long)]
    dump_default: bool,
}

impl Cli {
    fn settings(&self) -> Result<BenchmarkSettings> {
        let mut settings = match &self.config {
            Some(path) => BenchmarkSettings::load(path)?,
            None => BenchmarkSettings::default(),
        };
        if let Some(frames) = self.frames {
            settings.frames = frames;
        }
        if !self.backends.is_empty() {
            settings.backends = self.backends.clone();
        }
        if let Some(particles) = self.particles {
            settings.particles.max_particles = particles;
        }
        if self.workers.is_some() {
            settings.particles.workers = self.workers;
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.dump_default {
        println!("{}", BenchmarkSettings::default().to_json()?);
        return Ok(());
    }

    tracing::info!("Flare v{}", flare_core::VERSION);
    let settings = cli.settings()?;
    if settings.backends.is_empty() {
        bail!("no backends selected");
    }

    let report = bench::run(&settings, cli.compare)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(deviations) = &report.comparison {
        if let Some(bad) = deviations.iter().find(|d| !d.is_equivalent(1e-4)) {
            bail!(
                "{} diverged from {}: position {:.6}, velocity {:.6}, {} slot(s) differ",
                bad.backend,
                bad.reference,
                bad.max_position,
                bad.max_velocity,
                bad.mismatched_slots
            );
        }
        tracing::info!("all backends agree");
    }
    Ok(())
}
