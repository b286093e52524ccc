//! Flare Core
//!
//! Shared building blocks for the simulation crates:
//! - Deterministic keyed random source
//! - Fixed-tick simulation clock
//! - glam re-export

pub mod math;
pub mod time;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
