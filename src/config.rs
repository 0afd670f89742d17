//! Simulation configuration
//!
//! Read once at session construction; there is no runtime reconfiguration.
//! Stored as JSON, missing fields fall back to the defaults in [`crate::consts`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{
    MAX_FULL_PAIRS_PARTICLES, MAX_PARTICLES, PARTICLE_COUNT, PROXIMITY_THRESHOLD, SPEED,
};
use crate::error::ConfigError;
use crate::pair_count;
use crate::sim::{Dimensions, EdgeStrategy, ResortPolicy};

/// Clear color behind the particles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    #[default]
    Light,
    Dark,
}

impl Background {
    pub fn as_str(&self) -> &'static str {
        match self {
            Background::Light => "Light",
            Background::Dark => "Dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "light" => Some(Background::Light),
            "dark" => Some(Background::Dark),
            _ => None,
        }
    }

    /// RGBA clear color
    pub fn clear_color(&self) -> [f32; 4] {
        match self {
            Background::Light => [0.95, 0.95, 0.95, 0.0],
            Background::Dark => [0.2, 0.2, 0.2, 1.0],
        }
    }

    /// Dark at night (before 6:00, after 19:59), light otherwise
    pub fn for_hour(hour: u32) -> Self {
        if !(6..=19).contains(&hour) {
            Background::Dark
        } else {
            Background::Light
        }
    }

    /// Cycle to the next background
    pub fn next(&self) -> Self {
        match self {
            Background::Light => Background::Dark,
            Background::Dark => Background::Light,
        }
    }

    /// Whether frames should be cleared before drawing (light frames accumulate)
    pub fn clears(&self) -> bool {
        matches!(self, Background::Dark)
    }
}

/// Construction-time simulation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of particles, fixed for the session
    pub particle_count: usize,
    /// Maximum distance for an edge (inclusive)
    pub threshold: f32,
    /// Initial velocity components are drawn from `[-speed, speed)`
    pub speed: f32,
    /// 2D or 3D
    pub dimensions: Dimensions,
    /// How edges are produced each tick
    pub strategy: EdgeStrategy,
    /// How sorted axis views are refreshed (`SortedAxes` only)
    pub resort: ResortPolicy,
    /// RNG seed; a random one is drawn (and logged) when absent
    pub seed: Option<u64>,
    /// Initial background
    pub background: Background,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            particle_count: PARTICLE_COUNT,
            threshold: PROXIMITY_THRESHOLD,
            speed: SPEED,
            dimensions: Dimensions::Two,
            strategy: EdgeStrategy::FullPairs,
            resort: ResortPolicy::Full,
            seed: None,
            background: Background::Light,
        }
    }
}

impl SimConfig {
    /// Fail fast on values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::NoParticles);
        }
        let max = self.max_particles();
        if self.particle_count > max {
            return Err(ConfigError::TooManyParticles {
                count: self.particle_count,
                max,
            });
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(ConfigError::InvalidSpeed(self.speed));
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Config saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Largest particle count the configured strategy accepts
    pub fn max_particles(&self) -> usize {
        if self.strategy.is_filtered() {
            MAX_PARTICLES
        } else {
            MAX_FULL_PAIRS_PARTICLES
        }
    }

    /// Segment count of a full pair list
    pub fn max_segments(&self) -> usize {
        pair_count(self.particle_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.particle_count, 400);
        assert_eq!(config.max_segments(), 79_800);
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero = SimConfig {
            particle_count: 0,
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::NoParticles)));

        let threshold = SimConfig {
            threshold: 0.0,
            ..Default::default()
        };
        assert!(matches!(threshold.validate(), Err(ConfigError::InvalidThreshold(_))));

        let nan = SimConfig {
            threshold: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(nan.validate(), Err(ConfigError::InvalidThreshold(_))));

        let speed = SimConfig {
            speed: -0.1,
            ..Default::default()
        };
        assert!(matches!(speed.validate(), Err(ConfigError::InvalidSpeed(_))));
    }

    #[test]
    fn test_rejects_particle_counts_beyond_limit() {
        let full = SimConfig {
            particle_count: MAX_FULL_PAIRS_PARTICLES + 1,
            ..Default::default()
        };
        assert!(matches!(
            full.validate(),
            Err(ConfigError::TooManyParticles { max: MAX_FULL_PAIRS_PARTICLES, .. })
        ));

        // Filtered strategies only store the edges they emit
        let grid = SimConfig {
            particle_count: 100_000,
            threshold: 0.01,
            strategy: EdgeStrategy::Grid,
            ..Default::default()
        };
        assert!(grid.validate().is_ok());

        let huge = SimConfig {
            particle_count: usize::MAX,
            strategy: EdgeStrategy::Grid,
            ..Default::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::TooManyParticles { max: MAX_PARTICLES, .. })
        ));
        assert!(
            SimConfig {
                particle_count: MAX_PARTICLES,
                strategy: EdgeStrategy::BruteForce,
                ..Default::default()
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json(
            r#"{ "particle_count": 50, "dimensions": 3, "strategy": "grid" }"#,
        )
        .unwrap();
        assert_eq!(config.particle_count, 50);
        assert_eq!(config.dimensions, Dimensions::Three);
        assert_eq!(config.strategy, EdgeStrategy::Grid);
        assert_eq!(config.threshold, PROXIMITY_THRESHOLD);
        assert_eq!(config.resort, ResortPolicy::Full);
    }

    #[test]
    fn test_json_rejects_bad_dimensions() {
        let err = SimConfig::from_json(r#"{ "dimensions": 4 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Dimensions must be 2 or 3"));
    }

    #[test]
    fn test_json_validates_values() {
        let err = SimConfig::from_json(r#"{ "particle_count": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoParticles));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimConfig::load("/nonexistent/plexus.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("plexus-config-{}.json", std::process::id()));
        let config = SimConfig {
            particle_count: 12,
            seed: Some(42),
            background: Background::Dark,
            strategy: EdgeStrategy::SortedAxes,
            resort: ResortPolicy::Incremental,
            ..Default::default()
        };
        config.save(&path).unwrap();
        let loaded = SimConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_background_for_hour() {
        assert_eq!(Background::for_hour(3), Background::Dark);
        assert_eq!(Background::for_hour(6), Background::Light);
        assert_eq!(Background::for_hour(19), Background::Light);
        assert_eq!(Background::for_hour(20), Background::Dark);
        assert_eq!(Background::Light.next().next(), Background::Light);
        assert_eq!(Background::from_str("DARK"), Some(Background::Dark));
        assert!(Background::Dark.clears());
    }
}
