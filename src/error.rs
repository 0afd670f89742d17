//! Error types for Plexus.
//!
//! Simulation itself never fails once constructed; every error here is raised
//! while building or loading a configuration.

use std::fmt;

/// Errors that can occur while loading or validating a [`SimConfig`](crate::SimConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// Particle count must be at least one.
    NoParticles,
    /// Particle count is above what the chosen edge strategy can hold.
    TooManyParticles { count: usize, max: usize },
    /// Proximity threshold must be positive and finite.
    InvalidThreshold(f32),
    /// Speed bound must be positive and finite.
    InvalidSpeed(f32),
    /// Only 2D and 3D simulations are supported.
    InvalidDimensions(u8),
    /// Failed to read the configuration file.
    Io(std::io::Error),
    /// Failed to parse configuration JSON.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoParticles => write!(f, "Particle count must be greater than zero"),
            ConfigError::TooManyParticles { count, max } => {
                write!(f, "Particle count {} exceeds the limit of {}", count, max)
            }
            ConfigError::InvalidThreshold(t) => {
                write!(f, "Proximity threshold must be a positive number, got {}", t)
            }
            ConfigError::InvalidSpeed(s) => {
                write!(f, "Speed bound must be a positive number, got {}", s)
            }
            ConfigError::InvalidDimensions(d) => {
                write!(f, "Dimensions must be 2 or 3, got {}", d)
            }
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}
