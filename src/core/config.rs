//! Unit tuning and its persistence
//!
//! Configs are saved and loaded as RON (Rusty Object Notation) or JSON.
//! Missing fields fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ai::{NamePatterns, ProjectionParams, SteeringParams};

/// Upper bound on fan rays, to keep a tick's ray budget bounded
pub const MAX_FAN_RAYS: usize = 64;

/// Tuning for a steered ground unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Probe and fan settings
    pub steering: SteeringParams,
    /// Vertical probe settings
    pub projection: ProjectionParams,
    /// Movement speed in world units per second
    pub move_speed: f32,
    /// Distance at which a target counts as reached
    pub arrive_radius: f32,
    /// Names of scenery that blocks movement
    pub blocking_names: NamePatterns,
    /// Name of the bone turret yaw is written to
    pub turret_bone: String,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            steering: SteeringParams::default(),
            projection: ProjectionParams::default(),
            move_speed: 2.0,
            arrive_radius: 0.5,
            blocking_names: NamePatterns::default(),
            turret_bone: String::from("rotation"),
        }
    }
}

impl NavConfig {
    /// Set steering parameters
    #[must_use]
    pub fn with_steering(mut self, steering: SteeringParams) -> Self {
        self.steering = steering;
        self
    }

    /// Set projection parameters
    #[must_use]
    pub fn with_projection(mut self, projection: ProjectionParams) -> Self {
        self.projection = projection;
        self
    }

    /// Set movement speed
    #[must_use]
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Set arrival distance
    #[must_use]
    pub fn with_arrive_radius(mut self, radius: f32) -> Self {
        self.arrive_radius = radius;
        self
    }

    /// Set blocking scenery names
    #[must_use]
    pub fn with_blocking_names(mut self, names: NamePatterns) -> Self {
        self.blocking_names = names;
        self
    }

    /// Set turret bone name
    #[must_use]
    pub fn with_turret_bone(mut self, name: impl Into<String>) -> Self {
        self.turret_bone = name.into();
        self
    }

    /// Check the config for values the planner cannot work with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("steering.detection_range", self.steering.detection_range),
            ("steering.deflection_weight", self.steering.deflection_weight),
            ("steering.fan_spread", self.steering.fan_spread),
            ("projection.probe_height", self.projection.probe_height),
            ("projection.probe_length", self.projection.probe_length),
            (
                "projection.blocked_probe_height",
                self.projection.blocked_probe_height,
            ),
            (
                "projection.ground_probe_length",
                self.projection.ground_probe_length,
            ),
            ("move_speed", self.move_speed),
            ("arrive_radius", self.arrive_radius),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be finite and non-negative, got {value}"),
                });
            }
        }
        if !self.steering.vertical_offset.is_finite() {
            return Err(ConfigError::Invalid {
                field: "steering.vertical_offset",
                reason: String::from("must be finite"),
            });
        }
        if self.steering.fan_rays == 0 || self.steering.fan_rays > MAX_FAN_RAYS {
            return Err(ConfigError::Invalid {
                field: "steering.fan_rays",
                reason: format!(
                    "must be between 1 and {MAX_FAN_RAYS}, got {}",
                    self.steering.fan_rays
                ),
            });
        }
        if self.turret_bone.is_empty() {
            return Err(ConfigError::Invalid {
                field: "turret_bone",
                reason: String::from("must not be empty"),
            });
        }
        Ok(())
    }

    /// Parse and validate a config from RON text
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            ron::from_str(text).map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the config as pretty RON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Save the config to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = self.to_ron_string()?;
        fs::write(path, ron_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a config from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save the config to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a config from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Errors that can occur loading, saving or validating a config
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
    /// A field holds a value the planner cannot use
    Invalid {
        /// Dotted field path
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
            Self::Invalid { field, reason } => write!(f, "Invalid config `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}
