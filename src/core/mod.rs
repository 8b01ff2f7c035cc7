//! Core configuration
//!
//! Contains the unit tuning config and its errors

mod config;

pub use config::{ConfigError, MAX_FAN_RAYS, NavConfig};
