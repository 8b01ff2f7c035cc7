//! Steering and targeting for a tank unit
//!
//! This crate provides:
//! - Obstacle-aware steering and fan avoidance over a host ray query
//! - Nav-surface target projection
//! - Turret aiming with a validated skeleton anchor
//! - A rapier3d reference host for headless runs and tests

pub mod ai;
pub mod animation;
pub mod core;
pub mod physics;
pub mod unit;

// Re-exports for convenience
pub use glam;
pub use rapier3d;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{
        AgentState, BlockingFilter, Exclusions, NamePatterns, NavSurface, NavTarget, ObstacleFilter,
        ObstacleHit, ObstacleId, ObstacleQuery, Ray, SteeringParams, SteeringPlanner,
        compute_aim_yaw, project_on_nav_surface,
    };
    pub use crate::animation::{Bone, Skeleton, TurretAnchor};
    pub use crate::core::{ConfigError, NavConfig};
    pub use crate::physics::{Physics, RigidBodyHandle};
    pub use crate::unit::{Armored, ArmoredAction, TickOutcome};
    pub use glam::{Quat, Vec3};
}
