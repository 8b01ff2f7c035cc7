//! Steering and targeting
//!
//! Provides obstacle-aware steering, nav-surface projection and turret aiming
//! over a host-supplied ray query.

mod aim;
mod projection;
mod query;
mod steering;

pub use aim::{TurretAimer, compute_aim_yaw};
pub use projection::{
    NavSurface, NavTarget, ProjectionParams, check_collision, is_position_blocked,
    project_on_nav_surface,
};
pub use query::{
    BlockingFilter, Exclusions, FilterMode, NamePatterns, ObstacleFilter, ObstacleHit, ObstacleId,
    ObstacleQuery, ObstacleRef, Ray,
};
pub use steering::{
    AgentState, FanRays, SteeringParams, SteeringPlanner, horizontal_direction,
};
