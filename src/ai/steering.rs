//! Obstacle-aware steering for ground agents
//!
//! Agents move in the horizontal plane. A single forward probe decides between
//! heading straight for the target or deflecting sideways, and a fan of probes
//! gives a free-roam avoidance direction.

use std::f32::consts::FRAC_PI_4;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::query::{ObstacleFilter, ObstacleQuery, Ray};

/// Fan batches up to this size stay on the stack
pub type FanRays = SmallVec<[Ray; 8]>;

/// Position and facing of an agent for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentState {
    /// World position
    pub position: Vec3,
    /// Horizontal unit facing
    pub facing: Vec3,
}

impl AgentState {
    /// Create a new agent state facing +Z
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            facing: Vec3::Z,
        }
    }

    /// Set the facing, flattened onto the horizontal plane
    ///
    /// A facing with no horizontal component leaves the current one in place.
    pub fn face(&mut self, direction: Vec3) {
        if let Some(facing) = flatten(direction).try_normalize() {
            self.facing = facing;
        }
    }
}

impl Default for AgentState {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// Tuning for the steering planner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringParams {
    /// Probe length in world units
    pub detection_range: f32,
    /// Height above the agent's position probes start at
    pub vertical_offset: f32,
    /// Weight of the sideways deflection when the forward probe hits
    pub deflection_weight: f32,
    /// Number of rays in the avoidance fan
    pub fan_rays: usize,
    /// Total fan angle in radians
    pub fan_spread: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            detection_range: 1.0,
            vertical_offset: 1.0,
            deflection_weight: 0.5,
            fan_rays: 7,
            fan_spread: FRAC_PI_4,
        }
    }
}

impl SteeringParams {
    /// Set probe length
    #[must_use]
    pub fn with_detection_range(mut self, range: f32) -> Self {
        self.detection_range = range;
        self
    }

    /// Set fan shape
    #[must_use]
    pub fn with_fan(mut self, rays: usize, spread: f32) -> Self {
        self.fan_rays = rays;
        self.fan_spread = spread;
        self
    }
}

/// Drop the vertical component
fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Horizontal unit direction from `current` to `target`, zero if coincident
#[must_use]
pub fn horizontal_direction(current: Vec3, target: Vec3) -> Vec3 {
    flatten(target - current).normalize_or_zero()
}

/// Per-tick steering against a host obstacle query
///
/// The planner borrows its query and filter and keeps no state between calls,
/// so identical inputs against an unchanged scene give identical outputs.
pub struct SteeringPlanner<'a, Q: ?Sized> {
    query: &'a Q,
    filter: &'a dyn ObstacleFilter,
    params: SteeringParams,
}

impl<'a, Q: ObstacleQuery + ?Sized> SteeringPlanner<'a, Q> {
    /// Create a planner over a host query and blocking filter
    #[must_use]
    pub fn new(query: &'a Q, filter: &'a dyn ObstacleFilter, params: SteeringParams) -> Self {
        Self {
            query,
            filter,
            params,
        }
    }

    /// Planner parameters
    #[must_use]
    pub const fn params(&self) -> &SteeringParams {
        &self.params
    }

    /// Desired movement direction for this tick
    ///
    /// Returns the straight-line horizontal direction when the forward probe is
    /// clear, a unit vector deflected to the side when it is blocked, and zero
    /// when there is no direction to travel.
    #[must_use]
    pub fn compute_steering(&self, current: Vec3, target: Vec3) -> Vec3 {
        let direction = horizontal_direction(current, target);
        if direction == Vec3::ZERO || !current.is_finite() {
            return Vec3::ZERO;
        }

        let probe = Ray::new(
            current + Vec3::Y * self.params.vertical_offset,
            direction * self.params.detection_range,
            self.params.detection_range,
        );
        let Some(hit) = self.query.query_ray(&probe, self.filter) else {
            return direction;
        };

        log::trace!(
            "Forward probe blocked by {:?} at {}, deflecting",
            hit.id,
            hit.point
        );
        let avoidance = Vec3::Y.cross(direction).normalize_or_zero();
        (direction + avoidance * self.params.deflection_weight).normalize_or_zero()
    }

    /// Fan avoidance with the fan centred on +Z
    #[must_use]
    pub fn compute_fan_avoidance(&self, current: Vec3) -> Vec3 {
        self.fan_avoidance_along(current, Vec3::Z)
    }

    /// Fan avoidance with the fan centred on an arbitrary horizontal forward
    ///
    /// Every ray that hits contributes `dir x up`. The normalized sum is
    /// returned, or zero if nothing was hit.
    #[must_use]
    pub fn fan_avoidance_along(&self, current: Vec3, forward: Vec3) -> Vec3 {
        let mut adjustment = Vec3::ZERO;
        for ray in self.fan_rays(current, forward) {
            if self.query.query_ray(&ray, self.filter).is_some() {
                let direction = ray.unit_direction().unwrap_or(Vec3::ZERO);
                adjustment += direction.cross(Vec3::Y);
            }
        }
        adjustment.normalize_or_zero()
    }

    /// The probe rays of the avoidance fan, left to right
    ///
    /// Empty if `forward` has no horizontal component or the fan has no rays.
    #[must_use]
    pub fn fan_rays(&self, current: Vec3, forward: Vec3) -> FanRays {
        let mut rays = FanRays::new();
        let Some(forward) = flatten(forward).try_normalize() else {
            return rays;
        };
        if !current.is_finite() {
            return rays;
        }

        let count = self.params.fan_rays;
        let spread = self.params.fan_spread;
        let heading = Quat::from_rotation_y(forward.x.atan2(forward.z));
        let origin = current + Vec3::Y * self.params.vertical_offset;

        for k in 0..count {
            let angle = if count > 1 {
                -spread / 2.0 + spread * k as f32 / (count - 1) as f32
            } else {
                0.0
            };
            let local = Vec3::new(angle.sin(), 0.0, angle.cos());
            let direction = heading * local;
            rays.push(Ray::new(
                origin,
                direction * self.params.detection_range,
                self.params.detection_range,
            ));
        }
        rays
    }
}
