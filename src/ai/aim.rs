//! Turret yaw

use glam::{Quat, Vec3};

use crate::animation::{Skeleton, TurretAnchor};

/// Yaw that points +Z at `target` from `agent`, ignoring height
///
/// Coincident points give 0.
#[must_use]
pub fn compute_aim_yaw(agent: Vec3, target: Vec3) -> f32 {
    let delta = target - agent;
    let yaw = delta.x.atan2(delta.z);
    if yaw.is_finite() { yaw } else { 0.0 }
}

/// Writes turret yaw into the skeleton's anchor bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurretAimer {
    anchor: TurretAnchor,
    yaw: f32,
}

impl TurretAimer {
    /// Create an aimer for a resolved anchor
    #[must_use]
    pub fn new(anchor: TurretAnchor) -> Self {
        Self { anchor, yaw: 0.0 }
    }

    /// Aim the turret at a point and return the yaw
    ///
    /// With a missing anchor the skeleton is left untouched.
    pub fn aim_at(&mut self, skeleton: &mut Skeleton, agent: Vec3, target: Vec3) -> f32 {
        let yaw = compute_aim_yaw(agent, target);
        self.rotate(skeleton, yaw);
        yaw
    }

    /// Set the turret yaw directly
    pub fn rotate(&mut self, skeleton: &mut Skeleton, yaw: f32) {
        self.yaw = yaw;
        if let TurretAnchor::Bone(index) = self.anchor
            && let Some(bone) = skeleton.get_mut(index)
        {
            bone.rotation = Quat::from_rotation_y(yaw);
        }
    }

    /// Last yaw written
    #[must_use]
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Anchor this aimer writes to
    #[must_use]
    pub const fn anchor(&self) -> TurretAnchor {
        self.anchor
    }

    /// Current turret orientation, identity when the anchor is missing
    #[must_use]
    pub fn orientation(&self) -> Quat {
        match self.anchor {
            TurretAnchor::Bone(_) => Quat::from_rotation_y(self.yaw),
            TurretAnchor::Missing => Quat::IDENTITY,
        }
    }
}
