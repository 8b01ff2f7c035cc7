//! Host skeleton pose and turret anchor lookup
//!
//! Bones are looked up by name once, when an entity is built. Everything after
//! that works with the resolved index.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A single bone in a skeleton
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bone {
    /// Bone name
    pub name: String,
    /// Parent bone index (None for root)
    pub parent: Option<usize>,
    /// Children bone indices
    pub children: Vec<usize>,
    /// Local translation
    pub translation: Vec3,
    /// Local rotation
    pub rotation: Quat,
    /// Local scale
    pub scale: Vec3,
}

impl Bone {
    /// Create a new bone at the parent's origin
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Set the local translation
    #[must_use]
    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Get the local transform matrix
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Bone hierarchy of a rigged unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Skeleton {
    /// All bones in the skeleton
    pub bones: Vec<Bone>,
    /// Root bone indices
    pub roots: Vec<usize>,
}

impl Skeleton {
    /// Create a new empty skeleton
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bone and return its index
    pub fn add_bone(&mut self, bone: Bone) -> usize {
        let index = self.bones.len();
        if bone.parent.is_none() {
            self.roots.push(index);
        }
        self.bones.push(bone);
        index
    }

    /// Set parent-child relationship
    ///
    /// Out-of-range indices and links that would form a cycle are ignored.
    pub fn set_parent(&mut self, child: usize, parent: usize) {
        if child == parent || child >= self.bones.len() || parent >= self.bones.len() {
            return;
        }

        let mut ancestor = parent;
        while let Some(p) = self.bones[ancestor].parent {
            if p == child {
                return;
            }
            ancestor = p;
        }

        let old_parent = self.bones[child].parent;
        match old_parent {
            Some(old) if old == parent => return,
            Some(old) => self.bones[old].children.retain(|&c| c != child),
            None => self.roots.retain(|&r| r != child),
        }

        self.bones[child].parent = Some(parent);
        self.bones[parent].children.push(child);
    }

    /// Get the number of bones
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Get a bone by index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Get a mutable bone by index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Bone> {
        self.bones.get_mut(index)
    }

    /// Find bone by name
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// World matrices of every bone, in the skeleton's model space
    #[must_use]
    pub fn compute_world_matrices(&self) -> Vec<Mat4> {
        let mut world = vec![Mat4::IDENTITY; self.bones.len()];
        let mut stack: Vec<(usize, Mat4)> =
            self.roots.iter().map(|&root| (root, Mat4::IDENTITY)).collect();

        while let Some((index, parent_world)) = stack.pop() {
            let bone = &self.bones[index];
            world[index] = parent_world * bone.local_matrix();
            stack.extend(bone.children.iter().map(|&child| (child, world[index])));
        }

        world
    }
}

/// Result of looking up the turret bone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurretAnchor {
    /// Index of the bone turret yaw is written to
    Bone(usize),
    /// The rig has no such bone; turret stays at identity
    Missing,
}

impl TurretAnchor {
    /// Resolve the named anchor bone
    ///
    /// A missing bone is a content defect: it is logged and the anchor falls
    /// back to [`TurretAnchor::Missing`].
    #[must_use]
    pub fn resolve(skeleton: &Skeleton, name: &str) -> Self {
        match skeleton.find_by_name(name) {
            Some(index) => Self::Bone(index),
            None => {
                log::error!(
                    "'{name}' bone not found in a {}-bone skeleton; turret aiming will hold identity orientation",
                    skeleton.bone_count()
                );
                Self::Missing
            }
        }
    }

    /// Bone index, if resolved
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Bone(index) => Some(index),
            Self::Missing => None,
        }
    }

    /// World rotation of the anchor bone, identity when missing
    #[must_use]
    pub fn world_rotation(self, skeleton: &Skeleton) -> Quat {
        let Some(index) = self.index() else {
            return Quat::IDENTITY;
        };
        skeleton
            .compute_world_matrices()
            .get(index)
            .map_or(Quat::IDENTITY, |m| m.to_scale_rotation_translation().1)
    }
}
