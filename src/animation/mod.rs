//! Skeleton anchors and named animation playback
//!
//! The host blends and poses; this module only resolves names up front.

mod player;
mod skeleton;

pub use player::{ActionPlayer, AnimationId, AnimationRegistry, PlaybackState};
pub use skeleton::{Bone, Skeleton, TurretAnchor};
