//! Reference obstacle host
//!
//! Built on top of rapier3d

mod world;

pub use world::{Physics, RigidBodyHandle};
