//! Game units driven by the steering module

mod armored;

pub use armored::{
    ATTACK_ANIMATION, Armored, ArmoredAction, IDLE_ANIMATION, MOVEMENT_ANIMATION, TickOutcome,
};
