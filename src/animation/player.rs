//! Named animation playback state
//!
//! The host owns the actual animation groups and blends them. This side keeps a
//! read-only name table built once per unit and the "what is playing now"
//! state the host syncs from. Everything plays looped at normal speed.

use rustc_hash::FxHashMap;

/// Index of an animation group in the host's list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(pub usize);

/// Name to animation lookup, fixed after construction
#[derive(Debug, Clone, Default)]
pub struct AnimationRegistry {
    by_name: FxHashMap<String, AnimationId>,
    by_id: FxHashMap<AnimationId, usize>,
    /// Unique names, in order of first appearance
    names: Vec<String>,
}

impl AnimationRegistry {
    /// Build from the host's animation group names, in host order
    ///
    /// A name that appears more than once resolves to its last group and is
    /// listed once, at its first position.
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for (index, name) in names.into_iter().enumerate() {
            let name = name.into();
            let id = AnimationId(index);
            let slot = match registry.by_name.insert(name.clone(), id) {
                Some(shadowed) => registry.by_id.remove(&shadowed).unwrap_or_default(),
                None => {
                    registry.names.push(name);
                    registry.names.len() - 1
                }
            };
            registry.by_id.insert(id, slot);
        }
        registry
    }

    /// Look up an animation by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<AnimationId> {
        self.by_name.get(name).copied()
    }

    /// Name of an animation
    #[must_use]
    pub fn name(&self, id: AnimationId) -> Option<&str> {
        self.by_id
            .get(&id)
            .and_then(|&slot| self.names.get(slot))
            .map(String::as_str)
    }

    /// Unique names, in host order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of distinct animations
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if there are no animations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Animation is playing
    Playing,
    /// Nothing is playing
    #[default]
    Stopped,
}

/// Tracks which named animation a unit is playing
#[derive(Debug, Clone, Default)]
pub struct ActionPlayer {
    current: Option<AnimationId>,
    /// Bumped whenever playback changes so hosts can skip redundant syncs
    generation: u64,
    /// Generation of the last stop-all request
    halted_at: Option<u64>,
}

impl ActionPlayer {
    /// Create a new player with nothing playing
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop whatever is playing and start `name`
    ///
    /// Returns false, leaving nothing playing, when the registry has no such
    /// animation. Replaying the current animation is a no-op.
    pub fn play(&mut self, registry: &AnimationRegistry, name: &str) -> bool {
        let Some(id) = registry.get(name) else {
            log::warn!("Animation \"{name}\" not found");
            self.stop();
            return false;
        };
        if self.current == Some(id) {
            return true;
        }
        self.current = Some(id);
        self.generation += 1;
        true
    }

    /// Stop the current animation
    pub fn stop(&mut self) {
        if self.current.take().is_some() {
            self.generation += 1;
        }
    }

    /// Stop a specific animation if it is the one playing
    pub fn stop_named(&mut self, registry: &AnimationRegistry, name: &str) {
        if registry.get(name).is_some() && registry.get(name) == self.current {
            self.stop();
        }
    }

    /// Ask the host to halt every group, not just the tracked one
    ///
    /// Always bumps the generation, even when nothing is tracked as playing.
    pub fn stop_all(&mut self) {
        self.current = None;
        self.generation += 1;
        self.halted_at = Some(self.generation);
    }

    /// Generation of the last [`stop_all`](Self::stop_all), if any
    #[must_use]
    pub const fn halted_at(&self) -> Option<u64> {
        self.halted_at
    }

    /// Currently playing animation
    #[must_use]
    pub const fn current(&self) -> Option<AnimationId> {
        self.current
    }

    /// Name of the currently playing animation
    #[must_use]
    pub fn current_name<'r>(&self, registry: &'r AnimationRegistry) -> Option<&'r str> {
        self.current.and_then(|id| registry.name(id))
    }

    /// Get playback state
    #[must_use]
    pub const fn state(&self) -> PlaybackState {
        if self.current.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        }
    }

    /// Check if currently playing
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    /// Playback change counter
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}
