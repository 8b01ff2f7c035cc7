//! Obstacle queries against a host-provided spatial index
//!
//! The host engine owns the scene. This module only defines the shape of the
//! ray query it must answer and the filters used to classify what was struck.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Opaque handle to something a ray can strike, assigned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(pub u64);

/// What a filter gets to inspect about a candidate obstacle
#[derive(Debug, Clone, Copy)]
pub struct ObstacleRef<'a> {
    /// Host identifier
    pub id: ObstacleId,
    /// Host-side name (mesh or collider name)
    pub name: &'a str,
}

/// A line-segment query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start point
    pub origin: Vec3,
    /// Direction, not necessarily unit length
    pub direction: Vec3,
    /// Maximum distance along the normalized direction
    pub max_length: f32,
}

impl Ray {
    /// Create a new ray
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3, max_length: f32) -> Self {
        Self {
            origin,
            direction,
            max_length: max_length.max(0.0),
        }
    }

    /// Straight-down ray starting `height` above `position`
    #[must_use]
    pub fn downward(position: Vec3, height: f32, max_length: f32) -> Self {
        Self::new(position + Vec3::Y * height, Vec3::NEG_Y, max_length)
    }

    /// Unit direction, or `None` for a zero or non-finite direction
    #[must_use]
    pub fn unit_direction(&self) -> Option<Vec3> {
        self.direction.try_normalize()
    }

    /// A degenerate ray can never hit anything
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.unit_direction().is_none() || !self.origin.is_finite()
    }

    /// Point at `distance` along the normalized direction
    #[must_use]
    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.unit_direction().unwrap_or(Vec3::ZERO) * distance
    }
}

/// Result of a ray query that struck something
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleHit {
    /// The obstacle that was hit
    pub id: ObstacleId,
    /// The point of intersection
    pub point: Vec3,
    /// Distance from ray origin
    pub distance: f32,
}

/// Predicate deciding whether an obstacle counts for a query
pub trait ObstacleFilter {
    /// Return true if the obstacle should be reported
    fn accepts(&self, obstacle: ObstacleRef<'_>) -> bool;
}

impl<F> ObstacleFilter for F
where
    F: Fn(ObstacleRef<'_>) -> bool,
{
    fn accepts(&self, obstacle: ObstacleRef<'_>) -> bool {
        self(obstacle)
    }
}

/// Ray-picking capability the host must provide
///
/// A miss is a normal outcome and is reported as `None`. Degenerate rays
/// (zero-length direction) must report `None` as well.
pub trait ObstacleQuery {
    /// Return the nearest accepted obstacle along the ray, if any
    fn query_ray(&self, ray: &Ray, filter: &dyn ObstacleFilter) -> Option<ObstacleHit>;
}

impl<T: ObstacleQuery + ?Sized> ObstacleQuery for &T {
    fn query_ray(&self, ray: &Ray, filter: &dyn ObstacleFilter) -> Option<ObstacleHit> {
        (**self).query_ray(ray, filter)
    }
}

/// Allow-list of obstacle names
///
/// An entry ending in `*` matches as a prefix, anything else must match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamePatterns(Vec<String>);

impl NamePatterns {
    /// Names of the blocking scenery in the stock tank map
    pub const DEFAULT_BLOCKING: [&'static str; 6] = [
        "Road_01",
        "Road_01.001",
        "Landscape_01",
        "EnergyRes_RenewablePlant_Wall_01",
        "EnergyRes_NaturalGasFacility_Wall_01",
        "Water_01",
    ];

    /// Create from a list of patterns
    #[must_use]
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(patterns.into_iter().map(Into::into).collect())
    }

    /// Empty list, matches nothing
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Check whether `name` matches any pattern
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.0.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => name.starts_with(prefix),
            None => pattern == name,
        })
    }

    /// Number of patterns
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no patterns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for NamePatterns {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCKING)
    }
}

/// Identifiers that are never obstacles for a given agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exclusions {
    /// The agent's own body
    pub agent: Option<ObstacleId>,
    /// The walkable ground
    pub nav_surface: Option<ObstacleId>,
}

impl Exclusions {
    /// Check if an id is excluded
    #[must_use]
    pub fn contains(&self, id: ObstacleId) -> bool {
        self.agent == Some(id) || self.nav_surface == Some(id)
    }
}

/// How a [`BlockingFilter`] treats names in its pattern list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Only listed names block
    #[default]
    Blocking,
    /// Only names outside the list count
    Foreign,
}

/// Name-based obstacle classification with agent/ground exclusions
#[derive(Debug, Clone, Copy)]
pub struct BlockingFilter<'a> {
    patterns: &'a NamePatterns,
    exclusions: Exclusions,
    mode: FilterMode,
}

impl<'a> BlockingFilter<'a> {
    /// Filter that accepts only listed obstacles
    #[must_use]
    pub fn blocking(patterns: &'a NamePatterns, exclusions: Exclusions) -> Self {
        Self {
            patterns,
            exclusions,
            mode: FilterMode::Blocking,
        }
    }

    /// Filter that accepts only obstacles absent from the list
    #[must_use]
    pub fn foreign(patterns: &'a NamePatterns, exclusions: Exclusions) -> Self {
        Self {
            patterns,
            exclusions,
            mode: FilterMode::Foreign,
        }
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Same patterns and exclusions, other mode
    #[must_use]
    pub fn inverted(self) -> Self {
        let mode = match self.mode {
            FilterMode::Blocking => FilterMode::Foreign,
            FilterMode::Foreign => FilterMode::Blocking,
        };
        Self { mode, ..self }
    }
}

impl ObstacleFilter for BlockingFilter<'_> {
    fn accepts(&self, obstacle: ObstacleRef<'_>) -> bool {
        if self.exclusions.contains(obstacle.id) {
            return false;
        }
        let listed = self.patterns.matches(obstacle.name);
        match self.mode {
            FilterMode::Blocking => listed,
            FilterMode::Foreign => !listed,
        }
    }
}
