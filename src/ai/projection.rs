//! Nav-surface projection and vertical ground probes

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::query::{ObstacleFilter, ObstacleId, ObstacleQuery, ObstacleRef, Ray};

/// Walkable ground the host can intersect with rays
pub trait NavSurface {
    /// Intersect a ray with the nav surface only
    fn intersect(&self, ray: &Ray) -> Option<Vec3>;

    /// Identifier of the surface in the host's obstacle space, if it has one
    fn surface_id(&self) -> Option<ObstacleId> {
        None
    }
}

impl<T: NavSurface + ?Sized> NavSurface for &T {
    fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        (**self).intersect(ray)
    }

    fn surface_id(&self) -> Option<ObstacleId> {
        (**self).surface_id()
    }
}

/// Vertical probe dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionParams {
    /// Height above the target the snapping ray starts from
    pub probe_height: f32,
    /// Length of the snapping ray
    pub probe_length: f32,
    /// Absolute height the blocked-position probe starts from; it ends as far below zero
    pub blocked_probe_height: f32,
    /// Length of the ground-contact probe below a position
    pub ground_probe_length: f32,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            probe_height: 100.0,
            probe_length: 200.0,
            blocked_probe_height: 10.0,
            ground_probe_length: 1.0,
        }
    }
}

/// A requested target and where it lands on the nav surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavTarget {
    /// Position as requested
    pub target: Vec3,
    /// Position snapped onto the nav surface (or `target` if off the surface)
    pub projected: Vec3,
}

impl NavTarget {
    /// Project `target` onto the nav surface
    #[must_use]
    pub fn project<S: NavSurface + ?Sized>(
        surface: &S,
        target: Vec3,
        params: &ProjectionParams,
    ) -> Self {
        Self {
            target,
            projected: project_on_nav_surface(surface, target, params),
        }
    }

    /// Whether snapping found the surface
    #[must_use]
    pub fn on_surface(&self) -> bool {
        self.projected != self.target
    }
}

/// Snap a position onto the nav surface
///
/// Casts straight down from `probe_height` above the position. Returns the
/// input unchanged when there is no intersection, e.g. before terrain loads.
#[must_use]
pub fn project_on_nav_surface<S: NavSurface + ?Sized>(
    surface: &S,
    position: Vec3,
    params: &ProjectionParams,
) -> Vec3 {
    let ray = Ray::downward(position, params.probe_height, params.probe_length);
    surface.intersect(&ray).unwrap_or(position)
}

/// Check for something unexpected standing at a position
///
/// Casts from `blocked_probe_height` down to the same depth below zero and
/// reports whether `filter` accepts anything on the way. Pair with a
/// [`BlockingFilter::foreign`](super::BlockingFilter::foreign) filter to find
/// obstacles that are not known scenery.
#[must_use]
pub fn is_position_blocked<Q: ObstacleQuery + ?Sized>(
    query: &Q,
    filter: &dyn ObstacleFilter,
    position: Vec3,
    params: &ProjectionParams,
) -> bool {
    let height = params.blocked_probe_height;
    let start = Vec3::new(position.x, height, position.z);
    let ray = Ray::new(start, Vec3::NEG_Y, height * 2.0);
    query.query_ray(&ray, filter).is_some()
}

/// Check whether anything but the agent itself lies just below a position
#[must_use]
pub fn check_collision<Q: ObstacleQuery + ?Sized>(
    query: &Q,
    agent: Option<ObstacleId>,
    position: Vec3,
    params: &ProjectionParams,
) -> bool {
    let ray = Ray::new(position, Vec3::NEG_Y, params.ground_probe_length);
    let not_agent = |obstacle: ObstacleRef<'_>| Some(obstacle.id) != agent;
    query.query_ray(&ray, &not_agent).is_some()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::ai::query::{BlockingFilter, Exclusions, NamePatterns, ObstacleHit};

    /// Flat ground at a fixed height, optionally unloaded
    struct FlatGround {
        height: Option<f32>,
    }

    impl NavSurface for FlatGround {
        fn intersect(&self, ray: &Ray) -> Option<Vec3> {
            let height = self.height?;
            let dir = ray.unit_direction()?;
            if dir.y >= 0.0 {
                return None;
            }
            let distance = (ray.origin.y - height) / -dir.y;
            (distance >= 0.0 && distance <= ray.max_length).then(|| ray.point_at(distance))
        }

        fn surface_id(&self) -> Option<ObstacleId> {
            Some(ObstacleId(0))
        }
    }

    /// A single named post occupying everything below `top`
    struct Post {
        id: ObstacleId,
        name: &'static str,
        top: f32,
        last_ray: Cell<Option<Ray>>,
    }

    impl ObstacleQuery for Post {
        fn query_ray(&self, ray: &Ray, filter: &dyn ObstacleFilter) -> Option<ObstacleHit> {
            self.last_ray.set(Some(*ray));
            let candidate = ObstacleRef {
                id: self.id,
                name: self.name,
            };
            if !filter.accepts(candidate) {
                return None;
            }
            let distance = (ray.origin.y - self.top).max(0.0);
            (distance <= ray.max_length).then(|| ObstacleHit {
                id: self.id,
                point: ray.point_at(distance),
                distance,
            })
        }
    }

    #[test]
    fn test_projection_snaps_to_surface() {
        let ground = FlatGround { height: Some(2.5) };
        let params = ProjectionParams::default();

        let projected = project_on_nav_surface(&ground, Vec3::new(5.0, 40.0, -3.0), &params);
        assert!((projected - Vec3::new(5.0, 2.5, -3.0)).length() < 0.001);

        // Targets below the surface come back up
        let projected = project_on_nav_surface(&ground, Vec3::new(1.0, -20.0, 1.0), &params);
        assert!((projected.y - 2.5).abs() < 0.001);
    }

    #[test]
    fn test_projection_fails_open_without_surface() {
        let ground = FlatGround { height: None };
        let params = ProjectionParams::default();
        let position = Vec3::new(808.0, -0.08, 770.1);

        assert_eq!(project_on_nav_surface(&ground, position, &params), position);

        let target = NavTarget::project(&ground, position, &params);
        assert_eq!(target.projected, position);
        assert!(!target.on_surface());
    }

    #[test]
    fn test_projection_out_of_probe_range() {
        let ground = FlatGround {
            height: Some(-500.0),
        };
        let params = ProjectionParams::default();
        let position = Vec3::new(0.0, 0.0, 0.0);

        assert_eq!(project_on_nav_surface(&ground, position, &params), position);
    }

    #[test]
    fn test_nav_target_on_surface() {
        let ground = FlatGround { height: Some(0.0) };
        let target = NavTarget::project(&ground, Vec3::new(3.0, 5.0, 3.0), &Default::default());
        assert!(target.on_surface());
        assert_eq!(target.target, Vec3::new(3.0, 5.0, 3.0));
    }

    #[test]
    fn test_position_blocked_by_foreign_obstacle() {
        let patterns = NamePatterns::default();
        let foreign = BlockingFilter::foreign(&patterns, Exclusions::default());
        let params = ProjectionParams::default();

        let crate_post = Post {
            id: ObstacleId(3),
            name: "SupplyCrate",
            top: 1.0,
            last_ray: Cell::new(None),
        };
        assert!(is_position_blocked(
            &crate_post,
            &foreign,
            Vec3::new(7.0, 55.0, 2.0),
            &params
        ));
        let ray = crate_post.last_ray.get().unwrap();
        assert_eq!(ray.origin, Vec3::new(7.0, 10.0, 2.0));
        assert_eq!(ray.max_length, 20.0);

        let road = Post {
            id: ObstacleId(4),
            name: "Road_01",
            top: 0.0,
            last_ray: Cell::new(None),
        };
        assert!(!is_position_blocked(&road, &foreign, Vec3::ZERO, &params));
    }

    #[test]
    fn test_check_collision_ignores_agent() {
        let params = ProjectionParams::default();
        let body = Post {
            id: ObstacleId(9),
            name: "Tank",
            top: 0.0,
            last_ray: Cell::new(None),
        };

        assert!(!check_collision(
            &body,
            Some(ObstacleId(9)),
            Vec3::new(0.0, 0.5, 0.0),
            &params
        ));
        assert!(check_collision(&body, None, Vec3::new(0.0, 0.5, 0.0), &params));
        // Too far above to reach with the short probe
        assert!(!check_collision(&body, None, Vec3::new(0.0, 3.0, 0.0), &params));
    }
}
