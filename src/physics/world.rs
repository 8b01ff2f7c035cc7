//! Reference obstacle host built on rapier3d
//!
//! Static scenery, the nav surface and unit bodies are rapier colliders tagged
//! with an [`ObstacleId`] in their `user_data`, with names kept on the side.

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;
use rustc_hash::FxHashMap;

use crate::ai::{
    NavSurface, ObstacleFilter, ObstacleHit, ObstacleId, ObstacleQuery, ObstacleRef,
    Ray as ProbeRay,
};

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidBodyHandle(pub rapier3d::dynamics::RigidBodyHandle);

/// Convert glam Quat to rapier3d UnitQuaternion
fn quat_to_rapier(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn isometry(position: Vec3, rotation: Quat) -> Isometry<Real> {
    Isometry::from_parts(
        Translation3::new(position.x, position.y, position.z),
        quat_to_rapier(rotation),
    )
}

/// Physics world that answers obstacle and nav-surface queries
pub struct Physics {
    /// Gravity vector
    pub gravity: Vec3,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Query pipeline for raycasting
    query_pipeline: QueryPipeline,
    integration_parameters: IntegrationParameters,
    /// Obstacle names by id
    names: FxHashMap<ObstacleId, String>,
    /// Id 0 is left for untagged colliders
    next_id: u64,
    nav_surface: Option<ObstacleId>,
}

impl Physics {
    /// Create a new physics world with default gravity
    pub fn new() -> Self {
        Self::with_gravity(Vec3::new(0.0, -9.81, 0.0))
    }

    /// Create a new physics world with custom gravity
    pub fn with_gravity(gravity: Vec3) -> Self {
        Self {
            gravity,
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            names: FxHashMap::default(),
            next_id: 1,
            nav_surface: None,
        }
    }

    /// Step the physics simulation; also refreshes the query pipeline
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;

        self.pipeline.step(
            &vector![self.gravity.x, self.gravity.y, self.gravity.z],
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Make colliders added or moved since the last step visible to queries
    pub fn update_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Create a static rigid body (doesn't move)
    pub fn create_static_body(&mut self, position: Vec3, rotation: Quat) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .position(isometry(position, rotation))
            .build();

        RigidBodyHandle(self.rigid_body_set.insert(body))
    }

    /// Create a kinematic rigid body (controlled directly), e.g. a unit's hull
    pub fn create_kinematic_body(&mut self, position: Vec3, rotation: Quat) -> RigidBodyHandle {
        let body = RigidBodyBuilder::kinematic_position_based()
            .position(isometry(position, rotation))
            .build();

        RigidBodyHandle(self.rigid_body_set.insert(body))
    }

    /// Attach a named box collider to a body
    pub fn add_box_obstacle(
        &mut self,
        body: RigidBodyHandle,
        name: impl Into<String>,
        half_extents: Vec3,
    ) -> ObstacleId {
        let id = ObstacleId(self.next_id);
        self.next_id += 1;

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .user_data(u128::from(id.0))
            .build();
        self.collider_set
            .insert_with_parent(collider, body.0, &mut self.rigid_body_set);
        self.names.insert(id, name.into());
        id
    }

    /// Add a named static box centred at `position`
    pub fn add_static_box(
        &mut self,
        name: impl Into<String>,
        position: Vec3,
        rotation: Quat,
        half_extents: Vec3,
    ) -> ObstacleId {
        let body = self.create_static_body(position, rotation);
        self.add_box_obstacle(body, name, half_extents)
    }

    /// Add a flat static slab whose top face is the walkable ground
    ///
    /// The slab is centred on `center` horizontally with its top at `center.y`.
    pub fn add_nav_surface(
        &mut self,
        name: impl Into<String>,
        center: Vec3,
        half_width: f32,
        half_depth: f32,
    ) -> ObstacleId {
        const HALF_THICKNESS: f32 = 0.1;
        let position = center - Vec3::Y * HALF_THICKNESS;
        let id = self.add_static_box(
            name,
            position,
            Quat::IDENTITY,
            Vec3::new(half_width, HALF_THICKNESS, half_depth),
        );
        self.nav_surface = Some(id);
        id
    }

    /// Get the position of a rigid body
    pub fn get_position(&self, body: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(body.0).map(|rb| {
            let pos = rb.translation();
            Vec3::new(pos.x, pos.y, pos.z)
        })
    }

    /// Set the target position of a kinematic body for the next step
    pub fn set_kinematic_position(&mut self, body: RigidBodyHandle, position: Vec3) {
        if let Some(rb) = self.rigid_body_set.get_mut(body.0) {
            rb.set_next_kinematic_translation(vector![position.x, position.y, position.z]);
        }
    }

    /// Name of an obstacle, empty for untagged colliders
    pub fn obstacle_name(&self, id: ObstacleId) -> &str {
        self.names.get(&id).map_or("", String::as_str)
    }

    /// Number of named obstacles
    pub fn obstacle_count(&self) -> usize {
        self.names.len()
    }

    /// Remove a rigid body and its colliders
    pub fn remove_body(&mut self, body: RigidBodyHandle) {
        if let Some(rb) = self.rigid_body_set.get(body.0) {
            for handle in rb.colliders() {
                if let Some(collider) = self.collider_set.get(*handle) {
                    let id = ObstacleId(collider.user_data as u64);
                    self.names.remove(&id);
                    if self.nav_surface == Some(id) {
                        self.nav_surface = None;
                    }
                }
            }
        }
        self.rigid_body_set.remove(
            body.0,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl ObstacleQuery for Physics {
    fn query_ray(&self, ray: &ProbeRay, filter: &dyn ObstacleFilter) -> Option<ObstacleHit> {
        let direction = ray.unit_direction()?;
        if !ray.origin.is_finite() {
            return None;
        }

        let cast = Ray::new(
            point![ray.origin.x, ray.origin.y, ray.origin.z],
            vector![direction.x, direction.y, direction.z],
        );
        let predicate = |_: ColliderHandle, collider: &Collider| {
            let id = ObstacleId(collider.user_data as u64);
            filter.accepts(ObstacleRef {
                id,
                name: self.obstacle_name(id),
            })
        };

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &cast,
                ray.max_length,
                true,
                QueryFilter::default().predicate(&predicate),
            )
            .and_then(|(handle, distance)| {
                let collider = self.collider_set.get(handle)?;
                let point = cast.point_at(distance);
                Some(ObstacleHit {
                    id: ObstacleId(collider.user_data as u64),
                    point: Vec3::new(point.x, point.y, point.z),
                    distance,
                })
            })
    }
}

impl NavSurface for Physics {
    fn intersect(&self, ray: &ProbeRay) -> Option<Vec3> {
        let surface = self.nav_surface?;
        let only_surface = |obstacle: ObstacleRef<'_>| obstacle.id == surface;
        self.query_ray(ray, &only_surface).map(|hit| hit.point)
    }

    fn surface_id(&self) -> Option<ObstacleId> {
        self.nav_surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{
        BlockingFilter, Exclusions, NamePatterns, ProjectionParams, SteeringParams,
        SteeringPlanner, is_position_blocked, project_on_nav_surface,
    };

    struct Scene {
        physics: Physics,
        ground: ObstacleId,
        wall: ObstacleId,
        tank: ObstacleId,
        tank_body: RigidBodyHandle,
    }

    fn scene() -> Scene {
        let mut physics = Physics::new();
        let ground = physics.add_nav_surface("NavMesh", Vec3::ZERO, 50.0, 50.0);
        let wall = physics.add_static_box(
            "EnergyRes_RenewablePlant_Wall_01",
            Vec3::new(0.0, 1.0, 3.0),
            Quat::IDENTITY,
            Vec3::new(2.0, 1.0, 0.2),
        );
        physics.add_static_box(
            "SupplyCrate",
            Vec3::new(10.0, 0.5, 10.0),
            Quat::IDENTITY,
            Vec3::splat(0.5),
        );
        let tank_body = physics.create_kinematic_body(Vec3::new(0.0, 0.5, 0.0), Quat::IDENTITY);
        let tank = physics.add_box_obstacle(tank_body, "Tank", Vec3::new(1.0, 0.5, 1.5));
        physics.update_queries();

        Scene {
            physics,
            ground,
            wall,
            tank,
            tank_body,
        }
    }

    fn accept_all(_: ObstacleRef<'_>) -> bool {
        true
    }

    #[test]
    fn test_query_hits_nearest_wall() {
        let scene = scene();
        let patterns = NamePatterns::default();
        let exclusions = Exclusions {
            agent: Some(scene.tank),
            nav_surface: Some(scene.ground),
        };
        let blocking = BlockingFilter::blocking(&patterns, exclusions);

        let ray = ProbeRay::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z * 2.0, 5.0);
        let hit = scene.physics.query_ray(&ray, &blocking).unwrap();

        assert_eq!(hit.id, scene.wall);
        assert!((hit.distance - 2.8).abs() < 0.01);
        assert!((hit.point - Vec3::new(0.0, 1.0, 2.8)).length() < 0.01);
    }

    #[test]
    fn test_query_respects_length_and_filter() {
        let scene = scene();
        let ray = ProbeRay::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 2.0);
        let only_wall = |o: ObstacleRef<'_>| o.id == scene.wall;
        assert!(scene.physics.query_ray(&ray, &only_wall).is_none());

        let long = ProbeRay::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 10.0);
        let reject_all = |_: ObstacleRef<'_>| false;
        assert!(scene.physics.query_ray(&long, &reject_all).is_none());
    }

    #[test]
    fn test_agent_body_is_hit_without_exclusion() {
        let scene = scene();
        let ray = ProbeRay::new(Vec3::new(0.0, 0.5, -5.0), Vec3::Z, 10.0);

        let hit = scene.physics.query_ray(&ray, &accept_all).unwrap();
        assert_eq!(hit.id, scene.tank);
        assert_eq!(scene.physics.obstacle_name(hit.id), "Tank");

        let patterns = NamePatterns::default();
        let exclusions = Exclusions {
            agent: Some(scene.tank),
            nav_surface: Some(scene.ground),
        };
        let foreign = BlockingFilter::foreign(&patterns, exclusions);
        assert!(scene.physics.query_ray(&ray, &foreign).is_none());
    }

    #[test]
    fn test_degenerate_ray_never_hits() {
        let scene = scene();
        let ray = ProbeRay::new(Vec3::new(0.0, 1.0, 0.0), Vec3::ZERO, 10.0);
        assert!(scene.physics.query_ray(&ray, &accept_all).is_none());
    }

    #[test]
    fn test_nav_surface_projection() {
        let scene = scene();
        let params = ProjectionParams::default();
        assert_eq!(scene.physics.surface_id(), Some(scene.ground));

        // Snaps through the wall on the way down, the wall is not the surface
        let projected = project_on_nav_surface(&scene.physics, Vec3::new(0.0, 7.0, 3.0), &params);
        assert!((projected - Vec3::new(0.0, 0.0, 3.0)).length() < 0.01);

        // Off the edge of the slab the position passes through
        let off = Vec3::new(80.0, 3.0, 0.0);
        assert_eq!(project_on_nav_surface(&scene.physics, off, &params), off);
    }

    #[test]
    fn test_nav_surface_absent() {
        let physics = Physics::new();
        let position = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(
            project_on_nav_surface(&physics, position, &ProjectionParams::default()),
            position
        );
    }

    #[test]
    fn test_planner_over_physics() {
        let scene = scene();
        let patterns = NamePatterns::default();
        let exclusions = Exclusions {
            agent: Some(scene.tank),
            nav_surface: Some(scene.ground),
        };
        let blocking = BlockingFilter::blocking(&patterns, exclusions);
        let target = Vec3::new(0.0, 0.0, 20.0);

        let short = SteeringPlanner::new(&scene.physics, &blocking, SteeringParams::default());
        assert!((short.compute_steering(Vec3::ZERO, target) - Vec3::Z).length() < 0.001);

        let params = SteeringParams::default().with_detection_range(4.0);
        let long = SteeringPlanner::new(&scene.physics, &blocking, params);
        let steering = long.compute_steering(Vec3::ZERO, target);
        assert!(steering.x > 0.0);
        assert!((steering.length() - 1.0).abs() < 0.001);

        let avoidance = long.compute_fan_avoidance(Vec3::ZERO);
        assert!((avoidance.length() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_position_blocked_over_physics() {
        let scene = scene();
        let patterns = NamePatterns::default();
        let exclusions = Exclusions {
            agent: Some(scene.tank),
            nav_surface: Some(scene.ground),
        };
        let foreign = BlockingFilter::foreign(&patterns, exclusions);
        let params = ProjectionParams::default();

        assert!(is_position_blocked(
            &scene.physics,
            &foreign,
            Vec3::new(10.0, 0.0, 10.0),
            &params
        ));
        // Listed scenery is not "foreign"
        assert!(!is_position_blocked(
            &scene.physics,
            &foreign,
            Vec3::new(0.0, 0.0, 3.0),
            &params
        ));
        assert!(!is_position_blocked(
            &scene.physics,
            &foreign,
            Vec3::new(-20.0, 0.0, -20.0),
            &params
        ));
    }

    #[test]
    fn test_kinematic_body_moves_after_step() {
        let mut scene = scene();
        scene
            .physics
            .set_kinematic_position(scene.tank_body, Vec3::new(5.0, 0.5, 0.0));
        scene.physics.step(1.0 / 60.0);

        let position = scene.physics.get_position(scene.tank_body).unwrap();
        assert!((position - Vec3::new(5.0, 0.5, 0.0)).length() < 0.01);

        let ray = ProbeRay::new(Vec3::new(5.0, 0.5, -5.0), Vec3::Z, 10.0);
        let hit = scene.physics.query_ray(&ray, &accept_all).unwrap();
        assert_eq!(hit.id, scene.tank);
    }

    #[test]
    fn test_remove_body_forgets_names() {
        let mut scene = scene();
        let count = scene.physics.obstacle_count();
        scene.physics.remove_body(scene.tank_body);
        scene.physics.update_queries();

        assert_eq!(scene.physics.obstacle_count(), count - 1);
        assert_eq!(scene.physics.obstacle_name(scene.tank), "");
    }
}
