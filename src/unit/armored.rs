//! Steered tank unit
//!
//! Glues the planner, the turret aimer and animation selection onto one
//! entity. The host supplies ray queries and the skeleton/animation names.

use glam::Vec3;

use crate::ai::{
    AgentState, BlockingFilter, Exclusions, NavSurface, NavTarget, ObstacleId, ObstacleQuery,
    SteeringPlanner, TurretAimer, check_collision, is_position_blocked,
};
use crate::animation::{ActionPlayer, AnimationRegistry, Skeleton, TurretAnchor};
use crate::core::{ConfigError, NavConfig};

/// Looping animation while driving
pub const MOVEMENT_ANIMATION: &str = "Tank_Movement";
/// Looping animation while parked
pub const IDLE_ANIMATION: &str = "Tank_Idle";
/// Played for either gun
pub const ATTACK_ANIMATION: &str = "Tank_Attack";

/// Discrete actions a tank can be ordered to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmoredAction {
    /// Fire the main cannon
    FireMainGun,
    /// Fire the coaxial gun
    FireSecondaryGun,
    /// Pop smoke
    DeploySmoke,
    /// Field repair
    UseRepairKit,
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No target to drive to
    Idle,
    /// Moved by the given delta
    Moved(Vec3),
    /// Reached the target and cleared it
    Arrived,
}

/// A steered, turreted ground unit
#[derive(Debug, Clone)]
pub struct Armored {
    config: NavConfig,
    agent: AgentState,
    /// The unit's own collider in the host scene
    body: Option<ObstacleId>,
    target: Option<NavTarget>,
    skeleton: Skeleton,
    aimer: TurretAimer,
    animations: AnimationRegistry,
    player: ActionPlayer,
}

impl Armored {
    /// Build a unit from its rig and the host's animation group names
    ///
    /// The turret bone is resolved here, once; a missing bone is logged and
    /// leaves the turret at identity orientation.
    ///
    /// # Errors
    ///
    /// Returns an error if the config fails validation
    pub fn new<I, S>(
        skeleton: Skeleton,
        animation_names: I,
        spawn: Vec3,
        config: NavConfig,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        config.validate()?;
        let anchor = TurretAnchor::resolve(&skeleton, &config.turret_bone);
        let animations = AnimationRegistry::from_names(animation_names);
        log::debug!(
            "Armored unit at {spawn} with {} bones, {} animations, anchor {anchor:?}",
            skeleton.bone_count(),
            animations.len()
        );

        Ok(Self {
            config,
            agent: AgentState::new(spawn),
            body: None,
            target: None,
            skeleton,
            aimer: TurretAimer::new(anchor),
            animations,
            player: ActionPlayer::new(),
        })
    }

    /// Record the unit's own collider so probes ignore it
    #[must_use]
    pub fn with_body(mut self, body: ObstacleId) -> Self {
        self.body = Some(body);
        self
    }

    fn exclusions<S: NavSurface + ?Sized>(&self, surface: &S) -> Exclusions {
        Exclusions {
            agent: self.body,
            nav_surface: surface.surface_id(),
        }
    }

    /// Set a new target, snapped onto the nav surface
    pub fn set_target<S: NavSurface + ?Sized>(&mut self, surface: &S, target: Vec3) {
        let target = NavTarget::project(surface, target, &self.config.projection);
        log::debug!("Target {} projected to {}", target.target, target.projected);
        self.target = Some(target);
    }

    /// Forget the current target
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    /// Advance one simulation tick
    pub fn update<H>(&mut self, host: &H, dt: f32) -> TickOutcome
    where
        H: ObstacleQuery + NavSurface + ?Sized,
    {
        let Some(target) = self.target else {
            return TickOutcome::Idle;
        };

        let to_target = target.projected - self.agent.position;
        let distance = Vec3::new(to_target.x, 0.0, to_target.z).length();
        if distance <= self.config.arrive_radius {
            return self.arrive();
        }

        let filter = BlockingFilter::blocking(&self.config.blocking_names, self.exclusions(host));
        let planner = SteeringPlanner::new(host, &filter, self.config.steering);
        let steering = planner.compute_steering(self.agent.position, target.projected);
        if steering == Vec3::ZERO {
            return self.arrive();
        }

        let travel = (self.config.move_speed * dt).min(distance);
        let delta = steering * travel;
        self.agent.position += delta;
        self.agent.face(steering);
        self.player.play(&self.animations, MOVEMENT_ANIMATION);
        log::trace!("Steering {steering}, now at {}", self.agent.position);
        TickOutcome::Moved(delta)
    }

    fn arrive(&mut self) -> TickOutcome {
        log::debug!("Reached target at {}", self.agent.position);
        self.target = None;
        self.set_idle_animation();
        TickOutcome::Arrived
    }

    /// Fan avoidance along the current facing
    #[must_use]
    pub fn avoid_obstacles<H>(&self, host: &H) -> Vec3
    where
        H: ObstacleQuery + NavSurface + ?Sized,
    {
        let filter = BlockingFilter::blocking(&self.config.blocking_names, self.exclusions(host));
        SteeringPlanner::new(host, &filter, self.config.steering)
            .fan_avoidance_along(self.agent.position, self.agent.facing)
    }

    /// Nudge the unit by a world-space delta
    pub fn correct_position(&mut self, delta: Vec3) {
        self.agent.position += delta;
    }

    /// Teleport the unit and show it driving
    pub fn move_to(&mut self, position: Vec3) {
        self.agent.position = position;
        self.player.play(&self.animations, MOVEMENT_ANIMATION);
    }

    /// Check a position for obstacles that are not known scenery
    #[must_use]
    pub fn is_position_blocked<H>(&self, host: &H, position: Vec3) -> bool
    where
        H: ObstacleQuery + NavSurface + ?Sized,
    {
        let filter = BlockingFilter::foreign(&self.config.blocking_names, self.exclusions(host));
        is_position_blocked(host, &filter, position, &self.config.projection)
    }

    /// Check for anything but this unit just below a position
    #[must_use]
    pub fn check_collision<Q: ObstacleQuery + ?Sized>(&self, host: &Q, position: Vec3) -> bool {
        check_collision(host, self.body, position, &self.config.projection)
    }

    /// Turn the turret towards a point and return the yaw
    pub fn aim_at(&mut self, target: Vec3) -> f32 {
        self.aimer
            .aim_at(&mut self.skeleton, self.agent.position, target)
    }

    /// Set turret yaw directly
    pub fn rotate_turret(&mut self, yaw: f32) {
        self.aimer.rotate(&mut self.skeleton, yaw);
    }

    /// Carry out an ordered action
    pub fn perform_action(&mut self, action: ArmoredAction) {
        match action {
            ArmoredAction::FireMainGun => {
                log::info!("Firing main gun");
                self.player.play(&self.animations, ATTACK_ANIMATION);
            }
            ArmoredAction::FireSecondaryGun => {
                log::info!("Firing secondary gun");
                self.player.play(&self.animations, ATTACK_ANIMATION);
            }
            ArmoredAction::DeploySmoke => log::info!("Deploying smoke"),
            ArmoredAction::UseRepairKit => log::info!("Using repair kit"),
        }
    }

    /// Play the parked animation
    pub fn set_idle_animation(&mut self) {
        self.player.play(&self.animations, IDLE_ANIMATION);
    }

    /// Play any animation the host loaded
    pub fn play_animation_by_name(&mut self, name: &str) -> bool {
        self.player.play(&self.animations, name)
    }

    /// Stop the current animation
    pub fn stop_current_animation(&mut self) {
        self.player.stop();
    }

    /// Stop a specific animation if it is playing
    pub fn stop_animation(&mut self, name: &str) {
        self.player.stop_named(&self.animations, name);
    }

    /// Stop every animation group
    ///
    /// Clears the tracked animation and raises a halt the host observes
    /// through [`ActionPlayer::halted_at`].
    pub fn stop_all_animations(&mut self) {
        self.player.stop_all();
    }

    /// Names of every animation the host loaded
    pub fn animation_names(&self) -> impl Iterator<Item = &str> {
        self.animations.names()
    }

    /// Name of the animation the host should be playing
    #[must_use]
    pub fn current_animation(&self) -> Option<&str> {
        self.player.current_name(&self.animations)
    }

    /// Playback state for host sync
    #[must_use]
    pub const fn player(&self) -> &ActionPlayer {
        &self.player
    }

    /// Current position
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.agent.position
    }

    /// Current position and facing
    #[must_use]
    pub const fn agent(&self) -> &AgentState {
        &self.agent
    }

    /// Current target, if any
    #[must_use]
    pub const fn target(&self) -> Option<&NavTarget> {
        self.target.as_ref()
    }

    /// The unit's collider id
    #[must_use]
    pub const fn body(&self) -> Option<ObstacleId> {
        self.body
    }

    /// Posed skeleton for the host to apply
    #[must_use]
    pub const fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Turret aiming state
    #[must_use]
    pub const fn turret(&self) -> &TurretAimer {
        &self.aimer
    }

    /// Config in use
    #[must_use]
    pub const fn config(&self) -> &NavConfig {
        &self.config
    }
}
