//! Headless demo: drive a tank around a wall and open fire

use armored::prelude::*;

const TICK: f32 = 1.0 / 60.0;
const MAX_TICKS: usize = 1200;

/// Scenery and the tank's own collider
struct DemoScene {
    physics: Physics,
    tank_body: RigidBodyHandle,
    tank_collider: ObstacleId,
}

impl DemoScene {
    fn new(spawn: Vec3) -> Self {
        let mut physics = Physics::new();
        physics.add_nav_surface("NavMesh", Vec3::ZERO, 100.0, 100.0);
        physics.add_static_box(
            "Road_01",
            Vec3::new(-6.0, 0.05, 15.0),
            Quat::IDENTITY,
            Vec3::new(1.5, 0.05, 20.0),
        );
        physics.add_static_box(
            "EnergyRes_RenewablePlant_Wall_01",
            Vec3::new(0.0, 1.0, 10.0),
            Quat::IDENTITY,
            Vec3::new(0.6, 1.0, 0.3),
        );
        physics.add_static_box(
            "SupplyCrate",
            Vec3::new(4.0, 0.5, 20.0),
            Quat::IDENTITY,
            Vec3::splat(0.5),
        );

        let tank_body = physics.create_kinematic_body(spawn, Quat::IDENTITY);
        let tank_collider =
            physics.add_box_obstacle(tank_body, "Tank", Vec3::new(0.75, 0.5, 1.2));
        physics.update_queries();

        Self {
            physics,
            tank_body,
            tank_collider,
        }
    }
}

fn tank_rig() -> Skeleton {
    let mut skeleton = Skeleton::new();
    let hull = skeleton.add_bone(Bone::new("hull"));
    let turret = skeleton.add_bone(Bone::new("rotation").with_translation(Vec3::new(0.0, 1.2, 0.0)));
    skeleton.set_parent(turret, hull);
    skeleton
}

fn load_config() -> Result<NavConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) if path.ends_with(".json") => NavConfig::load_json(path),
        Some(path) => NavConfig::load_ron(path),
        None => Ok(NavConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = load_config()?;
    let spawn = Vec3::ZERO;
    let mut scene = DemoScene::new(spawn);

    let mut tank = Armored::new(
        tank_rig(),
        ["Tank_Idle", "Tank_Movement", "Tank_Attack"],
        spawn,
        config,
    )?
    .with_body(scene.tank_collider);
    tank.set_idle_animation();

    let destination = Vec3::new(1.0, 4.0, 24.0);
    tank.set_target(&scene.physics, destination);
    log::info!("Driving to {destination}");

    for tick in 0..MAX_TICKS {
        let outcome = tank.update(&scene.physics, TICK);
        scene
            .physics
            .set_kinematic_position(scene.tank_body, tank.position() + Vec3::Y * 0.5);
        scene.physics.step(TICK);

        if tick % 60 == 0 {
            log::info!(
                "tick {tick}: {} facing {} ({:?})",
                tank.position(),
                tank.agent().facing,
                tank.current_animation()
            );
        }
        if outcome == TickOutcome::Arrived {
            log::info!("Arrived after {tick} ticks at {}", tank.position());
            break;
        }
    }

    let avoidance = tank.avoid_obstacles(&scene.physics);
    log::info!("Fan avoidance at rest: {avoidance}");

    let crate_spot = Vec3::new(4.0, 0.0, 20.0);
    if tank.is_position_blocked(&scene.physics, crate_spot) {
        log::info!("Something is parked at {crate_spot}, engaging");
        let yaw = tank.aim_at(crate_spot);
        log::info!("Turret yaw {:.1} degrees", yaw.to_degrees());
        tank.perform_action(ArmoredAction::FireMainGun);
        tank.perform_action(ArmoredAction::DeploySmoke);
    }

    tank.set_idle_animation();
    log::info!("Done, playing {:?}", tank.current_animation());
    Ok(())
}
