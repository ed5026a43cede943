//! Physics integration: collision layers and component bundles.
//!
//! Gameplay systems read and write rapier components directly; the bundles
//! here keep the rigidbody setup of each entity type in one place.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

/// Collision group constants for physics filtering.
pub struct PhysicsLayers;

impl PhysicsLayers {
    /// The player body.
    pub const PLAYER: Group = Group::GROUP_1;
    /// Static level geometry, platforms and interaction objects.
    pub const WORLD: Group = Group::GROUP_2;
    /// Loose rigidbodies pulled by the gravity field.
    pub const PROP: Group = Group::GROUP_3;
    /// Gun projectiles.
    pub const PROJECTILE: Group = Group::GROUP_4;
    /// Gravity volumes, gravity triggers and water.
    pub const SENSOR: Group = Group::GROUP_5;
}

/// Capsule player body. Gravity comes from the motor, rotation from the
/// look system.
pub fn player_physics_bundle() -> (
    RigidBody,
    Collider,
    Velocity,
    GravityScale,
    LockedAxes,
    Friction,
    Sleeping,
    Ccd,
    ActiveEvents,
    CollisionGroups,
) {
    (
        RigidBody::Dynamic,
        Collider::capsule_y(0.5, 0.5),
        Velocity::zero(),
        GravityScale(0.0),
        LockedAxes::ROTATION_LOCKED,
        Friction { coefficient: 0.0, combine_rule: CoefficientCombineRule::Min },
        Sleeping::disabled(),
        Ccd::enabled(),
        ActiveEvents::COLLISION_EVENTS,
        CollisionGroups::new(
            PhysicsLayers::PLAYER,
            PhysicsLayers::WORLD | PhysicsLayers::PROP | PhysicsLayers::SENSOR,
        ),
    )
}

/// Fixed box for level geometry.
pub fn static_physics_bundle(half_extents: Vec3) -> (RigidBody, Collider, ActiveEvents, CollisionGroups) {
    static_collider_bundle(Collider::cuboid(half_extents.x, half_extents.y, half_extents.z))
}

/// Fixed level geometry with any collider shape.
pub fn static_collider_bundle(collider: Collider) -> (RigidBody, Collider, ActiveEvents, CollisionGroups) {
    (
        RigidBody::Fixed,
        collider,
        ActiveEvents::COLLISION_EVENTS,
        CollisionGroups::new(PhysicsLayers::WORLD, Group::ALL),
    )
}

/// Kinematic box that carries the player, e.g. a moving platform.
pub fn kinematic_physics_bundle(half_extents: Vec3) -> (RigidBody, Collider, ActiveEvents, CollisionGroups) {
    (
        RigidBody::KinematicPositionBased,
        Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
        ActiveEvents::COLLISION_EVENTS,
        CollisionGroups::new(PhysicsLayers::WORLD, Group::ALL),
    )
}

/// Dynamic prop driven by a `GravityBody` instead of engine gravity.
pub fn gravity_body_physics_bundle(
    collider: Collider,
) -> (
    RigidBody,
    Collider,
    Velocity,
    GravityScale,
    ExternalImpulse,
    ReadMassProperties,
    Sleeping,
    ActiveEvents,
    CollisionGroups,
) {
    (
        RigidBody::Dynamic,
        collider,
        Velocity::zero(),
        GravityScale(0.0),
        ExternalImpulse::default(),
        ReadMassProperties::default(),
        Sleeping::default(),
        ActiveEvents::COLLISION_EVENTS,
        CollisionGroups::new(PhysicsLayers::PROP, Group::ALL),
    )
}

/// Fast small sphere, continuous collision so it does not tunnel.
pub fn projectile_physics_bundle(
    radius: f32,
    velocity: Vec3,
) -> (RigidBody, Collider, Velocity, Ccd, Restitution, ActiveEvents, CollisionGroups) {
    (
        RigidBody::Dynamic,
        Collider::ball(radius),
        Velocity::linear(velocity),
        Ccd::enabled(),
        Restitution::coefficient(0.8),
        ActiveEvents::COLLISION_EVENTS,
        CollisionGroups::new(PhysicsLayers::PROJECTILE, PhysicsLayers::WORLD | PhysicsLayers::PROP),
    )
}

/// Box sensor reporting overlaps with the player and props.
pub fn sensor_bundle(half_extents: Vec3) -> (Collider, Sensor, ActiveEvents, CollisionGroups) {
    (
        Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
        Sensor,
        ActiveEvents::COLLISION_EVENTS,
        CollisionGroups::new(PhysicsLayers::SENSOR, PhysicsLayers::PLAYER | PhysicsLayers::PROP),
    )
}

/// Rate of the fixed schedule that runs the motor, gravity and rapier.
pub const FIXED_TICK_RATE: f64 = 50.0;

/// Rapier configured to step exactly one fixed tick per `FixedUpdate`.
#[must_use]
pub fn fixed_rapier_configuration() -> RapierConfiguration {
    RapierConfiguration {
        timestep_mode: TimestepMode::Fixed { dt: (1.0 / FIXED_TICK_RATE) as f32, substeps: 1 },
        ..RapierConfiguration::new(1.0)
    }
}

/// Rapier running in the fixed schedule. The motor and the integrator share
/// one timestep of `1 / FIXED_TICK_RATE` seconds.
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        // must exist before the rapier plugin, which only inits a default
        app.insert_resource(Time::<Fixed>::from_hz(FIXED_TICK_RATE))
            .insert_resource(fixed_rapier_configuration())
            .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule());
    }
}

/// Headless app with rapier stepping in the fixed schedule, for tests.
#[cfg(test)]
pub(crate) mod test_app {
    use super::*;
    use std::time::Duration;

    pub(crate) fn physics_app() -> App {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            TransformPlugin,
            HierarchyPlugin,
            AssetPlugin::default(),
            bevy::scene::ScenePlugin,
        ));
        app.init_asset::<Mesh>();
        app.add_plugins(PhysicsPlugin);
        app.finish();
        app.cleanup();
        app
    }

    /// Run `ticks` fixed steps, exposing the fixed clock as `Time`.
    pub(crate) fn run_fixed_ticks(app: &mut App, ticks: usize) {
        let step = Duration::from_secs_f64(1.0 / FIXED_TICK_RATE);
        for _ in 0..ticks {
            let world = app.world_mut();
            world.resource_mut::<Time<Fixed>>().advance_by(step);
            let generic = world.resource::<Time<Fixed>>().as_generic();
            *world.resource_mut::<Time>() = generic;
            world.run_schedule(FixedUpdate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::test_app::{physics_app, run_fixed_ticks};
    use std::time::Duration;

    #[test]
    fn rapier_steps_one_fixed_tick_per_update() {
        let mut app = physics_app();
        let config = app.world().resource::<RapierConfiguration>();
        assert!(matches!(config.timestep_mode, TimestepMode::Fixed { substeps: 1, .. }));
        assert_eq!(app.world().resource::<Time<Fixed>>().timestep(), Duration::from_millis(20));

        let body = app
            .world_mut()
            .spawn((
                TransformBundle::default(),
                RigidBody::Dynamic,
                Collider::ball(0.5),
                GravityScale(0.0),
                Velocity::linear(Vec3::X),
            ))
            .id();

        // one second of game time at 1 m/s
        run_fixed_ticks(&mut app, FIXED_TICK_RATE as usize);

        let x = app.world().get::<Transform>(body).unwrap().translation.x;
        assert!((x - 1.0).abs() < 1e-3, "moved {x}");
    }

    #[test]
    fn collision_layers_are_distinct() {
        let layers = [
            PhysicsLayers::PLAYER,
            PhysicsLayers::WORLD,
            PhysicsLayers::PROP,
            PhysicsLayers::PROJECTILE,
            PhysicsLayers::SENSOR,
        ];
        for i in 0..layers.len() {
            for j in (i + 1)..layers.len() {
                assert_ne!(layers[i], layers[j], "layers {i} and {j} overlap");
            }
        }
    }

    #[test]
    fn player_ignores_own_projectiles() {
        let (rigid_body, .., gravity, locked, _, _, _, _, groups) = player_physics_bundle();
        assert!(matches!(rigid_body, RigidBody::Dynamic));
        assert_eq!(gravity.0, 0.0);
        assert_eq!(locked, LockedAxes::ROTATION_LOCKED);
        assert!(!groups.filters.contains(PhysicsLayers::PROJECTILE));
        assert!(groups.filters.contains(PhysicsLayers::SENSOR));
    }

    #[test]
    fn projectiles_hit_world_and_props_only() {
        let (_, _, velocity, _, _, events, groups) = projectile_physics_bundle(0.1, Vec3::X * 30.0);
        assert_eq!(velocity.linvel, Vec3::X * 30.0);
        assert!(events.contains(ActiveEvents::COLLISION_EVENTS));
        assert!(groups.filters.contains(PhysicsLayers::WORLD));
        assert!(!groups.filters.contains(PhysicsLayers::SENSOR));
        assert!(!groups.filters.contains(PhysicsLayers::PLAYER));
    }

    #[test]
    fn gravity_bodies_opt_out_of_engine_gravity() {
        let (rigid_body, _, _, gravity, ..) = gravity_body_physics_bundle(Collider::ball(0.5));
        assert!(matches!(rigid_body, RigidBody::Dynamic));
        assert_eq!(gravity.0, 0.0);
    }

    #[test]
    fn sensors_report_player_and_props() {
        let (_, _, events, groups) = sensor_bundle(Vec3::ONE);
        assert!(events.contains(ActiveEvents::COLLISION_EVENTS));
        assert!(groups.filters.contains(PhysicsLayers::PLAYER));
        assert!(groups.filters.contains(PhysicsLayers::PROP));
    }
}
