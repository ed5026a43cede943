//! Demo scene spawned at startup.
//!
//! A start island under normal gravity, a trigger that tips gravity onto
//! its side, a small planet, a gravity shaft with a kill floor, a water pool
//! with floating crates, hit-reactive blocks and a moving platform.
use bevy::prelude::*;
use bevy_rapier3d::prelude::Collider;
use polarity::gravity::{
    GravityBody, GravitySource, GravityTrigger, GravityVolume, KillDirection, PlaneGravity, SphereGravity, Water,
};
use polarity::interaction::{Axis, InteractionKind, InteractionObject, Platform};
use polarity::physics::{
    gravity_body_physics_bundle, kinematic_physics_bundle, sensor_bundle, static_collider_bundle,
    static_physics_bundle,
};
use polarity::player::spawn_player;
use polarity::settings::Settings;
use polarity::weapon::{Gun, WeaponSway};

use crate::app::platforms::MovingPlatform;
use crate::app::sync::GlobalGravity;

const PLAYER_START: Vec3 = Vec3::new(0.0, 2.0, 0.0);

fn spawn_block(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    material: &Handle<StandardMaterial>,
    position: Vec3,
    half: Vec3,
) -> Entity {
    commands
        .spawn((
            PbrBundle {
                mesh: meshes.add(Cuboid::from_size(half * 2.0)),
                material: material.clone(),
                transform: Transform::from_translation(position),
                ..default()
            },
            static_physics_bundle(half),
        ))
        .id()
}

/// Spawn lights, level geometry, gravity sources and the player.
#[allow(clippy::needless_pass_by_value, clippy::too_many_lines)]
pub fn setup(
    mut commands: Commands,
    settings: Res<Settings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight { shadows_enabled: true, illuminance: 8000.0, ..default() },
        transform: Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
    commands.insert_resource(AmbientLight { color: Color::WHITE, brightness: 300.0 });

    let grey = materials.add(Color::srgb(0.6, 0.6, 0.65));
    let crate_material = materials.add(Color::srgb(0.6, 0.4, 0.2));
    let water_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.1, 0.3, 0.8, 0.4),
        alpha_mode: AlphaMode::Blend,
        ..default()
    });

    // start island and stepping stones
    spawn_block(&mut commands, &mut meshes, &grey, Vec3::new(0.0, -0.5, 0.0), Vec3::new(8.0, 0.5, 8.0));
    for i in 0..3u8 {
        let position = Vec3::new(12.0 + f32::from(i) * 5.0, f32::from(i), 0.0);
        let step = spawn_block(&mut commands, &mut meshes, &grey, position, Vec3::new(1.5, 0.25, 1.5));
        commands.entity(step).insert(Platform::default());
    }

    // global gravity, swapped for a sideways pull by the trigger at the end of the stones
    let global = commands
        .spawn((GravitySource::global(settings.gravity.global), GlobalGravity, SpatialBundle::default()))
        .id();
    let sideways = commands
        .spawn((
            GravitySource::global(Vec3::new(settings.gravity.global.length(), 0.0, 0.0)).disabled(),
            SpatialBundle::default(),
        ))
        .id();
    commands.spawn((
        Name::new("Gravity trigger"),
        GravityTrigger::new(Some(sideways), Some(global)),
        SpatialBundle::from_transform(Transform::from_xyz(22.0, 4.0, 0.0)),
        sensor_bundle(Vec3::new(1.5, 2.0, 1.5)),
    ));
    spawn_block(&mut commands, &mut meshes, &grey, Vec3::new(30.0, 8.0, 0.0), Vec3::new(0.5, 8.0, 6.0));

    // planet
    commands.spawn((
        Name::new("Planet"),
        GravitySource::sphere(SphereGravity {
            gravity: 9.81,
            outer_radius: 12.0,
            outer_falloff_radius: 18.0,
        }),
        PbrBundle {
            mesh: meshes.add(Sphere::new(6.0)),
            material: grey.clone(),
            transform: Transform::from_xyz(0.0, 10.0, -40.0),
            ..default()
        },
        static_collider_bundle(Collider::ball(6.0)),
    ));

    // upside-down ceiling plane, pulls up anything thrown higher than 24
    commands.spawn((
        Name::new("Ceiling"),
        GravitySource::plane(PlaneGravity { gravity: 9.81, range: 6.0 }),
        SpatialBundle::from_transform(
            Transform::from_xyz(0.0, 30.0, 0.0).with_rotation(Quat::from_rotation_x(std::f32::consts::PI)),
        ),
    ));

    // gravity shaft with a kill floor
    let respawn = commands
        .spawn((Name::new("Respawn"), SpatialBundle::from_transform(Transform::from_translation(PLAYER_START))))
        .id();
    commands.spawn((
        Name::new("Gravity shaft"),
        GravitySource::volume(GravityVolume {
            strength: 14.0,
            kill: KillDirection::Down,
            respawn_point: Some(respawn),
            occupied: false,
        }),
        SpatialBundle::from_transform(Transform::from_xyz(-16.0, -10.0, 0.0)),
        sensor_bundle(Vec3::new(4.0, 10.0, 4.0)),
    ));

    // water pool with floating crates
    commands.spawn((
        Name::new("Water"),
        Water,
        PbrBundle {
            mesh: meshes.add(Cuboid::new(8.0, 2.0, 8.0)),
            material: water_material,
            transform: Transform::from_xyz(0.0, -1.0, 16.0),
            ..default()
        },
        sensor_bundle(Vec3::new(4.0, 1.0, 4.0)),
    ));
    spawn_block(&mut commands, &mut meshes, &grey, Vec3::new(0.0, -2.25, 16.0), Vec3::new(4.0, 0.25, 4.0));
    for (i, x) in [-2.0f32, 0.0, 2.0].into_iter().enumerate() {
        let body = if i == 1 { GravityBody::floating() } else { let mut body = GravityBody::default(); body.buoyancy = 1.2; body };
        commands.spawn((
            Name::new("Crate"),
            body,
            PbrBundle {
                mesh: meshes.add(Cuboid::from_length(0.8)),
                material: crate_material.clone(),
                transform: Transform::from_xyz(x, 3.0, 16.0),
                ..default()
            },
            gravity_body_physics_bundle(Collider::cuboid(0.4, 0.4, 0.4)),
        ));
    }

    // hit-reactive blocks, one per kind and axis
    let objects = [
        (InteractionObject::new(InteractionKind::Move, Axis::Y, 1.0, 3, 1), Vec3::new(-6.0, 1.0, -6.0)),
        (InteractionObject::new(InteractionKind::Rotate, Axis::Y, 45.0, 4, 4), Vec3::new(0.0, 1.0, -6.0)),
        (InteractionObject::new(InteractionKind::Scale, Axis::X, 0.5, 4, 1), Vec3::new(6.0, 1.0, -6.0)),
    ];
    for (object, position) in objects {
        let entity = spawn_block(&mut commands, &mut meshes, &grey, position, Vec3::splat(1.0));
        commands.entity(entity).insert(object);
    }

    // moving platform
    let moving = commands
        .spawn((
            Name::new("Moving platform"),
            PbrBundle {
                mesh: meshes.add(Cuboid::new(3.0, 0.5, 3.0)),
                material: grey.clone(),
                transform: Transform::from_xyz(-10.0, 0.0, 10.0),
                ..default()
            },
            kinematic_physics_bundle(Vec3::new(1.5, 0.25, 1.5)),
            Platform::default(),
        ))
        .id();
    commands.entity(moving).insert(MovingPlatform {
        origin: Vec3::new(-10.0, 0.0, 10.0),
        offset: Vec3::new(0.0, 4.0, -8.0),
        period: 6.0,
    });

    // player, weapon and its pose anchors under the camera pivot
    let (body, pivot) = spawn_player(&mut commands, PLAYER_START);
    let walk = commands.spawn(SpatialBundle::from_transform(Transform::from_xyz(0.3, -0.3, -0.6))).id();
    let shoot = commands
        .spawn(SpatialBundle::from_transform(
            Transform::from_xyz(0.0, -0.2, -0.45).with_rotation(Quat::from_rotation_x(0.05)),
        ))
        .id();
    let weapon = commands
        .spawn((
            Name::new("Weapon"),
            WeaponSway::new(walk, shoot),
            PbrBundle {
                mesh: meshes.add(Cuboid::new(0.1, 0.12, 0.5)),
                material: materials.add(Color::srgb(0.15, 0.15, 0.18)),
                transform: Transform::from_xyz(0.3, -0.3, -0.6),
                ..default()
            },
        ))
        .id();
    commands.entity(pivot).push_children(&[walk, shoot, weapon]);
    commands.entity(body).insert(Gun::new(Some(pivot), Some(weapon)));

    info!("demo scene ready, player at {PLAYER_START}");
}
