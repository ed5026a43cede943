//! Player components and systems (motor, input, camera).
//!
//! The player is a dynamic rapier body carrying [`Player`], a
//! [`MotorState`], an [`InputAxisConverter`] and a [`PlayerLook`]. The
//! camera hangs off a child [`CameraPivot`] entity.
//!
//! # Example:
//!
//! ```ignore
//! app.add_plugins(PlayerPlugin);
//! let (body, pivot) = spawn_player(&mut commands, Vec3::new(0.0, 2.0, 0.0));
//! ```
pub mod camera;
pub mod contacts;
pub mod input;
pub mod motor;

use bevy::prelude::*;
use bevy::transform::TransformSystem;
use bevy_rapier3d::prelude::PhysicsSet;

pub use camera::*;
pub use contacts::*;
pub use input::*;
pub use motor::*;

use crate::physics::player_physics_bundle;

/// Height of the camera pivot above the body center.
const EYE_HEIGHT: f32 = 0.6;

/// Marks the player body.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    /// Child entity rotated by the look system.
    pub pivot: Option<Entity>,
}

/// Marks the entity whose local rotation is the camera pitch/yaw.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct CameraPivot;

/// Spawn the player body and its camera pivot; returns `(body, pivot)`.
pub fn spawn_player(commands: &mut Commands, position: Vec3) -> (Entity, Entity) {
    let pivot = commands
        .spawn((
            CameraPivot,
            Camera3dBundle {
                transform: Transform::from_xyz(0.0, EYE_HEIGHT, 0.0),
                ..default()
            },
        ))
        .id();

    let body = commands
        .spawn((
            Name::new("Player"),
            Player { pivot: Some(pivot) },
            MotorState::default(),
            InputAxisConverter::default(),
            PlayerLook::default(),
            SpatialBundle::from_transform(Transform::from_translation(position)),
            player_physics_bundle(),
        ))
        .add_child(pivot)
        .id();
    (body, pivot)
}

/// Registers input, motor and look systems.
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (read_move_input, cursor_grab))
            .add_systems(FixedUpdate, motor_step.before(PhysicsSet::SyncBackend))
            .add_systems(PostUpdate, update_look.before(TransformSystem::TransformPropagate));
    }
}
