//! Box gravity volumes with optional kill planes.
//!
//! A volume pulls along its local -Y while a player is inside its sensor.
//! Bodies leaving through the configured kill side are teleported to the
//! volume's respawn point.

use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionEvent;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

use crate::gravity::{GravityKind, GravitySource};
use crate::player::Player;

/// Which side of a volume counts as falling out of the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KillDirection {
    #[default]
    None = 0,
    Up = 1,
    Down = -1,
}

/// Gravity state of a box volume.
#[derive(Debug, Clone, PartialEq)]
pub struct GravityVolume {
    pub strength: f32,
    pub kill: KillDirection,
    pub respawn_point: Option<Entity>,
    /// Set while a player overlaps the volume's sensor.
    pub occupied: bool,
}

impl Default for GravityVolume {
    fn default() -> Self {
        Self { strength: 9.81, kill: KillDirection::None, respawn_point: None, occupied: false }
    }
}

impl GravityVolume {
    pub(crate) fn acceleration(&self, transform: &GlobalTransform) -> Vec3 {
        if !self.occupied {
            return Vec3::ZERO;
        }
        *transform.up() * -self.strength
    }

    /// Whether a body leaving at `exit_position` left through the kill side.
    #[must_use]
    pub fn is_kill_exit(&self, transform: &GlobalTransform, exit_position: Vec3) -> bool {
        self.kill != KillDirection::None && exit_side(transform, exit_position) == self.kill as i32
    }
}

/// -1, 0 or 1 depending on whether `exit_position` lies below, level with or
/// above the volume, measured against the volume's up axis.
///
/// Only the world-vertical offset is considered, so the result is 0 for
/// volumes tipped on their side.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn exit_side(transform: &GlobalTransform, exit_position: Vec3) -> i32 {
    let exit = Vec3::new(0.0, exit_position.y - transform.translation().y, 0.0).normalize_or_zero();
    transform.up().dot(exit).round() as i32
}

/// Sent after a body was moved back to a respawn point.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Respawned {
    pub entity: Entity,
    pub volume: Entity,
    pub position: Vec3,
}

/// Track players entering/leaving gravity volumes and apply kill planes.
#[allow(clippy::needless_pass_by_value)]
pub fn track_volume_occupancy(
    mut events: EventReader<CollisionEvent>,
    mut volumes: Query<(&mut GravitySource, &GlobalTransform)>,
    players: Query<(), With<Player>>,
    positions: Query<&GlobalTransform, Without<GravitySource>>,
    mut bodies: Query<&mut Transform, Without<GravitySource>>,
    mut respawned: EventWriter<Respawned>,
) {
    for event in events.read() {
        let (a, b, entered, flags) = match *event {
            CollisionEvent::Started(a, b, flags) => (a, b, true, flags),
            CollisionEvent::Stopped(a, b, flags) => (a, b, false, flags),
        };

        for (volume_entity, other) in [(a, b), (b, a)] {
            let Ok((mut source, volume_transform)) = volumes.get_mut(volume_entity) else {
                continue;
            };
            let GravityKind::Volume(volume) = &mut source.kind else {
                continue;
            };

            if players.contains(other) {
                volume.occupied = entered;
            }

            if entered || flags.contains(CollisionEventFlags::REMOVED) {
                continue;
            }
            let Ok(other_transform) = positions.get(other) else {
                continue;
            };
            if !volume.is_kill_exit(volume_transform, other_transform.translation()) {
                continue;
            }

            let Some(respawn) = volume.respawn_point.and_then(|e| positions.get(e).ok()) else {
                warn!("gravity volume {volume_entity:?} has a kill plane but no respawn point");
                continue;
            };
            let position = respawn.translation();
            if let Ok(mut transform) = bodies.get_mut(other) {
                transform.translation = position;
                info!("{other:?} left volume {volume_entity:?} through its kill side, respawning at {position}");
                respawned.send(Respawned { entity: other, volume: volume_entity, position });
            }
        }
    }
}
