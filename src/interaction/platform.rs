//! Platforms that change color once the player has stood on them.

use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionEvent;

use crate::player::Player;

#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub visited: bool,
}

#[derive(Resource, Debug, Clone)]
pub struct PlatformMaterials {
    pub unvisited: Handle<StandardMaterial>,
    pub visited: Handle<StandardMaterial>,
}

pub fn setup_platform_materials(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    commands.insert_resource(PlatformMaterials {
        unvisited: materials.add(Color::srgb(0.45, 0.45, 0.5)),
        visited: materials.add(Color::srgb(0.25, 0.75, 0.35)),
    });
}

/// Give new platforms the unvisited material.
#[allow(clippy::needless_pass_by_value)]
pub fn init_platforms(
    palette: Option<Res<PlatformMaterials>>,
    mut commands: Commands,
    platforms: Query<(Entity, &Platform), Added<Platform>>,
) {
    let Some(palette) = palette else { return };
    for (entity, platform) in &platforms {
        let material = if platform.visited { &palette.visited } else { &palette.unvisited };
        commands.entity(entity).insert(material.clone());
    }
}

/// Mark a platform visited the first time the player collides with it.
#[allow(clippy::needless_pass_by_value)]
pub fn mark_visited_platforms(
    palette: Option<Res<PlatformMaterials>>,
    mut commands: Commands,
    mut events: EventReader<CollisionEvent>,
    players: Query<(), With<Player>>,
    mut platforms: Query<&mut Platform>,
) {
    for event in events.read() {
        let CollisionEvent::Started(a, b, _) = *event else {
            continue;
        };
        for (entity, other) in [(a, b), (b, a)] {
            if !players.contains(other) {
                continue;
            }
            let Ok(mut platform) = platforms.get_mut(entity) else {
                continue;
            };
            if platform.visited {
                continue;
            }
            platform.visited = true;
            if let Some(palette) = &palette {
                commands.entity(entity).insert(palette.visited.clone());
            }
            debug!("platform {entity:?} visited");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

    fn app() -> (App, PlatformMaterials) {
        let mut app = App::new();
        app.add_event::<CollisionEvent>();
        app.init_resource::<Assets<StandardMaterial>>();
        app.add_systems(Startup, setup_platform_materials);
        app.add_systems(Update, (init_platforms, mark_visited_platforms).chain());
        app.update();
        let palette = app.world().resource::<PlatformMaterials>().clone();
        (app, palette)
    }

    fn material(app: &App, e: Entity) -> Handle<StandardMaterial> {
        app.world().get::<Handle<StandardMaterial>>(e).unwrap().clone()
    }

    #[test]
    fn new_platform_is_unvisited() {
        let (mut app, palette) = app();
        let platform = app.world_mut().spawn(Platform::default()).id();
        app.update();
        assert_eq!(material(&app, platform), palette.unvisited);
    }

    #[test]
    fn player_contact_marks_visited_once() {
        let (mut app, palette) = app();
        let platform = app.world_mut().spawn(Platform::default()).id();
        let player = app.world_mut().spawn(Player::default()).id();
        app.update();

        app.world_mut().send_event(CollisionEvent::Started(player, platform, CollisionEventFlags::empty()));
        app.update();
        assert!(app.world().get::<Platform>(platform).unwrap().visited);
        assert_eq!(material(&app, platform), palette.visited);

        // later contacts leave the platform as it is
        app.world_mut().entity_mut(platform).insert(palette.unvisited.clone());
        app.world_mut().send_event(CollisionEvent::Started(platform, player, CollisionEventFlags::empty()));
        app.update();
        assert_eq!(material(&app, platform), palette.unvisited);
    }

    #[test]
    fn other_bodies_do_not_visit() {
        let (mut app, _) = app();
        let platform = app.world_mut().spawn(Platform::default()).id();
        let crate_entity = app.world_mut().spawn_empty().id();
        app.update();

        app.world_mut().send_event(CollisionEvent::Started(crate_entity, platform, CollisionEventFlags::empty()));
        app.update();
        assert!(!app.world().get::<Platform>(platform).unwrap().visited);
    }
}
