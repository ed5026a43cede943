//! Projectiles fired by the gun.

use std::collections::HashSet;

use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionEvent;
use bevy_rapier3d::rapier::geometry::CollisionEventFlags;

use crate::interaction::InteractionHit;
use crate::physics::projectile_physics_bundle;
use crate::settings::Settings;
use crate::weapon::{FireMode, ProjectileMode};

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub mode: ProjectileMode,
    /// Collisions left before the projectile resolves against what it hit.
    pub hits_remaining: u32,
    pub speed: f32,
    /// Seconds since spawn.
    pub age: f32,
}

impl Projectile {
    #[must_use]
    pub fn new(mode: ProjectileMode, fire_mode: FireMode, speed: f32) -> Self {
        Self { mode, hits_remaining: fire_mode.hit_count(), speed, age: 0.0 }
    }

    /// Count one collision. Returns `true` when this was the last hit.
    ///
    /// A projectile spawned with no hits never resolves on collision and is
    /// only removed by its lifetime.
    pub fn register_hit(&mut self) -> bool {
        match self.hits_remaining {
            0 => false,
            1 => {
                self.hits_remaining = 0;
                true
            }
            n => {
                self.hits_remaining = n - 1;
                false
            }
        }
    }
}

/// Shared render assets for projectiles.
#[derive(Resource, Debug, Clone)]
pub struct ProjectileAssets {
    pub mesh: Handle<Mesh>,
    pub positive: Handle<StandardMaterial>,
    pub negative: Handle<StandardMaterial>,
}

impl ProjectileAssets {
    #[must_use]
    pub fn material(&self, mode: ProjectileMode) -> Handle<StandardMaterial> {
        match mode {
            ProjectileMode::Positive => self.positive.clone(),
            ProjectileMode::Negative => self.negative.clone(),
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn setup_projectile_assets(
    mut commands: Commands,
    settings: Res<Settings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let emissive = |color: LinearRgba| StandardMaterial {
        base_color: color.into(),
        emissive: color * 4.0,
        ..default()
    };
    commands.insert_resource(ProjectileAssets {
        mesh: meshes.add(Sphere::new(settings.weapon.projectile_radius)),
        positive: materials.add(emissive(LinearRgba::rgb(0.2, 0.4, 1.0))),
        negative: materials.add(emissive(LinearRgba::rgb(1.0, 0.25, 0.1))),
    });
}

/// Spawn a projectile at `origin` flying along the origin's forward axis.
pub fn spawn_projectile(
    commands: &mut Commands,
    assets: Option<&ProjectileAssets>,
    origin: Transform,
    projectile: Projectile,
    radius: f32,
) -> Entity {
    let velocity = *origin.forward() * projectile.speed;
    let mut entity = commands.spawn((
        Name::new("Projectile"),
        projectile_physics_bundle(radius, velocity),
    ));
    match assets {
        Some(assets) => entity.insert(PbrBundle {
            mesh: assets.mesh.clone(),
            material: assets.material(projectile.mode),
            transform: origin,
            ..default()
        }),
        None => entity.insert(SpatialBundle::from_transform(origin)),
    };
    entity.insert(projectile);
    entity.id()
}

/// Count projectile collisions; a spent projectile reports an
/// [`InteractionHit`] on what it hit and is removed.
#[allow(clippy::needless_pass_by_value)]
pub fn handle_projectile_hits(
    mut commands: Commands,
    mut events: EventReader<CollisionEvent>,
    mut projectiles: Query<&mut Projectile>,
    mut hits: EventWriter<InteractionHit>,
) {
    let mut spent = HashSet::new();

    for event in events.read() {
        let CollisionEvent::Started(a, b, flags) = *event else {
            continue;
        };
        if flags.contains(CollisionEventFlags::SENSOR) {
            continue;
        }
        for (entity, other) in [(a, b), (b, a)] {
            if spent.contains(&entity) {
                continue;
            }
            let Ok(mut projectile) = projectiles.get_mut(entity) else {
                continue;
            };
            if !projectile.register_hit() {
                continue;
            }
            hits.send(InteractionHit { target: other, mode: projectile.mode });
            commands.entity(entity).despawn_recursive();
            spent.insert(entity);
        }
    }
}

/// Remove projectiles older than the configured lifetime.
#[allow(clippy::needless_pass_by_value)]
pub fn expire_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    settings: Res<Settings>,
    mut projectiles: Query<(Entity, &mut Projectile)>,
) {
    let lifetime = settings.weapon.projectile_lifetime;
    for (entity, mut projectile) in &mut projectiles {
        projectile.age += time.delta_seconds();
        if projectile.age >= lifetime {
            debug!("projectile {entity:?} expired after {:.1}s", projectile.age);
            commands.entity(entity).despawn_recursive();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn hit_app() -> App {
        let mut app = App::new();
        app.add_event::<CollisionEvent>();
        app.add_event::<InteractionHit>();
        app.add_systems(Update, handle_projectile_hits);
        app
    }

    fn sent_hits(app: &App) -> Vec<InteractionHit> {
        let events = app.world().resource::<Events<InteractionHit>>();
        events.iter_current_update_events().copied().collect()
    }

    #[test]
    fn direct_projectile_resolves_on_first_hit() {
        let mut p = Projectile::new(ProjectileMode::Positive, FireMode::Direct, 30.0);
        assert!(p.register_hit());
        assert_eq!(p.hits_remaining, 0);
    }

    #[test]
    fn bounce_projectile_resolves_on_second_hit() {
        let mut p = Projectile::new(ProjectileMode::Positive, FireMode::Bounce, 30.0);
        assert!(!p.register_hit());
        assert!(p.register_hit());
    }

    #[test]
    fn zero_hit_projectile_never_resolves() {
        let mut p = Projectile { hits_remaining: 0, ..Projectile::new(ProjectileMode::Negative, FireMode::Direct, 1.0) };
        for _ in 0..5 {
            assert!(!p.register_hit());
        }
    }

    #[test]
    fn spent_projectile_reports_hit_and_despawns() {
        let mut app = hit_app();
        let wall = app.world_mut().spawn_empty().id();
        let projectile = app
            .world_mut()
            .spawn(Projectile::new(ProjectileMode::Negative, FireMode::Direct, 30.0))
            .id();

        app.world_mut().send_event(CollisionEvent::Started(wall, projectile, CollisionEventFlags::empty()));
        app.update();

        assert!(app.world().get_entity(projectile).is_none());
        assert_eq!(sent_hits(&app), vec![InteractionHit { target: wall, mode: ProjectileMode::Negative }]);
    }

    #[test]
    fn bouncing_projectile_survives_first_hit() {
        let mut app = hit_app();
        let wall = app.world_mut().spawn_empty().id();
        let projectile = app
            .world_mut()
            .spawn(Projectile::new(ProjectileMode::Positive, FireMode::Bounce, 30.0))
            .id();

        app.world_mut().send_event(CollisionEvent::Started(projectile, wall, CollisionEventFlags::empty()));
        app.update();
        assert!(app.world().get_entity(projectile).is_some());
        assert!(sent_hits(&app).is_empty());

        app.world_mut().send_event(CollisionEvent::Started(projectile, wall, CollisionEventFlags::empty()));
        app.update();
        assert!(app.world().get_entity(projectile).is_none());
        assert_eq!(sent_hits(&app).len(), 1);
    }

    #[test]
    fn sensor_overlaps_do_not_count() {
        let mut app = hit_app();
        let volume = app.world_mut().spawn_empty().id();
        let projectile = app
            .world_mut()
            .spawn(Projectile::new(ProjectileMode::Positive, FireMode::Direct, 30.0))
            .id();

        app.world_mut().send_event(CollisionEvent::Started(projectile, volume, CollisionEventFlags::SENSOR));
        app.update();
        assert_eq!(app.world().get::<Projectile>(projectile).unwrap().hits_remaining, 1);
    }

    #[test]
    fn projectiles_expire_after_lifetime() {
        let mut app = App::new();
        let mut settings = Settings::default();
        settings.weapon.projectile_lifetime = 1.0;
        app.insert_resource(settings);
        app.init_resource::<Time>();
        app.add_systems(Update, expire_projectiles);

        let projectile = app
            .world_mut()
            .spawn(Projectile::new(ProjectileMode::Positive, FireMode::Direct, 30.0))
            .id();

        app.world_mut().resource_mut::<Time>().advance_by(Duration::from_millis(600));
        app.update();
        assert!(app.world().get_entity(projectile).is_some());

        app.world_mut().resource_mut::<Time>().advance_by(Duration::from_millis(600));
        app.update();
        assert!(app.world().get_entity(projectile).is_none());
    }
}
