//! Contact gathering from the physics narrow phase.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{RapierContext, RigidBody};

use crate::player::motor::MotorState;

/// Separation up to which a solver contact counts as touching. Rapier also
/// reports speculative contacts a little ahead of impact.
pub const TOUCH_DISTANCE: f32 = 0.01;

/// Normal pointing from the other collider toward the player.
///
/// Manifold normals point from collider 1 to collider 2, so they are
/// flipped when the player is collider 1.
#[must_use]
pub fn normal_toward_player(manifold_normal: Vec3, player_is_first: bool) -> Vec3 {
    if player_is_first {
        -manifold_normal
    } else {
        manifold_normal
    }
}

/// Only non-static bodies are tracked as moving platforms.
#[must_use]
pub fn connected_body(other: Entity, body: Option<RigidBody>) -> Option<Entity> {
    match body {
        Some(RigidBody::Fixed) | None => None,
        Some(_) => Some(other),
    }
}

/// Feed every solver contact touching `player` into `motor`.
///
/// `rigid_body_of` resolves the body type of the other collider.
pub fn gather_contacts(
    context: &RapierContext,
    player: Entity,
    rigid_body_of: impl Fn(Entity) -> Option<RigidBody>,
    motor: &mut MotorState,
) {
    for pair in context.contact_pairs_with(player) {
        if !pair.has_any_active_contact() {
            continue;
        }
        let player_is_first = pair.collider1() == player;
        let other = if player_is_first { pair.collider2() } else { pair.collider1() };
        let body = connected_body(other, rigid_body_of(other));

        for manifold in pair.manifolds() {
            let normal = normal_toward_player(manifold.normal(), player_is_first);
            for _ in manifold.solver_contacts().filter(|c| c.dist() <= TOUCH_DISTANCE) {
                motor.add_contact(normal, body);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::test_app::{physics_app, run_fixed_ticks};
    use crate::physics::{kinematic_physics_bundle, player_physics_bundle, static_physics_bundle};

    /// Player capsule standing on a box whose top face is at `y = floor_top`.
    fn standing_player(ground: impl Bundle, floor_top: f32) -> (App, Entity, Entity) {
        let mut app = physics_app();
        let floor = app
            .world_mut()
            .spawn((TransformBundle::from_transform(Transform::from_xyz(0.0, floor_top - 0.5, 0.0)), ground))
            .id();
        // capsule half height 0.5 + radius 0.5, sunk slightly into the floor
        let player = app
            .world_mut()
            .spawn((TransformBundle::from_transform(Transform::from_xyz(0.0, 0.99, 0.0)), player_physics_bundle()))
            .id();
        run_fixed_ticks(&mut app, 2);
        (app, player, floor)
    }

    fn gathered(app: &App, player: Entity, rigid_body_of: impl Fn(Entity) -> Option<RigidBody>) -> MotorState {
        let mut motor = MotorState::default();
        gather_contacts(app.world().resource::<RapierContext>(), player, rigid_body_of, &mut motor);
        motor
    }

    #[test]
    fn normal_is_flipped_for_first_collider() {
        assert_eq!(normal_toward_player(Vec3::NEG_Y, true), Vec3::Y);
        assert_eq!(normal_toward_player(Vec3::Y, false), Vec3::Y);
    }

    #[test]
    fn only_moving_bodies_connect() {
        let e = Entity::from_raw(9);
        assert_eq!(connected_body(e, Some(RigidBody::Fixed)), None);
        assert_eq!(connected_body(e, None), None);
        assert_eq!(connected_body(e, Some(RigidBody::Dynamic)), Some(e));
        assert_eq!(connected_body(e, Some(RigidBody::KinematicPositionBased)), Some(e));
    }

    #[test]
    fn standing_on_static_floor_grounds_without_connection() {
        let (app, player, _) = standing_player(static_physics_bundle(Vec3::new(5.0, 0.5, 5.0)), 0.0);
        let motor = gathered(&app, player, |_| Some(RigidBody::Fixed));

        assert!(motor.is_grounded());
        let normal = motor.contact_normal.normalize();
        assert!((normal - Vec3::Y).length() < 1e-3, "normal {normal}");
        assert_eq!(motor.connected, None);
    }

    #[test]
    fn standing_on_kinematic_body_connects_to_it() {
        let (app, player, floor) = standing_player(kinematic_physics_bundle(Vec3::new(5.0, 0.5, 5.0)), 0.0);
        let motor = gathered(&app, player, |e| (e == floor).then_some(RigidBody::KinematicPositionBased));

        assert!(motor.is_grounded());
        assert_eq!(motor.connected, Some(floor));
    }

    #[test]
    fn floor_out_of_reach_is_not_ground() {
        let (app, player, _) = standing_player(static_physics_bundle(Vec3::new(5.0, 0.5, 5.0)), -0.5);
        let motor = gathered(&app, player, |_| Some(RigidBody::Fixed));

        assert!(!motor.is_grounded());
        assert_eq!(motor.contact_normal, Vec3::ZERO);
    }
}
