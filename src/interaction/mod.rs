//! World objects that move, rotate or scale when hit by a projectile.
//!
//! Each object steps along one axis by a fixed increment. A positive hit
//! moves it one step in the positive direction, a negative hit one step
//! back, bounded by how many steps are allowed each way from the start.

pub mod platform;

use bevy::prelude::*;

pub use platform::*;

use crate::settings::Settings;
use crate::weapon::ProjectileMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionKind {
    #[default]
    Move,
    Rotate,
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    #[must_use]
    pub fn unit(self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A transform change produced by one interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjustment {
    pub kind: InteractionKind,
    pub axis: Axis,
    /// Signed amount: units for move/scale, degrees for rotate.
    pub amount: f32,
}

impl Adjustment {
    pub fn apply(&self, transform: &mut Transform) {
        let delta = self.axis.unit() * self.amount;
        match self.kind {
            InteractionKind::Move => transform.translation += delta,
            InteractionKind::Rotate => {
                transform.rotation *= Quat::from_axis_angle(self.axis.unit(), self.amount.to_radians());
            }
            InteractionKind::Scale => transform.scale += delta,
        }
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct InteractionObject {
    pub kind: InteractionKind,
    pub axis: Axis,
    pub increment: f32,
    /// Steps allowed in the positive direction (0..=20).
    pub max_positive: u32,
    /// Steps allowed in the negative direction (0..=20).
    pub max_negative: u32,
    pub positive_index: u32,
    pub negative_index: u32,
    /// Entity whose transform is changed; the object itself when `None`.
    pub pivot: Option<Entity>,
}

impl Default for InteractionObject {
    fn default() -> Self {
        Self {
            kind: InteractionKind::Move,
            axis: Axis::X,
            increment: 1.0,
            max_positive: 1,
            max_negative: 1,
            positive_index: 0,
            negative_index: 0,
            pivot: None,
        }
    }
}

impl InteractionObject {
    #[must_use]
    pub fn new(kind: InteractionKind, axis: Axis, increment: f32, max_positive: u32, max_negative: u32) -> Self {
        Self {
            kind,
            axis,
            increment,
            max_positive: max_positive.min(20),
            max_negative: max_negative.min(20),
            ..default()
        }
    }

    #[must_use]
    pub fn with_pivot(mut self, pivot: Entity) -> Self {
        self.pivot = Some(pivot);
        self
    }

    #[must_use]
    pub fn limit_reached(&self, mode: ProjectileMode) -> bool {
        match mode {
            ProjectileMode::Positive => self.positive_index == self.max_positive,
            ProjectileMode::Negative => self.negative_index == self.max_negative,
        }
    }

    /// Step once in the direction of `mode`. Returns the change to apply to
    /// the pivot, or `None` when the limit for that direction is reached.
    pub fn interact(&mut self, mode: ProjectileMode) -> Option<Adjustment> {
        if self.limit_reached(mode) {
            return None;
        }
        let adjustment = Adjustment { kind: self.kind, axis: self.axis, amount: self.increment * mode.sign() };

        // walk back toward the start before stepping further out
        match mode {
            ProjectileMode::Positive if self.negative_index > 0 => self.negative_index -= 1,
            ProjectileMode::Positive => self.positive_index += 1,
            ProjectileMode::Negative if self.positive_index > 0 => self.positive_index -= 1,
            ProjectileMode::Negative => self.negative_index += 1,
        }
        Some(adjustment)
    }
}

/// A spent projectile hit `target`.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionHit {
    pub target: Entity,
    pub mode: ProjectileMode,
}

#[allow(clippy::needless_pass_by_value)]
pub fn respond_to_hits(
    mut hits: EventReader<InteractionHit>,
    mut objects: Query<&mut InteractionObject>,
    mut transforms: Query<&mut Transform>,
) {
    for hit in hits.read() {
        let Ok(mut object) = objects.get_mut(hit.target) else {
            continue;
        };
        let Some(adjustment) = object.interact(hit.mode) else {
            debug!("{:?} is at its {:?} limit", hit.target, hit.mode);
            continue;
        };
        let pivot = object.pivot.unwrap_or(hit.target);
        match transforms.get_mut(pivot) {
            Ok(mut transform) => adjustment.apply(&mut transform),
            Err(_) => warn!("interaction pivot {pivot:?} has no transform"),
        }
    }
}

/// Color new interaction objects by their axis. The material is cloned so
/// objects sharing a handle do not recolor each other.
#[allow(clippy::needless_pass_by_value)]
pub fn tint_interaction_objects(
    settings: Res<Settings>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut objects: Query<(&InteractionObject, &mut Handle<StandardMaterial>), Added<InteractionObject>>,
) {
    for (object, mut handle) in &mut objects {
        let Some(material) = materials.get(handle.id()) else {
            continue;
        };
        let tint = settings.interaction.axis_colors[object.axis.index()];
        let mut material = material.clone();
        material.base_color = Color::linear_rgb(tint.x, tint.y, tint.z);
        *handle = materials.add(material);
    }
}

/// Registers hit handling, tinting and platform systems.
pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<InteractionHit>()
            .add_systems(Startup, setup_platform_materials)
            .add_systems(
                Update,
                (respond_to_hits, tint_interaction_objects, init_platforms, mark_visited_platforms),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mover(max_positive: u32, max_negative: u32) -> InteractionObject {
        InteractionObject::new(InteractionKind::Move, Axis::Y, 2.0, max_positive, max_negative)
    }

    #[test]
    fn positive_hits_stop_at_limit() {
        let mut object = mover(2, 0);
        assert!(object.interact(ProjectileMode::Positive).is_some());
        assert!(object.interact(ProjectileMode::Positive).is_some());
        assert!(object.interact(ProjectileMode::Positive).is_none());
        assert_eq!(object.positive_index, 2);
        assert!(object.limit_reached(ProjectileMode::Negative));
    }

    #[test]
    fn negative_hit_walks_back_first() {
        let mut object = mover(2, 1);
        object.interact(ProjectileMode::Positive);
        object.interact(ProjectileMode::Positive);

        let adj = object.interact(ProjectileMode::Negative).unwrap();
        assert_eq!(adj.amount, -2.0);
        assert_eq!((object.positive_index, object.negative_index), (1, 0));

        object.interact(ProjectileMode::Negative);
        object.interact(ProjectileMode::Negative);
        assert_eq!((object.positive_index, object.negative_index), (0, 1));
        assert!(object.interact(ProjectileMode::Negative).is_none());

        object.interact(ProjectileMode::Positive);
        assert_eq!((object.positive_index, object.negative_index), (0, 0));
    }

    #[test]
    fn zero_limits_block_everything() {
        let mut object = mover(0, 0);
        assert!(object.interact(ProjectileMode::Positive).is_none());
        assert!(object.interact(ProjectileMode::Negative).is_none());
    }

    #[test]
    fn limits_are_capped() {
        let object = mover(50, 21);
        assert_eq!((object.max_positive, object.max_negative), (20, 20));
    }

    #[test]
    fn adjustments_change_the_right_property() {
        let mut t = Transform::default();
        Adjustment { kind: InteractionKind::Move, axis: Axis::Z, amount: -1.5 }.apply(&mut t);
        assert_eq!(t.translation, Vec3::new(0.0, 0.0, -1.5));

        Adjustment { kind: InteractionKind::Scale, axis: Axis::X, amount: 0.5 }.apply(&mut t);
        assert_eq!(t.scale, Vec3::new(1.5, 1.0, 1.0));

        Adjustment { kind: InteractionKind::Rotate, axis: Axis::Y, amount: 90.0 }.apply(&mut t);
        assert!((t.rotation * Vec3::X - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn rotation_is_in_local_space() {
        let mut t = Transform::from_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        Adjustment { kind: InteractionKind::Rotate, axis: Axis::X, amount: 90.0 }.apply(&mut t);
        let quarter = std::f32::consts::FRAC_PI_2;
        let expected = Quat::from_rotation_z(quarter) * Quat::from_rotation_x(quarter);
        assert!(t.rotation.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn hits_move_the_pivot() {
        let mut app = App::new();
        app.add_event::<InteractionHit>();
        app.add_systems(Update, respond_to_hits);

        let pivot = app.world_mut().spawn(Transform::default()).id();
        let object = app
            .world_mut()
            .spawn((mover(1, 1).with_pivot(pivot), Transform::from_xyz(5.0, 5.0, 5.0)))
            .id();

        app.world_mut().send_event(InteractionHit { target: object, mode: ProjectileMode::Positive });
        app.world_mut().send_event(InteractionHit { target: object, mode: ProjectileMode::Positive });
        app.update();

        assert_eq!(app.world().get::<Transform>(pivot).unwrap().translation, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(app.world().get::<Transform>(object).unwrap().translation, Vec3::splat(5.0));
    }

    #[test]
    fn hits_on_plain_entities_are_ignored() {
        let mut app = App::new();
        app.add_event::<InteractionHit>();
        app.add_systems(Update, respond_to_hits);
        let wall = app.world_mut().spawn(Transform::default()).id();

        app.world_mut().send_event(InteractionHit { target: wall, mode: ProjectileMode::Negative });
        app.update();
        assert_eq!(*app.world().get::<Transform>(wall).unwrap(), Transform::default());
    }

    #[test]
    fn new_objects_get_their_axis_color() {
        let mut app = App::new();
        app.insert_resource(Settings::default());
        app.init_resource::<Assets<StandardMaterial>>();
        app.add_systems(Update, tint_interaction_objects);

        let shared = app.world_mut().resource_mut::<Assets<StandardMaterial>>().add(StandardMaterial::default());
        let object = app
            .world_mut()
            .spawn((InteractionObject { axis: Axis::Z, ..default() }, shared.clone()))
            .id();
        app.update();

        let handle = app.world().get::<Handle<StandardMaterial>>(object).unwrap().clone();
        assert_ne!(handle, shared);
        let materials = app.world().resource::<Assets<StandardMaterial>>();
        let tint = Settings::default().interaction.axis_colors[2];
        assert_eq!(materials.get(&handle).unwrap().base_color, Color::linear_rgb(tint.x, tint.y, tint.z));
        assert_eq!(materials.get(&shared).unwrap().base_color, StandardMaterial::default().base_color);
    }
}
