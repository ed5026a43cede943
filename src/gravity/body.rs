//! Rigidbodies driven by the gravity field instead of the engine gravity,
//! with optional float-to-sleep and buoyancy in water volumes.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::gravity::{up_axis, GravityField};
use crate::settings::Settings;

/// Speed (squared) under which a body counts as resting.
const REST_SPEED_SQ: f32 = 0.0001;

/// Marker for water sensors that produce buoyancy.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Water;

/// Per-body gravity and buoyancy parameters plus runtime state.
///
/// Spawn together with `GravityScale(0.0)` so the engine does not apply
/// its own gravity on top.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct GravityBody {
    pub float_to_sleep: bool,
    pub submergence_offset: f32,
    pub submergence_range: f32,
    pub buoyancy: f32,
    pub water_drag: f32,
    pub buoyancy_offset: Vec3,
    float_delay: f32,
    submergence: f32,
    gravity: Vec3,
    water_contacts: u32,
    entered_water: bool,
}

impl Default for GravityBody {
    fn default() -> Self {
        Self {
            float_to_sleep: false,
            submergence_offset: 0.5,
            submergence_range: 1.0,
            buoyancy: 1.0,
            water_drag: 1.0,
            buoyancy_offset: Vec3::ZERO,
            float_delay: 0.0,
            submergence: 0.0,
            gravity: Vec3::ZERO,
            water_contacts: 0,
            entered_water: false,
        }
    }
}

impl GravityBody {
    #[must_use]
    pub fn floating() -> Self {
        Self { float_to_sleep: true, ..default() }
    }

    /// Last sampled gravity.
    #[must_use]
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    #[must_use]
    pub fn submergence(&self) -> f32 {
        self.submergence
    }

    #[must_use]
    pub fn in_water(&self) -> bool {
        self.water_contacts > 0
    }

    /// Float-to-sleep bookkeeping. Returns `true` when gravity should be
    /// skipped this step so the body can come to rest.
    pub fn should_rest(&mut self, sleeping: bool, speed_sq: f32, dt: f32, delay: f32) -> bool {
        if !self.float_to_sleep {
            return false;
        }
        if sleeping {
            self.float_delay = 0.0;
            return true;
        }
        if speed_sq < REST_SPEED_SQ {
            self.float_delay += dt;
            if self.float_delay >= delay {
                return true;
            }
        } else {
            self.float_delay = 0.0;
        }
        false
    }

    /// Submergence for a downward probe that hit the water surface at
    /// `hit_distance`, or `None` when the probe started under water.
    #[must_use]
    pub fn submergence_from_probe(&self, hit_distance: Option<f32>) -> f32 {
        match hit_distance {
            Some(distance) => 1.0 - distance / self.submergence_range.max(0.1),
            None => 1.0,
        }
    }

    /// Velocity scale applied while submerged.
    #[must_use]
    pub fn drag_factor(&self, dt: f32) -> f32 {
        (1.0 - self.water_drag * self.submergence * dt).max(0.0)
    }

    /// Upward acceleration applied at the buoyancy offset while submerged.
    #[must_use]
    pub fn buoyancy_acceleration(&self) -> Vec3 {
        self.gravity * -(self.buoyancy * self.submergence_range)
    }
}

/// Count water sensor overlaps per body.
#[allow(clippy::needless_pass_by_value)]
pub fn track_water_contacts(
    mut events: EventReader<CollisionEvent>,
    water: Query<(), With<Water>>,
    mut bodies: Query<&mut GravityBody>,
) {
    for event in events.read() {
        let (a, b, entered) = match *event {
            CollisionEvent::Started(a, b, _) => (a, b, true),
            CollisionEvent::Stopped(a, b, _) => (a, b, false),
        };
        for (body_entity, other) in [(a, b), (b, a)] {
            if !water.contains(other) {
                continue;
            }
            let Ok(mut body) = bodies.get_mut(body_entity) else {
                continue;
            };
            if entered {
                body.water_contacts += 1;
                body.entered_water = true;
            } else {
                body.water_contacts = body.water_contacts.saturating_sub(1);
            }
        }
    }
}

/// Apply field gravity, water drag and buoyancy to every [`GravityBody`].
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
pub fn apply_body_gravity(
    time: Res<Time>,
    settings: Res<Settings>,
    field: GravityField,
    context: Res<RapierContext>,
    water: Query<(), With<Water>>,
    mut bodies: Query<(
        Entity,
        &mut GravityBody,
        &GlobalTransform,
        &mut Velocity,
        Option<&Sleeping>,
        Option<&ReadMassProperties>,
        Option<&mut ExternalImpulse>,
    )>,
) {
    let dt = time.delta_seconds();

    for (entity, mut body, transform, mut velocity, sleeping, mass, impulse) in &mut bodies {
        let asleep = sleeping.is_some_and(|s| s.sleeping);
        let position = transform.translation();

        if body.in_water() && (body.entered_water || !asleep) {
            body.entered_water = false;
            let up = up_axis(body.gravity).unwrap_or(Vec3::Y);
            let origin = position + up * body.submergence_offset;
            let is_water = |e: Entity| water.contains(e);
            let filter = QueryFilter::new().exclude_collider(entity).predicate(&is_water);
            // solid: a probe starting inside the water reports distance 0
            let hit = context
                .cast_ray(origin, -up, body.submergence_range + 1.0, true, filter)
                .map(|(_, toi)| toi);
            body.submergence = body.submergence_from_probe(hit);
        }

        if body.should_rest(asleep, velocity.linvel.length_squared(), dt, settings.gravity.float_delay) {
            continue;
        }

        body.gravity = field.gravity(position);

        if body.submergence > 0.0 {
            let drag = body.drag_factor(dt);
            velocity.linvel *= drag;
            velocity.angvel *= drag;

            if let (Some(mass), Some(mut impulse)) = (mass, impulse) {
                let props = mass.get();
                let point = transform.transform_point(body.buoyancy_offset);
                let center = transform.transform_point(props.local_center_of_mass);
                let push = ExternalImpulse::at_point(body.buoyancy_acceleration() * props.mass * dt, point, center);
                impulse.impulse += push.impulse;
                impulse.torque_impulse += push.torque_impulse;
            } else {
                velocity.linvel += body.buoyancy_acceleration() * dt;
            }
            body.submergence = 0.0;
        }

        velocity.linvel += body.gravity * dt;
    }
}
