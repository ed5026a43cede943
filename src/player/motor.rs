//! Fixed-step character motor relative to an arbitrary up axis.
//!
//! Each physics step the motor reads the body velocity, the gravity at the
//! body and the contacts gathered since the previous step, then:
//!
//! 1. refreshes grounding, the contact normal and moving-platform tracking,
//! 2. steers the planar velocity toward the input (clamped acceleration),
//! 3. performs a requested jump along the contact normal blended with up,
//! 4. integrates gravity, sticking to the ground when nearly at rest,
//!
//! and writes the result back for the rigidbody integrator to apply.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{RapierContext, RigidBody, Velocity};

use crate::gravity::GravityField;
use crate::player::contacts::gather_contacts;
use crate::player::Player;
use crate::settings::{MovementSettings, Settings};

/// Speed (squared) under which a grounded body only receives the normal
/// component of gravity.
const GROUND_STICK_SPEED_SQ: f32 = 0.01;

/// Project `direction` onto the plane with `normal` and normalize it.
/// Yields zero when `direction` is parallel to `normal`.
#[must_use]
pub fn project_direction_on_plane(direction: Vec3, normal: Vec3) -> Vec3 {
    (direction - normal * direction.dot(normal)).normalize_or_zero()
}

/// Per-step inputs the motor cannot compute itself.
#[derive(Debug, Clone, Copy)]
pub struct StepContext {
    pub gravity: Vec3,
    pub up: Vec3,
    pub body_velocity: Vec3,
    pub body_position: Vec3,
    /// Transform of the body the character stands on, if any.
    pub connected_transform: Option<GlobalTransform>,
    pub dt: f32,
}

/// Motor state carried between steps.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct MotorState {
    pub velocity: Vec3,
    pub contact_normal: Vec3,
    pub ground_contact_count: u32,
    pub steps_since_last_jump: u32,
    pub jump_phase: u32,
    pub up_axis: Vec3,
    pub right_axis: Vec3,
    pub forward_axis: Vec3,
    /// Planar input in the (x, z) components, at most unit length.
    pub input: Vec3,
    pub jump_requested: bool,
    pub connected: Option<Entity>,
    pub previous_connected: Option<Entity>,
    pub connection_velocity: Vec3,
    pub(crate) connection_world_position: Vec3,
    pub(crate) connection_local_position: Vec3,
}

impl Default for MotorState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            contact_normal: Vec3::ZERO,
            ground_contact_count: 0,
            steps_since_last_jump: 0,
            jump_phase: 0,
            up_axis: Vec3::Y,
            right_axis: Vec3::X,
            forward_axis: Vec3::NEG_Z,
            input: Vec3::ZERO,
            jump_requested: false,
            connected: None,
            previous_connected: None,
            connection_velocity: Vec3::ZERO,
            connection_world_position: Vec3::ZERO,
            connection_local_position: Vec3::ZERO,
        }
    }
}

impl MotorState {
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.ground_contact_count > 0
    }

    /// Store move input; `axis.y` is forward.
    pub fn set_input(&mut self, axis: Vec2) {
        self.input = Vec3::new(axis.x, 0.0, axis.y).clamp_length_max(1.0);
    }

    /// Derive the planar movement axes from the camera pivot orientation.
    pub fn set_view_axes(&mut self, right: Vec3, forward: Vec3) {
        self.right_axis = project_direction_on_plane(right, self.up_axis);
        self.forward_axis = project_direction_on_plane(forward, self.up_axis);
    }

    /// Latch a jump until the next physics step consumes it.
    pub fn request_jump(&mut self) {
        self.jump_requested = true;
    }

    /// Record one contact point. The last contact decides the connected body.
    pub fn add_contact(&mut self, normal: Vec3, body: Option<Entity>) {
        self.ground_contact_count += 1;
        self.contact_normal += normal;
        self.connected = body;
    }

    /// Run one full step and return the velocity to hand to the integrator.
    pub fn step(&mut self, ctx: &StepContext, settings: &MovementSettings) -> Vec3 {
        self.up_axis = ctx.up;
        self.update_state(ctx);
        self.adjust_velocity(settings, ctx.dt);
        if std::mem::take(&mut self.jump_requested) {
            self.jump(ctx.gravity, settings);
        }
        self.apply_gravity(ctx.gravity, ctx.dt);
        let velocity = self.velocity;
        self.clear_state();
        velocity
    }

    fn update_state(&mut self, ctx: &StepContext) {
        self.steps_since_last_jump = self.steps_since_last_jump.saturating_add(1);
        self.velocity = ctx.body_velocity;

        if self.is_grounded() {
            if self.steps_since_last_jump > 1 {
                self.jump_phase = 0;
            }
            if self.ground_contact_count > 1 {
                self.contact_normal = self.contact_normal.normalize_or_zero();
            }
        } else {
            self.contact_normal = self.up_axis;
        }

        if let Some(connected) = ctx.connected_transform.filter(|_| self.connected.is_some()) {
            self.update_connection(ctx.body_position, &connected, ctx.dt);
        }
    }

    fn update_connection(&mut self, body_position: Vec3, connected: &GlobalTransform, dt: f32) {
        if self.connected == self.previous_connected && dt > 0.0 {
            let movement =
                connected.transform_point(self.connection_local_position) - self.connection_world_position;
            self.connection_velocity = movement / dt;
        }
        self.connection_world_position = body_position;
        self.connection_local_position = connected.affine().inverse().transform_point3(body_position);
    }

    fn adjust_velocity(&mut self, settings: &MovementSettings, dt: f32) {
        let acceleration = if self.is_grounded() {
            settings.max_acceleration
        } else {
            settings.max_air_acceleration
        };

        let x_axis = project_direction_on_plane(self.right_axis, self.contact_normal);
        let z_axis = project_direction_on_plane(self.forward_axis, self.contact_normal);

        let relative = self.velocity - self.connection_velocity;
        let adjustment = Vec2::new(
            self.input.x * settings.max_speed - relative.dot(x_axis),
            self.input.z * settings.max_speed - relative.dot(z_axis),
        )
        .clamp_length_max(acceleration * dt);

        self.velocity += x_axis * adjustment.x + z_axis * adjustment.y;
    }

    /// Returns `true` when the jump was performed. The jump counters are
    /// spent even when the jump is refused.
    fn jump(&mut self, gravity: Vec3, settings: &MovementSettings) -> bool {
        self.steps_since_last_jump = 0;
        self.jump_phase += 1;

        let direction = if self.is_grounded() {
            self.contact_normal
        } else if settings.max_air_jumps > 0 && self.jump_phase <= settings.max_air_jumps {
            self.contact_normal
        } else {
            return false;
        };

        let direction = (direction + self.up_axis).normalize_or_zero();
        let mut jump_speed = (2.0 * gravity.length() * settings.jump_height).sqrt();
        let aligned_speed = self.velocity.dot(direction);
        if aligned_speed > 0.0 {
            jump_speed = (jump_speed - aligned_speed).max(0.0);
        }
        self.velocity += direction * jump_speed;
        true
    }

    fn apply_gravity(&mut self, gravity: Vec3, dt: f32) {
        if self.is_grounded() && self.velocity.length_squared() < GROUND_STICK_SPEED_SQ {
            self.velocity += self.contact_normal * (gravity.dot(self.contact_normal) * dt);
        } else {
            self.velocity += gravity * dt;
        }
    }

    fn clear_state(&mut self) {
        self.ground_contact_count = 0;
        self.contact_normal = Vec3::ZERO;
        self.connection_velocity = Vec3::ZERO;
        self.previous_connected = self.connected.take();
    }
}

/// Fixed-step system driving every player's [`MotorState`].
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
pub fn motor_step(
    time: Res<Time>,
    settings: Res<Settings>,
    field: GravityField,
    context: Res<RapierContext>,
    rigid_bodies: Query<(&RigidBody, &GlobalTransform), Without<Player>>,
    mut players: Query<(Entity, &mut MotorState, &mut Velocity, &GlobalTransform), With<Player>>,
) {
    let dt = time.delta_seconds();

    for (entity, mut motor, mut velocity, transform) in &mut players {
        let position = transform.translation();
        let (gravity, up) = field.gravity_and_up(position, motor.up_axis);

        gather_contacts(&context, entity, |other| rigid_bodies.get(other).ok().map(|(rb, _)| *rb), &mut motor);
        let connected_transform = motor
            .connected
            .and_then(|e| rigid_bodies.get(e).ok())
            .map(|(_, t)| *t);

        let ctx = StepContext {
            gravity,
            up,
            body_velocity: velocity.linvel,
            body_position: position,
            connected_transform,
            dt,
        };
        velocity.linvel = motor.step(&ctx, &settings.movement);
    }
}
