//! Camera look relative to the gravity-aligned body, and cursor helpers.
//!
//! The player body carries a [`PlayerLook`]. Its `alignment` rotates the
//! body so that local +Y follows the current up axis; `angles` hold the
//! pitch/yaw of the camera pivot relative to that aligned frame.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::gravity::GravityField;
use crate::player::motor::MotorState;
use crate::player::{CameraPivot, Player};
use crate::settings::{CameraSettings, Settings};

/// Frames with a larger squared mouse delta are dropped.
const LOOK_SPIKE_SQ: f32 = 1000.0;
/// Per-axis dead zone for look input.
const LOOK_DEAD_ZONE: f32 = 0.001;
/// Scale from raw mouse counts to look input at `mouse_sensitivity` 1.
const MOUSE_DELTA_SCALE: f32 = 0.1;

/// Look orientation of a player.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PlayerLook {
    /// Pitch (x) and yaw (y) in degrees. Positive pitch looks down.
    pub angles: Vec2,
    /// Rotation taking world +Y to the body's up axis.
    pub alignment: Quat,
}

impl Default for PlayerLook {
    fn default() -> Self {
        Self { angles: Vec2::ZERO, alignment: Quat::IDENTITY }
    }
}

impl PlayerLook {
    /// Apply one frame of look input.
    ///
    /// # Arguments
    /// * `delta` - look input (x = yaw, y = pitch), already inverted as configured
    /// * `dt` - unscaled frame time
    pub fn apply_input(&mut self, delta: Vec2, dt: f32, settings: &CameraSettings) {
        if delta.x.abs() <= LOOK_DEAD_ZONE && delta.y.abs() <= LOOK_DEAD_ZONE {
            return;
        }
        let scaled = delta * settings.sensitivity * (settings.rotation_speed * dt);
        self.angles += Vec2::new(scaled.y, scaled.x);
        self.constrain(settings);
    }

    /// Clamp pitch and wrap yaw into `[0, 360)`.
    pub fn constrain(&mut self, settings: &CameraSettings) {
        let min = settings.min_vertical_angle.min(settings.max_vertical_angle);
        let max = settings.max_vertical_angle.max(settings.min_vertical_angle);
        self.angles.x = self.angles.x.clamp(min, max);
        self.angles.y = self.angles.y.rem_euclid(360.0);
    }

    /// Local rotation of the camera pivot.
    #[must_use]
    pub fn pivot_rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, -self.angles.y.to_radians(), -self.angles.x.to_radians(), 0.0)
    }

    /// Turn the alignment toward `to_up` by at most `max_angle` degrees.
    pub fn align_towards(&mut self, to_up: Vec3, max_angle: f32) {
        self.alignment = align_towards(self.alignment, to_up, max_angle);
    }
}

/// Rotate `alignment` so its up axis moves toward `to_up`, limited to
/// `max_angle` degrees.
#[must_use]
pub fn align_towards(alignment: Quat, to_up: Vec3, max_angle: f32) -> Quat {
    let from_up = alignment * Vec3::Y;
    let angle = from_up.dot(to_up).clamp(-1.0, 1.0).acos().to_degrees();
    let target = (Quat::from_rotation_arc(from_up, to_up) * alignment).normalize();
    if angle <= max_angle {
        target
    } else {
        alignment.slerp(target, max_angle / angle)
    }
}

/// Mouse delta for this frame after sensitivity and inversion.
#[must_use]
pub fn look_delta(motion: &Events<MouseMotion>, settings: &Settings) -> Vec2 {
    let controls = &settings.controls;
    let mut delta = Vec2::ZERO;
    for ev in motion.iter_current_update_events() {
        delta += ev.delta;
    }
    delta *= controls.mouse_sensitivity * MOUSE_DELTA_SCALE;
    if controls.invert_x {
        delta.x = -delta.x;
    }
    if controls.invert_y {
        delta.y = -delta.y;
    }
    delta
}

/// Late per-frame step: gravity alignment of the body, then mouse look on the
/// camera pivot.
///
/// Runs after the fixed step so the alignment sees the latest up axis, and
/// before transform propagation so the camera does not lag a frame. The
/// alignment follows game time; look input follows real time.
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
pub fn update_look(
    time: Res<Time>,
    real_time: Res<Time<Real>>,
    settings: Res<Settings>,
    motion: Res<Events<MouseMotion>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    field: GravityField,
    mut players: Query<(&Player, &mut PlayerLook, &MotorState, &mut Transform), Without<CameraPivot>>,
    mut pivots: Query<&mut Transform, With<CameraPivot>>,
) {
    let max_angle = settings.camera.up_alignment_speed * time.delta_seconds();
    let look_dt = real_time.delta_seconds();
    let cursor_free = windows.get_single().map_or(true, |w| w.cursor.visible);
    let delta = if cursor_free { Vec2::ZERO } else { look_delta(&motion, &settings) };
    let spike = delta.length_squared() > LOOK_SPIKE_SQ;
    if spike {
        debug!("dropping look spike {delta}");
    }

    for (player, mut look, motor, mut transform) in &mut players {
        let up = field.up_axis(transform.translation).unwrap_or(motor.up_axis);
        look.align_towards(up, max_angle);
        transform.rotation = look.alignment;

        if !spike {
            look.apply_input(delta, look_dt, &settings.camera);
        }
        if let Some(mut pivot) = player.pivot.and_then(|e| pivots.get_mut(e).ok()) {
            pivot.rotation = look.pivot_rotation();
        }
    }
}

/// Lock the cursor on click, release it on the pause key.
///
/// # Arguments
/// * `wq` - mutable window query to change cursor state
/// * `mb` - mouse buttons, left click grabs
/// * `kb` - keyboard, the `pause` bind releases
#[allow(clippy::needless_pass_by_value)]
pub fn cursor_grab(
    mut wq: Query<&mut Window, With<PrimaryWindow>>,
    mb: Res<ButtonInput<MouseButton>>,
    kb: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
) {
    let Ok(mut w) = wq.get_single_mut() else { return };
    if mb.just_pressed(MouseButton::Left) {
        w.cursor.grab_mode = CursorGrabMode::Locked;
        w.cursor.visible = false;
    }

    if kb.just_pressed(settings.controls.key("pause", KeyCode::Escape)) {
        w.cursor.grab_mode = CursorGrabMode::None;
        w.cursor.visible = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gravity::GravitySource;
    use bevy::ecs::system::RunSystemOnce;
    use bevy::window::Cursor;
    use std::time::Duration;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn alignment_snaps_within_max_angle() {
        let q = align_towards(Quat::IDENTITY, Vec3::X, 90.0);
        assert!(approx(q * Vec3::Y, Vec3::X));
    }

    #[test]
    fn alignment_is_rate_limited() {
        let q = align_towards(Quat::IDENTITY, Vec3::X, 45.0);
        let up = q * Vec3::Y;
        let angle = up.angle_between(Vec3::Y).to_degrees();
        assert!((angle - 45.0).abs() < 0.01);
        assert!(up.x > 0.0);
    }

    #[test]
    fn alignment_converges_over_steps() {
        let mut look = PlayerLook::default();
        let target = Vec3::new(0.0, 0.0, 1.0);
        for _ in 0..20 {
            look.align_towards(target, 10.0);
        }
        assert!(approx(look.alignment * Vec3::Y, target));
    }

    #[test]
    fn aligned_up_keeps_alignment() {
        let start = Quat::from_rotation_y(1.0);
        let q = align_towards(start, Vec3::Y, 1.0);
        assert!(q.abs_diff_eq(start, 1e-5));
    }

    #[test]
    fn look_scales_by_speed_and_sensitivity() {
        let settings = CameraSettings { rotation_speed: 100.0, sensitivity: Vec2::new(1.0, 0.5), ..default() };
        let mut look = PlayerLook::default();
        look.apply_input(Vec2::new(2.0, 4.0), 0.1, &settings);
        assert!((look.angles.y - 20.0).abs() < 1e-4);
        assert!((look.angles.x - 20.0).abs() < 1e-4);
    }

    #[test]
    fn dead_zone_ignores_tiny_input() {
        let settings = CameraSettings::default();
        let mut look = PlayerLook { angles: Vec2::new(5.0, 10.0), ..default() };
        look.apply_input(Vec2::new(0.0005, -0.001), 1.0, &settings);
        assert_eq!(look.angles, Vec2::new(5.0, 10.0));
    }

    #[test]
    fn pitch_is_clamped_and_yaw_wraps() {
        let settings = CameraSettings { min_vertical_angle: -30.0, max_vertical_angle: 60.0, ..default() };
        let mut look = PlayerLook { angles: Vec2::new(80.0, -30.0), ..default() };
        look.constrain(&settings);
        assert_eq!(look.angles, Vec2::new(60.0, 330.0));

        look.angles = Vec2::new(-90.0, 725.0);
        look.constrain(&settings);
        assert_eq!(look.angles, Vec2::new(-30.0, 5.0));
    }

    #[test]
    fn inverted_vertical_limits_do_not_panic() {
        let settings = CameraSettings { min_vertical_angle: 40.0, max_vertical_angle: -40.0, ..default() };
        let mut look = PlayerLook { angles: Vec2::new(70.0, 0.0), ..default() };
        look.constrain(&settings);
        assert_eq!(look.angles.x, 40.0);
    }

    #[test]
    fn positive_pitch_looks_down_positive_yaw_turns_right() {
        let look = PlayerLook { angles: Vec2::new(30.0, 0.0), ..default() };
        assert!((look.pivot_rotation() * Vec3::NEG_Z).y < 0.0);

        let look = PlayerLook { angles: Vec2::new(0.0, 90.0), ..default() };
        assert!(approx(look.pivot_rotation() * Vec3::NEG_Z, Vec3::X));
    }

    #[test]
    fn mouse_delta_respects_inversion() {
        let mut settings = Settings::default();
        settings.controls.mouse_sensitivity = 10.0;
        settings.controls.invert_y = true;
        let mut events = Events::<MouseMotion>::default();
        events.send(MouseMotion { delta: Vec2::new(1.0, 2.0) });
        events.send(MouseMotion { delta: Vec2::new(1.0, 0.0) });
        assert_eq!(look_delta(&events, &settings), Vec2::new(2.0, -2.0));
    }

    struct LookWorld {
        world: World,
        player: Entity,
        pivot: Entity,
    }

    /// Player under sideways gravity with a locked or free cursor.
    /// `game_dt` drives the alignment, `real_dt` the look input.
    fn look_world(cursor_visible: bool, game_dt: f32, real_dt: f32) -> LookWorld {
        let mut world = World::new();
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_secs_f32(game_dt));
        world.insert_resource(time);
        let mut real = Time::<Real>::default();
        real.advance_by(Duration::from_secs_f32(real_dt));
        world.insert_resource(real);
        world.insert_resource(Settings::default());
        world.insert_resource(Events::<MouseMotion>::default());
        world.spawn((
            Window { cursor: Cursor { visible: cursor_visible, ..default() }, ..default() },
            PrimaryWindow,
        ));
        world.spawn((GravitySource::global(Vec3::new(-9.81, 0.0, 0.0)), GlobalTransform::IDENTITY));
        let pivot = world.spawn((CameraPivot, Transform::default())).id();
        let player = world
            .spawn((
                Player { pivot: Some(pivot) },
                PlayerLook::default(),
                MotorState::default(),
                Transform::default(),
            ))
            .id();
        LookWorld { world, player, pivot }
    }

    fn move_mouse(world: &mut World, delta: Vec2) {
        world.resource_mut::<Events<MouseMotion>>().send(MouseMotion { delta });
    }

    #[test]
    fn locked_cursor_turns_the_pivot() {
        let LookWorld { mut world, player, pivot } = look_world(false, 0.1, 0.1);
        // 10 counts * 0.1 scale * 90 deg/s * 0.1 s
        move_mouse(&mut world, Vec2::new(10.0, 0.0));

        world.run_system_once(update_look);

        let look = *world.get::<PlayerLook>(player).unwrap();
        assert!((look.angles.y - 9.0).abs() < 1e-3, "angles {}", look.angles);
        assert_eq!(world.get::<Transform>(pivot).unwrap().rotation, look.pivot_rotation());
    }

    #[test]
    fn free_cursor_ignores_mouse_but_still_aligns() {
        let LookWorld { mut world, player, .. } = look_world(true, 0.1, 0.1);
        move_mouse(&mut world, Vec2::new(10.0, 10.0));

        world.run_system_once(update_look);

        let look = *world.get::<PlayerLook>(player).unwrap();
        assert_eq!(look.angles, Vec2::ZERO);
        // 360 deg/s * 0.1 s toward +X
        let up = look.alignment * Vec3::Y;
        assert!((up.angle_between(Vec3::Y).to_degrees() - 36.0).abs() < 0.01);
        assert_eq!(world.get::<Transform>(player).unwrap().rotation, look.alignment);
    }

    #[test]
    fn mouse_spike_is_dropped_without_skipping_alignment() {
        let LookWorld { mut world, player, .. } = look_world(false, 0.1, 0.1);
        // scaled to 40: squared length 1600 is a spike
        move_mouse(&mut world, Vec2::new(400.0, 0.0));

        world.run_system_once(update_look);

        let look = *world.get::<PlayerLook>(player).unwrap();
        assert_eq!(look.angles, Vec2::ZERO);
        assert!(look.alignment != Quat::IDENTITY);
    }

    #[test]
    fn paused_game_time_freezes_alignment_not_look() {
        let LookWorld { mut world, player, .. } = look_world(false, 0.0, 0.1);
        move_mouse(&mut world, Vec2::new(10.0, 0.0));

        world.run_system_once(update_look);

        let look = *world.get::<PlayerLook>(player).unwrap();
        assert!(look.alignment.abs_diff_eq(Quat::IDENTITY, 1e-6));
        assert!((look.angles.y - 9.0).abs() < 1e-3);
    }
}
