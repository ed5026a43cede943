//! Keyboard move input, smoothed into a movement axis.

use bevy::prelude::*;

use crate::player::motor::MotorState;
use crate::player::{CameraPivot, Player};
use crate::settings::Settings;

/// Components closer than this to zero snap to zero.
const SNAP_ZERO: f32 = 0.001;
/// Components closer than this to one snap to one.
const SNAP_ONE: f32 = 0.999;

/// Critically damped smoothing of a raw 2D input axis.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct InputAxisConverter {
    pub smooth_time: f32,
    velocity: Vec2,
    output: Vec2,
}

impl Default for InputAxisConverter {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl InputAxisConverter {
    #[must_use]
    pub fn new(smooth_time: f32) -> Self {
        Self { smooth_time, velocity: Vec2::ZERO, output: Vec2::ZERO }
    }

    #[must_use]
    pub fn output(&self) -> Vec2 {
        self.output
    }

    /// Move the output toward `input` and return it.
    pub fn input_to_axis(&mut self, input: Vec2, dt: f32) -> Vec2 {
        self.output = smooth_damp(self.output, input, &mut self.velocity, self.smooth_time, dt);
        self.output = Vec2::new(snap(self.output.x), snap(self.output.y));
        self.output
    }
}

fn snap(value: f32) -> f32 {
    let magnitude = value.abs();
    if magnitude < SNAP_ZERO {
        0.0
    } else if magnitude > SNAP_ONE {
        value.signum()
    } else {
        value
    }
}

/// Spring-damper approach of `current` toward `target` that never overshoots.
///
/// # Arguments
/// * `velocity` - carried between calls
/// * `smooth_time` - approximate time to reach the target
#[must_use]
pub fn smooth_damp(current: Vec2, target: Vec2, velocity: &mut Vec2, smooth_time: f32, dt: f32) -> Vec2 {
    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * exp;
    let mut output = target + (change + temp) * exp;

    if (target - current).dot(output - target) > 0.0 {
        output = target;
        *velocity = Vec2::ZERO;
    }
    output
}

/// Build the raw axis from the movement keys: `x` right, `y` forward.
#[must_use]
pub fn raw_move_axis(keys: &ButtonInput<KeyCode>, settings: &Settings) -> Vec2 {
    let controls = &settings.controls;
    let mut axis = Vec2::ZERO;
    if keys.pressed(controls.key("forward", KeyCode::KeyW)) {
        axis.y += 1.0;
    }
    if keys.pressed(controls.key("back", KeyCode::KeyS)) {
        axis.y -= 1.0;
    }
    if keys.pressed(controls.key("right", KeyCode::KeyD)) {
        axis.x += 1.0;
    }
    if keys.pressed(controls.key("left", KeyCode::KeyA)) {
        axis.x -= 1.0;
    }
    axis
}

/// Feed smoothed keyboard input, jump requests and the camera's planar axes
/// into each player's motor.
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
pub fn read_move_input(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    settings: Res<Settings>,
    pivots: Query<&GlobalTransform, With<CameraPivot>>,
    mut players: Query<(&Player, &mut MotorState, &mut InputAxisConverter)>,
) {
    let raw = raw_move_axis(&keys, &settings);
    let jump = keys.just_pressed(settings.controls.key("jump", KeyCode::Space));

    for (player, mut motor, mut converter) in &mut players {
        converter.smooth_time = settings.movement.input_smooth_time;
        let axis = converter.input_to_axis(raw, time.delta_seconds());
        motor.set_input(axis);

        if jump {
            motor.request_jump();
        }

        if let Some(pivot) = player.pivot.and_then(|e| pivots.get(e).ok()) {
            motor.set_view_axes(*pivot.right(), *pivot.forward());
        }
    }
}
