//! User interface: weapon HUD, debug overlay and crosshair.
//!
//! The HUD shows the gun's projectile and fire mode. The overlay, toggled
//! with the `toggle_debug` bind (F1), periodically displays FPS, player
//! position, local gravity and motor state.

use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::gravity::GravityField;
use crate::player::{MotorState, Player};
use crate::settings::Settings;
use crate::weapon::{FireMode, Gun, ProjectileMode};

/// State for the debug overlay visibility.
#[derive(Resource, Default)]
pub struct DebugOverlayState {
    /// Whether the overlay is currently visible.
    pub visible: bool,
}

#[derive(Resource, Default)]
pub struct DebugOverlayTimer(pub Timer);

#[derive(Component)]
pub struct DebugOverlayText;

#[derive(Component)]
pub struct HudText;

/// Insert debug overlay resources.
pub fn setup_debug_overlay(mut commands: Commands) {
    commands.insert_resource(DebugOverlayTimer(Timer::from_seconds(0.5, TimerMode::Repeating)));
    commands.insert_resource(DebugOverlayState::default());
}

/// Toggle the debug overlay visibility.
///
/// # Arguments
/// * `state` - mutable `DebugOverlayState` resource
/// * `input` - keyboard input resource
#[allow(clippy::needless_pass_by_value)]
pub fn toggle_debug_overlay(
    mut state: ResMut<DebugOverlayState>,
    input: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
) {
    if input.just_pressed(settings.controls.key("toggle_debug", KeyCode::F1)) {
        state.visible = !state.visible;
    }
}

/// HUD line for the current gun state.
#[must_use]
pub fn hud_line(mode: ProjectileMode, fire_mode: FireMode) -> String {
    let polarity = match mode {
        ProjectileMode::Positive => "+ Positive",
        ProjectileMode::Negative => "- Negative",
    };
    let fire = match fire_mode {
        FireMode::Direct => "Direct",
        FireMode::Bounce => "Bounce",
    };
    format!("{polarity} | {fire}")
}

/// Refresh the HUD when the gun changes.
#[allow(clippy::needless_pass_by_value)]
pub fn update_hud(guns: Query<&Gun, Changed<Gun>>, mut text: Query<&mut Text, With<HudText>>) {
    let (Ok(gun), Ok(mut text)) = (guns.get_single(), text.get_single_mut()) else {
        return;
    };
    let line = hud_line(gun.mode, gun.fire_mode);
    if text.sections[0].value != line {
        text.sections[0].value = line;
    }
}

/// Grouped parameters of [`update_debug_overlay`].
#[derive(SystemParam)]
pub struct DebugOverlayCtx<'w, 's> {
    pub diagnostics: Res<'w, DiagnosticsStore>,
    pub state: Res<'w, DebugOverlayState>,
    pub time: Res<'w, Time>,
    pub timer: ResMut<'w, DebugOverlayTimer>,
    pub field: GravityField<'w, 's>,
    pub query: Query<'w, 's, &'static mut Text, With<DebugOverlayText>>,
    pub player_query: Query<'w, 's, (&'static GlobalTransform, &'static MotorState), With<Player>>,
}

/// Overlay body for one player snapshot.
#[must_use]
pub fn overlay_text(
    fps: f64,
    frame_time: f64,
    position: Vec3,
    gravity: Vec3,
    motor: &MotorState,
    sources: usize,
) -> String {
    format!(
        concat!(
            "FPS: {:.1}\nFrame Time: {:.2} ms\nPos: ({:.1}, {:.1}, {:.1})\n",
            "Gravity: ({:.2}, {:.2}, {:.2}) |g| {:.2} from {} sources\n",
            "Up: ({:.2}, {:.2}, {:.2})\nVelocity: {:.2} m/s\nGrounded: {} | Jump phase: {}",
        ),
        fps,
        frame_time,
        position.x,
        position.y,
        position.z,
        gravity.x,
        gravity.y,
        gravity.z,
        gravity.length(),
        sources,
        motor.up_axis.x,
        motor.up_axis.y,
        motor.up_axis.z,
        motor.velocity.length(),
        motor.is_grounded(),
        motor.jump_phase,
    )
}

/// Update the debug overlay text once every interval.
///
/// # Arguments
/// * `ctx` - system parameters grouped into a context struct
pub fn update_debug_overlay(mut ctx: DebugOverlayCtx<'_, '_>) {
    if !ctx.timer.0.tick(ctx.time.delta()).just_finished() {
        return;
    }

    let Ok(mut text) = ctx.query.get_single_mut() else { return };

    if !ctx.state.visible {
        text.sections[0].value = String::new();
        return;
    }

    let fps = ctx
        .diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);
    // already in milliseconds
    let frame_time = ctx
        .diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);

    text.sections[0].value = match ctx.player_query.get_single() {
        Ok((transform, motor)) => {
            let position = transform.translation();
            let gravity = ctx.field.gravity(position);
            overlay_text(fps, frame_time, position, gravity, motor, ctx.field.enabled_count())
        }
        Err(_) => format!("FPS: {fps:.1}\nPlayer: N/A"),
    };
}

/// Spawn the overlay and HUD text nodes.
pub fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        TextBundle::from_section(
            "",
            TextStyle { font_size: 18.0, color: Color::srgb(1.0, 1.0, 0.0), ..default() },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Px(10.0),
            ..default()
        }),
        DebugOverlayText,
    ));

    commands.spawn((
        TextBundle::from_section(
            hud_line(ProjectileMode::default(), FireMode::default()),
            TextStyle { font_size: 24.0, color: Color::WHITE, ..default() },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            right: Val::Px(16.0),
            bottom: Val::Px(16.0),
            ..default()
        }),
        HudText,
    ));

    spawn_crosshair(&mut commands);
}

/// Spawn a crosshair UI element centered on the screen.
///
/// # Arguments
/// * `commands` - mutable `Commands` used to spawn UI nodes
pub fn spawn_crosshair(commands: &mut Commands) {
    commands
        .spawn(NodeBundle {
            style: Style {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            ..default()
        })
        .with_children(|p| {
            for (width, height) in [(20.0, 2.0), (2.0, 20.0)] {
                p.spawn(NodeBundle {
                    style: Style {
                        position_type: PositionType::Absolute,
                        width: Val::Px(width),
                        height: Val::Px(height),
                        ..default()
                    },
                    background_color: Color::WHITE.into(),
                    ..default()
                });
            }
        });
}

/// Registers HUD and debug overlay systems.
pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_debug_overlay, spawn_hud))
            .add_systems(Update, (toggle_debug_overlay, update_debug_overlay, update_hud));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hud_line_names_both_modes() {
        assert_eq!(hud_line(ProjectileMode::Positive, FireMode::Direct), "+ Positive | Direct");
        assert_eq!(hud_line(ProjectileMode::Negative, FireMode::Bounce), "- Negative | Bounce");
    }

    #[test]
    fn overlay_reports_motor_state() {
        let motor = MotorState { ground_contact_count: 1, jump_phase: 2, ..default() };
        let text = overlay_text(60.0, 16.6, Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, -9.81, 0.0), &motor, 3);
        assert!(text.contains("Pos: (1.0, 2.0, 3.0)"));
        assert!(text.contains("|g| 9.81 from 3 sources"));
        assert!(text.contains("Grounded: true | Jump phase: 2"));
    }

    #[test]
    fn toggle_key_flips_overlay() {
        let mut app = App::new();
        app.insert_resource(Settings::default());
        app.init_resource::<ButtonInput<KeyCode>>();
        app.insert_resource(DebugOverlayState::default());
        app.add_systems(Update, toggle_debug_overlay);

        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::F1);
        app.update();
        assert!(app.world().resource::<DebugOverlayState>().visible);
    }

    #[test]
    fn hud_follows_gun_changes() {
        let mut app = App::new();
        app.add_systems(Update, update_hud);
        let text = app.world_mut().spawn((Text::from_section("", TextStyle::default()), HudText)).id();
        let gun = app.world_mut().spawn(Gun::default()).id();
        app.update();
        assert_eq!(app.world().get::<Text>(text).unwrap().sections[0].value, "+ Positive | Direct");

        app.world_mut().get_mut::<Gun>(gun).unwrap().fire_mode = FireMode::Bounce;
        app.update();
        assert_eq!(app.world().get::<Text>(text).unwrap().sections[0].value, "+ Positive | Bounce");
    }
}
