//! Systems that push hot-reloaded `Settings` into running state.
use bevy::prelude::*;
use bevy::window::{PresentMode, PrimaryWindow};
use polarity::gravity::{GravityKind, GravitySource};
use polarity::settings::Settings;

/// Marks the scene-wide uniform source driven by `Settings.gravity.global`.
#[derive(Component)]
pub struct GlobalGravity;

/// Sync `Settings.graphics.vsync` into the present mode of the primary window.
///
/// # Arguments
/// - `settings`: reloaded settings; nothing happens unless they changed
/// - `windows`: primary window whose present mode is updated
#[allow(clippy::needless_pass_by_value)]
pub fn sync_vsync_settings(settings: Res<Settings>, mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    if !settings.is_changed() {
        return;
    }
    let desired = if settings.graphics.vsync { PresentMode::Fifo } else { PresentMode::AutoNoVsync };
    for mut w in &mut windows {
        if w.present_mode != desired {
            w.present_mode = desired;
        }
    }
}

/// Sync `Settings.gravity.global` into the global gravity source.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_global_gravity(settings: Res<Settings>, mut sources: Query<&mut GravitySource, With<GlobalGravity>>) {
    if !settings.is_changed() {
        return;
    }
    for mut source in &mut sources {
        if let GravityKind::Uniform { acceleration } = &mut source.kind {
            if *acceleration != settings.gravity.global {
                info!("global gravity set to {}", settings.gravity.global);
                *acceleration = settings.gravity.global;
            }
        }
    }
}
