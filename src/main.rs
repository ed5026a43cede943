use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};
use polarity::settings::loader as settings_loader;
use polarity::PolarityPlugin;

mod app;
use app::{move_platforms, setup, sync_global_gravity, sync_vsync_settings};

fn main() {
    let settings = settings_loader::load_settings_from_dir(settings_loader::SETTINGS_DIR);
    let settings_watcher = settings_loader::setup_settings_watcher(settings_loader::SETTINGS_DIR)
        .unwrap_or_else(|_| settings_loader::SettingsWatcher::stub());

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Polarity".into(),
                position: WindowPosition::Centered(MonitorSelection::Primary),
                present_mode: if settings.graphics.vsync { PresentMode::Fifo } else { PresentMode::AutoNoVsync },
                ..default()
            }),
            ..default()
        }))
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(LogDiagnosticsPlugin::default());

    app.insert_resource(settings);
    app.insert_resource(settings_watcher);

    app.add_plugins(PolarityPlugin);

    app.add_systems(Startup, setup);
    app.add_systems(FixedUpdate, move_platforms);
    app.add_systems(Update, settings_loader::check_settings_changes);
    app.add_systems(Update, sync_vsync_settings);
    app.add_systems(Update, sync_global_gravity);

    app.run();
}
