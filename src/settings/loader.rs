//! Settings loading and hot-reloading.
//!
//! Settings are loaded from RON files in the `data/settings` directory. If multiple
//! RON files are present, the first successfully parsed `Settings` (by file name)
//! is used. If no RON files are found or none parse, default settings are used.
use crate::ron::{load_ron_files, setup_ron_watcher, RonWatcher};
use crate::settings::Settings;
use bevy::log::{info, warn};
use bevy::prelude::{Res, ResMut, Resource};

/// Directory scanned for settings files.
pub const SETTINGS_DIR: &str = "data/settings";

#[derive(Resource)]
pub struct SettingsWatcher {
    pub watcher: RonWatcher,
    pub dir: String,
}

/// Load settings from `path` (directory).
///
/// # Arguments
/// * `path` - The directory path where settings RON files are located (e.g., "data/settings").
///
/// # Example
/// ```no_run
/// let settings = polarity::settings::loader::load_settings_from_dir("data/settings");
/// ```
#[must_use]
pub fn load_settings_from_dir(path: &str) -> Settings {
    let items: Vec<Settings> = load_ron_files(path);
    let mut settings = items.into_iter().next().unwrap_or_else(Settings::defaults);
    let adjusted = settings.clamp_to_ranges();
    if !adjusted.is_empty() {
        warn!("settings out of range, clamped: {}", adjusted.join(", "));
    }
    settings
}

/// Create a watcher for the settings directory (hot-reload).
///
/// # Errors
/// Propagates the `notify::Error` when the directory cannot be watched.
pub fn setup_settings_watcher(path: &str) -> Result<SettingsWatcher, notify::Error> {
    setup_ron_watcher(path).map(|watcher| SettingsWatcher { watcher, dir: path.to_string() })
}

/// Check for changes and reload the settings resource when files change.
#[allow(clippy::needless_pass_by_value)]
pub fn check_settings_changes(watcher: Res<SettingsWatcher>, mut settings: ResMut<Settings>) {
    if watcher.watcher.take_changed() {
        info!("settings changed, reloading from {}", watcher.dir);
        *settings = load_settings_from_dir(&watcher.dir);
    }
}

impl SettingsWatcher {
    #[must_use]
    pub fn stub() -> Self {
        SettingsWatcher { watcher: RonWatcher::stub(), dir: SETTINGS_DIR.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::prelude::*;

    #[test]
    fn empty_directory_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings_from_dir(dir.path().to_str().unwrap());
        assert_eq!(settings.weapon.fire_rate_seconds, 1.0);
    }

    #[test]
    fn out_of_range_file_is_clamped_on_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ron = "(movement: (jump_height: -2.0, max_air_jumps: 9), \
                   camera: (up_alignment_speed: -10.0, rotation_speed: 1000.0, sensitivity: (5.0, -1.0)))";
        std::fs::write(dir.path().join("settings.ron"), ron).unwrap();

        let settings = load_settings_from_dir(dir.path().to_str().unwrap());

        assert_eq!(settings.movement.jump_height, 0.0);
        assert_eq!(settings.movement.max_air_jumps, 5);
        assert_eq!(settings.camera.up_alignment_speed, 0.0);
        assert_eq!(settings.camera.rotation_speed, 360.0);
        assert_eq!(settings.camera.sensitivity, Vec2::new(2.0, 0.0));
        assert_eq!(settings.movement.max_speed, 10.0);
    }

    #[test]
    fn flagged_change_reloads_resource() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("settings.ron"), "(weapon: (fire_rate_seconds: 0.25))").unwrap();

        let mut app = App::new();
        let watcher = SettingsWatcher { watcher: RonWatcher::stub(), dir: dir.path().to_str().unwrap().to_string() };
        watcher.watcher.mark_changed();
        app.insert_resource(watcher);
        app.insert_resource(Settings::default());
        app.add_systems(Update, check_settings_changes);

        app.update();

        assert_eq!(app.world().resource::<Settings>().weapon.fire_rate_seconds, 0.25);
        assert!(!app.world().resource::<SettingsWatcher>().watcher.take_changed());
    }
}
