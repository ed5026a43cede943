pub mod debug;
pub mod gravity;
pub mod interaction;
pub mod physics;
pub mod player;
pub mod ron;
pub mod settings;
pub mod ui;
pub mod weapon;

use bevy::prelude::*;

/// Every gameplay plugin of the crate, physics included.
///
/// Expects `Settings` to be inserted before the app runs.
pub struct PolarityPlugin;

impl Plugin for PolarityPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            physics::PhysicsPlugin,
            gravity::GravityPlugin,
            player::PlayerPlugin,
            weapon::WeaponPlugin,
            interaction::InteractionPlugin,
            ui::HudPlugin,
            debug::DebugDumpPlugin,
        ));
    }
}
