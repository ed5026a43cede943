//! Debug utilities, including a system (F3 default) that dumps diagnostics,
//! gravity sources and player motor state to a timestamped text file in
//! `./debug-dumps/`.
//!
//! Useful for capturing the state behind a movement or gravity glitch
//! without attaching a debugger.
use std::fmt::Write;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use chrono::{DateTime, Utc};

use crate::gravity::{GravityBody, GravityKind, GravitySource};
use crate::player::{MotorState, Player, PlayerLook};
use crate::settings::Settings;
use crate::weapon::{Gun, Projectile};

pub const DUMP_DIR: &str = "debug-dumps";

pub struct DebugDumpPlugin;

impl Plugin for DebugDumpPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, debug_input_system);
    }
}

fn kind_name(kind: &GravityKind) -> &'static str {
    match kind {
        GravityKind::Uniform { .. } => "uniform",
        GravityKind::Volume(_) => "volume",
        GravityKind::Sphere(_) => "sphere",
        GravityKind::Plane(_) => "plane",
    }
}

/// One line per gravity source: entity, shape, enabled flag and position.
#[must_use]
pub fn describe_sources<'a>(
    sources: impl IntoIterator<Item = (Entity, &'a GravitySource, &'a GlobalTransform)>,
) -> String {
    let mut out = String::new();
    for (entity, source, transform) in sources {
        let p = transform.translation();
        let mut line = format!(
            "  {entity:?} {} enabled={} at ({:.2}, {:.2}, {:.2})",
            kind_name(&source.kind),
            source.enabled,
            p.x,
            p.y,
            p.z
        );
        if let GravityKind::Volume(volume) = &source.kind {
            write!(line, " occupied={} kill={:?}", volume.occupied, volume.kill).ok();
        }
        writeln!(out, "{line}").ok();
    }
    if out.is_empty() {
        out.push_str("  (no gravity sources)\n");
    }
    out
}

/// Motor and look state of one player.
#[must_use]
pub fn describe_player(entity: Entity, position: Vec3, motor: &MotorState, look: Option<&PlayerLook>) -> String {
    let mut out = String::new();
    writeln!(out, "  {entity:?} at ({:.3}, {:.3}, {:.3})", position.x, position.y, position.z).ok();
    writeln!(out, "    velocity={:?} |v|={:.3}", motor.velocity, motor.velocity.length()).ok();
    writeln!(out, "    up={:?} right={:?} forward={:?}", motor.up_axis, motor.right_axis, motor.forward_axis).ok();
    writeln!(
        out,
        "    grounded={} jump_phase={} steps_since_jump={} connected={:?}",
        motor.is_grounded(),
        motor.jump_phase,
        motor.steps_since_last_jump,
        motor.previous_connected
    )
    .ok();
    if let Some(look) = look {
        writeln!(out, "    pitch={:.1} yaw={:.1} alignment={:?}", look.angles.x, look.angles.y, look.alignment).ok();
    }
    out
}

/// Write `text` to `<dir>/debug-<secs>.txt`, creating `dir` if needed.
///
/// A dump taken in the same second gets a `-1`, `-2`, ... suffix instead of
/// replacing the earlier file.
pub fn write_dump(dir: &Path, ts_secs: i64, text: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    for n in 0u32.. {
        let name = if n == 0 { format!("debug-{ts_secs}.txt") } else { format!("debug-{ts_secs}-{n}.txt") };
        let path = dir.join(name);
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(text.as_bytes())?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(io::ErrorKind::AlreadyExists, "no free debug dump name"))
}

/// Listens for the dump key and writes a snapshot of the simulation.
///
/// # Arguments
/// * `keys` - keyboard input, the `dump_debug` bind triggers the dump
/// * `diagnostics` - FPS and frame time
/// * `entities` - counts every entity in the world
/// * `sources`, `players`, `bodies`, `guns`, `projectiles` - gameplay state to report
#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments)]
fn debug_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    settings: Res<Settings>,
    diagnostics: Res<DiagnosticsStore>,
    entities: Query<Entity>,
    sources: Query<(Entity, &GravitySource, &GlobalTransform)>,
    players: Query<(Entity, &GlobalTransform, &MotorState, Option<&PlayerLook>), With<Player>>,
    bodies: Query<&GravityBody>,
    guns: Query<&Gun>,
    projectiles: Query<&Projectile>,
) {
    if !keys.just_pressed(settings.controls.key("dump_debug", KeyCode::F3)) {
        return;
    }

    let now: DateTime<Utc> = Utc::now();
    let ts_secs = now.timestamp();
    let human_ts = now.format("%Y-%m-%d %H:%M:%S");

    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);
    let frame_time = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);

    let mut out = String::new();
    writeln!(out, "Debug dump: {ts_secs}").ok();
    writeln!(out, "Timestamp: {human_ts} (epoch secs: {ts_secs})").ok();
    writeln!(out, "FPS: {fps:.1}, frame_time: {frame_time:.4} ms").ok();
    writeln!(out, "Entities: {}", entities.iter().count()).ok();

    writeln!(out, "\nGravity sources:").ok();
    out.push_str(&describe_sources(sources.iter()));

    writeln!(out, "\nPlayers:").ok();
    for (entity, transform, motor, look) in &players {
        out.push_str(&describe_player(entity, transform.translation(), motor, look));
    }

    let floating = bodies.iter().filter(|b| b.float_to_sleep).count();
    let submerged = bodies.iter().filter(|b| b.in_water()).count();
    writeln!(out, "\nGravity bodies: {} ({floating} float to sleep, {submerged} in water)", bodies.iter().count()).ok();

    for gun in &guns {
        writeln!(out, "Gun: mode={:?} fire_mode={:?} aim={:?}", gun.mode, gun.fire_mode, gun.aim).ok();
    }
    writeln!(out, "Projectiles in flight: {}", projectiles.iter().count()).ok();

    match write_dump(Path::new(DUMP_DIR), ts_secs, &out) {
        Ok(path) => info!("wrote debug dump: {}", path.display()),
        Err(e) => error!("debug dump: failed to write to '{}': {}", DUMP_DIR, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gravity::GravityVolume;

    #[test]
    fn sources_are_listed_with_kind() {
        let global = GravitySource::global(Vec3::NEG_Y);
        let volume = GravitySource::volume(GravityVolume::default()).disabled();
        let t = GlobalTransform::from_xyz(1.0, 2.0, 3.0);
        let text = describe_sources([(Entity::from_raw(1), &global, &t), (Entity::from_raw(2), &volume, &t)]);
        assert!(text.contains("uniform enabled=true at (1.00, 2.00, 3.00)"));
        assert!(text.contains("volume enabled=false"));
        assert!(text.contains("occupied=false kill=None"));
    }

    #[test]
    fn empty_source_list_is_explicit() {
        assert_eq!(describe_sources(std::iter::empty()), "  (no gravity sources)\n");
    }

    #[test]
    fn player_description_includes_motor_state() {
        let motor = MotorState { jump_phase: 1, ..default() };
        let text = describe_player(Entity::from_raw(4), Vec3::ZERO, &motor, Some(&PlayerLook::default()));
        assert!(text.contains("grounded=false jump_phase=1"));
        assert!(text.contains("pitch=0.0 yaw=0.0"));
    }

    #[test]
    fn dump_is_written_into_new_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("dumps");
        let path = write_dump(&dir, 1234, "hello").unwrap();
        assert_eq!(path, dir.join("debug-1234.txt"));
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
    }

    #[test]
    fn same_second_dumps_do_not_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let first = write_dump(tmp.path(), 99, "first").unwrap();
        let second = write_dump(tmp.path(), 99, "second").unwrap();
        let third = write_dump(tmp.path(), 99, "third").unwrap();

        assert_eq!(second, tmp.path().join("debug-99-1.txt"));
        assert_eq!(third, tmp.path().join("debug-99-2.txt"));
        assert_eq!(fs::read_to_string(first).unwrap(), "first");
        assert_eq!(fs::read_to_string(second).unwrap(), "second");
    }
}
