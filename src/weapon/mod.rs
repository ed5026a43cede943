//! The polarity gun.
//!
//! A shot first raises the weapon (aim down sight), fires a projectile when
//! fully raised and then lowers it again. The projectile carries the gun's
//! current [`ProjectileMode`] and survives as many hits as the
//! [`FireMode`] allows.

pub mod projectile;
pub mod sway;

use bevy::prelude::*;

pub use projectile::*;
pub use sway::*;

use crate::settings::Settings;

/// Polarity carried by a projectile; decides the direction of an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectileMode {
    #[default]
    Positive = 1,
    Negative = -1,
}

impl ProjectileMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }

    /// +1.0 or -1.0.
    #[must_use]
    pub fn sign(self) -> f32 {
        f32::from(self as i8)
    }
}

/// How many collisions a projectile takes before it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FireMode {
    #[default]
    Direct = 1,
    Bounce = 2,
}

impl FireMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Direct => Self::Bounce,
            Self::Bounce => Self::Direct,
        }
    }

    #[must_use]
    pub fn hit_count(self) -> u32 {
        self as u32
    }
}

/// Where the gun is in its raise/fire/lower cycle. `elapsed` is in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AimPhase {
    #[default]
    Idle,
    Raising { elapsed: f32 },
    Lowering { elapsed: f32 },
}

/// Output of one [`Gun::advance_aim`] call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AimStep {
    /// New sway lerp value, if it changed.
    pub lerp: Option<f32>,
    /// A projectile leaves the barrel this frame.
    pub fire: bool,
}

/// Edge-triggered gun input for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GunInput {
    pub toggle_mode: bool,
    pub toggle_fire_mode: bool,
    pub shoot_pressed: bool,
    pub shoot_released: bool,
}

#[derive(Component, Debug, Clone, PartialEq, Default)]
pub struct Gun {
    pub mode: ProjectileMode,
    pub fire_mode: FireMode,
    pub firing: bool,
    /// Real time (seconds since startup) before which no shot starts.
    pub next_fire_at: f32,
    pub aim: AimPhase,
    /// Entity whose transform the projectile spawns from.
    pub camera: Option<Entity>,
    /// Entity carrying the [`WeaponSway`] driven by the aim cycle.
    pub sway: Option<Entity>,
}

impl Gun {
    #[must_use]
    pub fn new(camera: Option<Entity>, sway: Option<Entity>) -> Self {
        Self { camera, sway, ..default() }
    }

    /// Apply one frame of input. Returns `true` when a new shot started.
    ///
    /// # Arguments
    /// * `now` - real time in seconds, unaffected by time scaling
    /// * `fire_rate` - minimum seconds between two shots
    pub fn handle_input(&mut self, input: GunInput, now: f32, fire_rate: f32) -> bool {
        if input.toggle_mode {
            self.mode = self.mode.toggled();
            info!("projectile mode set to {:?}", self.mode);
        }
        if input.toggle_fire_mode {
            self.fire_mode = self.fire_mode.toggled();
            info!("fire mode set to {:?}", self.fire_mode);
        }

        if input.shoot_pressed {
            self.firing = true;
        } else if input.shoot_released {
            self.firing = false;
        }

        if now < self.next_fire_at || !self.firing {
            return false;
        }

        info!("Pew!");
        self.aim = AimPhase::Raising { elapsed: 0.0 };
        self.next_fire_at = now + fire_rate;
        true
    }

    /// Advance the aim cycle by `dt` seconds.
    ///
    /// # Arguments
    /// * `aim_down` - raise duration
    /// * `stop_aim` - lower duration
    pub fn advance_aim(&mut self, dt: f32, aim_down: f32, stop_aim: f32) -> AimStep {
        match self.aim {
            AimPhase::Idle => AimStep::default(),
            AimPhase::Raising { elapsed } if elapsed < aim_down => {
                self.aim = AimPhase::Raising { elapsed: elapsed + dt };
                AimStep { lerp: Some(elapsed / aim_down), fire: false }
            }
            AimPhase::Raising { .. } => {
                // lowering starts in the same frame at full raise
                self.aim = AimPhase::Lowering { elapsed: dt };
                AimStep { lerp: Some(1.0), fire: true }
            }
            AimPhase::Lowering { elapsed } if elapsed < stop_aim => {
                self.aim = AimPhase::Lowering { elapsed: elapsed + dt };
                AimStep { lerp: Some(1.0 - elapsed / stop_aim), fire: false }
            }
            AimPhase::Lowering { .. } => {
                self.aim = AimPhase::Idle;
                AimStep { lerp: Some(0.0), fire: false }
            }
        }
    }
}

/// Collect this frame's gun input from the configured binds.
#[must_use]
pub fn gun_input(keys: &ButtonInput<KeyCode>, mouse: &ButtonInput<MouseButton>, settings: &Settings) -> GunInput {
    let controls = &settings.controls;
    let shoot = controls.mouse_button("shoot", MouseButton::Left);
    GunInput {
        toggle_mode: keys.just_pressed(controls.key("projectile_mode", KeyCode::KeyQ)),
        toggle_fire_mode: keys.just_pressed(controls.key("fire_mode", KeyCode::KeyE)),
        shoot_pressed: mouse.just_pressed(shoot),
        shoot_released: mouse.just_released(shoot),
    }
}

/// Per-frame input handling for every gun.
#[allow(clippy::needless_pass_by_value)]
pub fn update_guns(
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    real_time: Res<Time<Real>>,
    settings: Res<Settings>,
    mut guns: Query<&mut Gun>,
) {
    let input = gun_input(&keys, &mouse, &settings);
    let now = real_time.elapsed_seconds();
    for mut gun in &mut guns {
        gun.handle_input(input, now, settings.weapon.fire_rate_seconds);
    }
}

/// Drive the aim cycle: move the weapon and spawn projectiles.
#[allow(clippy::needless_pass_by_value)]
pub fn advance_gun_aim(
    mut commands: Commands,
    time: Res<Time>,
    settings: Res<Settings>,
    assets: Option<Res<ProjectileAssets>>,
    cameras: Query<&GlobalTransform>,
    mut guns: Query<&mut Gun>,
    mut sways: Query<&mut WeaponSway>,
) {
    let (aim_down, stop_aim) = settings.weapon.aim_durations();

    for mut gun in &mut guns {
        let step = gun.advance_aim(time.delta_seconds(), aim_down, stop_aim);

        if let Some(t) = step.lerp {
            if let Some(mut sway) = gun.sway.and_then(|e| sways.get_mut(e).ok()) {
                sway.set_lerp_value(t);
            }
        }

        if !step.fire {
            continue;
        }
        let Some(camera) = gun.camera.and_then(|e| cameras.get(e).ok()) else {
            warn!("gun fired without a camera to aim from");
            continue;
        };
        let (_, rotation, translation) = camera.to_scale_rotation_translation();
        let origin = Transform::from_translation(translation + *camera.forward()).with_rotation(rotation);
        spawn_projectile(
            &mut commands,
            assets.as_deref(),
            origin,
            Projectile::new(gun.mode, gun.fire_mode, settings.weapon.projectile_speed),
            settings.weapon.projectile_radius,
        );
    }
}

/// Registers gun, sway and projectile systems.
pub struct WeaponPlugin;

impl Plugin for WeaponPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_projectile_assets).add_systems(
            Update,
            (
                (update_guns, advance_gun_aim, apply_weapon_sway).chain(),
                handle_projectile_hits,
                expire_projectiles,
            ),
        );
    }
}
