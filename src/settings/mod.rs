//! Settings, types and defaults.
//!
//! Settings are stored as a RON file under `data/settings/` and are hot-reloadable
//! using the RON watcher utilities (see `ron::setup_ron_watcher`). Every field
//! carries a serde default so partial files stay valid.
use bevy::math::{Vec2, Vec3};
use bevy::prelude::{KeyCode, MouseButton, Resource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsSettings {
    #[serde(default = "GraphicsSettings::default_vsync")]
    pub vsync: bool, // Enable vertical sync to cap FPS to the display refresh rate.
}

impl GraphicsSettings {
    fn default_vsync() -> bool { true }
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self { vsync: Self::default_vsync() }
    }
}

/// Controls / input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsSettings {
    #[serde(default)]
    pub invert_y: bool, // Invert mouse Y axis
    #[serde(default)]
    pub invert_x: bool, // Invert mouse X axis
    #[serde(default = "ControlsSettings::default_sensitivity")]
    pub mouse_sensitivity: f32, // Raw mouse delta multiplier applied before look sensitivity
    #[serde(default = "ControlsSettings::default_keybinds")]
    pub keybinds: HashMap<String, String>, // Map of action names to key identifiers (editable by user)
}

impl ControlsSettings {
    fn default_sensitivity() -> f32 { 1.0 }

    fn default_keybinds() -> HashMap<String, String> {
        [
            ("forward", "W"),
            ("back", "S"),
            ("left", "A"),
            ("right", "D"),
            ("jump", "Space"),
            ("shoot", "MouseLeft"),
            ("projectile_mode", "Q"),
            ("fire_mode", "E"),
            ("pause", "Escape"),
            ("toggle_debug", "F1"),
            ("dump_debug", "F3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Resolve the key bound to `action`, falling back to `default` when the
    /// binding is missing or unknown.
    #[must_use]
    pub fn key(&self, action: &str, default: KeyCode) -> KeyCode {
        self.keybinds
            .get(action)
            .and_then(|s| Settings::keycode_from_str(s))
            .unwrap_or(default)
    }

    /// Resolve a mouse button bound to `action`, falling back to `default`.
    #[must_use]
    pub fn mouse_button(&self, action: &str, default: MouseButton) -> MouseButton {
        self.keybinds
            .get(action)
            .and_then(|s| Settings::mouse_button_from_str(s))
            .unwrap_or(default)
    }
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            invert_y: false,
            invert_x: false,
            mouse_sensitivity: Self::default_sensitivity(),
            keybinds: Self::default_keybinds(),
        }
    }
}

/// Camera look and up-axis alignment tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "CameraSettings::default_rotation_speed")]
    pub rotation_speed: f32, // Degrees per second per unit of look input (1..360)
    #[serde(default = "CameraSettings::default_min_vertical_angle")]
    pub min_vertical_angle: f32, // Lowest pitch in degrees (-89..89), negative looks up
    #[serde(default = "CameraSettings::default_max_vertical_angle")]
    pub max_vertical_angle: f32, // Highest pitch in degrees (-89..89), positive looks down
    #[serde(default = "CameraSettings::default_sensitivity")]
    pub sensitivity: Vec2, // Per-axis look sensitivity (x = yaw, y = pitch), 0..2
    #[serde(default = "CameraSettings::default_up_alignment_speed")]
    pub up_alignment_speed: f32, // Max degrees per second the body re-aligns to a new up axis
}

impl CameraSettings {
    fn default_rotation_speed() -> f32 { 90.0 }
    fn default_min_vertical_angle() -> f32 { -30.0 }
    fn default_max_vertical_angle() -> f32 { 60.0 }
    fn default_sensitivity() -> Vec2 { Vec2::ONE }
    fn default_up_alignment_speed() -> f32 { 360.0 }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            rotation_speed: Self::default_rotation_speed(),
            min_vertical_angle: Self::default_min_vertical_angle(),
            max_vertical_angle: Self::default_max_vertical_angle(),
            sensitivity: Self::default_sensitivity(),
            up_alignment_speed: Self::default_up_alignment_speed(),
        }
    }
}

/// Character motor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSettings {
    #[serde(default = "MovementSettings::default_speed")]
    pub max_speed: f32, // Target planar speed at full input (0..100)
    #[serde(default = "MovementSettings::default_acceleration")]
    pub max_acceleration: f32, // Planar acceleration while grounded (0..100)
    #[serde(default = "MovementSettings::default_acceleration")]
    pub max_air_acceleration: f32, // Planar acceleration while airborne (0..100)
    #[serde(default = "MovementSettings::default_jump_height")]
    pub jump_height: f32, // Apex height of a jump against the local gravity (0..5)
    #[serde(default)]
    pub max_air_jumps: u32, // Extra jumps allowed before landing (0..5)
    #[serde(default = "MovementSettings::default_input_smooth_time")]
    pub input_smooth_time: f32, // Seconds for the move input to settle on a new value
}

impl MovementSettings {
    fn default_speed() -> f32 { 10.0 }
    fn default_acceleration() -> f32 { 10.0 }
    fn default_jump_height() -> f32 { 3.1 }
    fn default_input_smooth_time() -> f32 { 0.1 }
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            max_speed: Self::default_speed(),
            max_acceleration: Self::default_acceleration(),
            max_air_acceleration: Self::default_acceleration(),
            jump_height: Self::default_jump_height(),
            max_air_jumps: 0,
            input_smooth_time: Self::default_input_smooth_time(),
        }
    }
}

/// Gun and projectile tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSettings {
    #[serde(default = "WeaponSettings::default_fire_rate")]
    pub fire_rate_seconds: f32, // Minimum real time between two shots
    #[serde(default = "WeaponSettings::default_aim_duration")]
    pub aim_down_sight_duration: f32, // Seconds to raise the weapon before the shot leaves (min 0.1)
    #[serde(default = "WeaponSettings::default_aim_duration")]
    pub stop_aim_duration: f32, // Seconds to lower the weapon after the shot (min 0.1)
    #[serde(default = "WeaponSettings::default_projectile_speed")]
    pub projectile_speed: f32, // Muzzle speed in units per second
    #[serde(default = "WeaponSettings::default_projectile_radius")]
    pub projectile_radius: f32, // Collision radius of a projectile
    #[serde(default = "WeaponSettings::default_projectile_lifetime")]
    pub projectile_lifetime: f32, // Seconds before an unspent projectile is culled
}

impl WeaponSettings {
    fn default_fire_rate() -> f32 { 1.0 }
    fn default_aim_duration() -> f32 { 0.15 }
    fn default_projectile_speed() -> f32 { 30.0 }
    fn default_projectile_radius() -> f32 { 0.15 }
    fn default_projectile_lifetime() -> f32 { 10.0 }

    /// Raise/lower durations with the 0.1 s floor applied.
    #[must_use]
    pub fn aim_durations(&self) -> (f32, f32) {
        (self.aim_down_sight_duration.max(0.1), self.stop_aim_duration.max(0.1))
    }
}

impl Default for WeaponSettings {
    fn default() -> Self {
        Self {
            fire_rate_seconds: Self::default_fire_rate(),
            aim_down_sight_duration: Self::default_aim_duration(),
            stop_aim_duration: Self::default_aim_duration(),
            projectile_speed: Self::default_projectile_speed(),
            projectile_radius: Self::default_projectile_radius(),
            projectile_lifetime: Self::default_projectile_lifetime(),
        }
    }
}

/// World gravity defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravitySettings {
    #[serde(default = "GravitySettings::default_global")]
    pub global: Vec3, // Acceleration of the scene-wide uniform gravity source
    #[serde(default = "GravitySettings::default_float_delay")]
    pub float_delay: f32, // Seconds a resting body keeps receiving gravity before it may sleep
}

impl GravitySettings {
    fn default_global() -> Vec3 { Vec3::new(0.0, -9.81, 0.0) }
    fn default_float_delay() -> f32 { 1.0 }
}

impl Default for GravitySettings {
    fn default() -> Self {
        Self {
            global: Self::default_global(),
            float_delay: Self::default_float_delay(),
        }
    }
}

/// Interaction object presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionSettings {
    #[serde(default = "InteractionSettings::default_axis_colors")]
    pub axis_colors: [Vec3; 3], // Linear RGB tint per axis (X, Y, Z)
}

impl InteractionSettings {
    fn default_axis_colors() -> [Vec3; 3] {
        [
            Vec3::new(2.0, 0.2, 0.2),
            Vec3::new(0.2, 2.0, 0.2),
            Vec3::new(0.2, 0.4, 2.0),
        ]
    }
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self { axis_colors: Self::default_axis_colors() }
    }
}

/// Top-level Settings
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub graphics: GraphicsSettings,
    #[serde(default)]
    pub controls: ControlsSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub movement: MovementSettings,
    #[serde(default)]
    pub weapon: WeaponSettings,
    #[serde(default)]
    pub gravity: GravitySettings,
    #[serde(default)]
    pub interaction: InteractionSettings,
}

impl Settings {
    #[must_use]
    pub fn defaults() -> Self { Settings::default() }

    /// Pull every tunable back into its documented range. NaN lands on the
    /// lower bound and a non-finite global gravity falls back to the default.
    ///
    /// # Returns
    /// The names of the fields that were adjusted, empty when nothing moved.
    pub fn clamp_to_ranges(&mut self) -> Vec<&'static str> {
        let mut adjusted = Vec::new();
        let mut bound = |value: &mut f32, min: f32, max: f32, name: &'static str| {
            let bounded = if value.is_nan() { min } else { value.clamp(min, max) };
            if bounded.to_bits() != value.to_bits() {
                *value = bounded;
                adjusted.push(name);
            }
        };

        bound(&mut self.controls.mouse_sensitivity, 0.0, f32::MAX, "controls.mouse_sensitivity");

        let camera = &mut self.camera;
        bound(&mut camera.rotation_speed, 1.0, 360.0, "camera.rotation_speed");
        bound(&mut camera.min_vertical_angle, -89.0, 89.0, "camera.min_vertical_angle");
        bound(&mut camera.max_vertical_angle, -89.0, 89.0, "camera.max_vertical_angle");
        bound(&mut camera.sensitivity.x, 0.0, 2.0, "camera.sensitivity.x");
        bound(&mut camera.sensitivity.y, 0.0, 2.0, "camera.sensitivity.y");
        bound(&mut camera.up_alignment_speed, 0.0, f32::MAX, "camera.up_alignment_speed");

        let movement = &mut self.movement;
        bound(&mut movement.max_speed, 0.0, 100.0, "movement.max_speed");
        bound(&mut movement.max_acceleration, 0.0, 100.0, "movement.max_acceleration");
        bound(&mut movement.max_air_acceleration, 0.0, 100.0, "movement.max_air_acceleration");
        bound(&mut movement.jump_height, 0.0, 5.0, "movement.jump_height");
        bound(&mut movement.input_smooth_time, 0.0, f32::MAX, "movement.input_smooth_time");

        let weapon = &mut self.weapon;
        bound(&mut weapon.fire_rate_seconds, 0.0, f32::MAX, "weapon.fire_rate_seconds");
        bound(&mut weapon.aim_down_sight_duration, 0.1, f32::MAX, "weapon.aim_down_sight_duration");
        bound(&mut weapon.stop_aim_duration, 0.1, f32::MAX, "weapon.stop_aim_duration");
        bound(&mut weapon.projectile_speed, 0.0, f32::MAX, "weapon.projectile_speed");
        bound(&mut weapon.projectile_radius, 0.01, f32::MAX, "weapon.projectile_radius");
        bound(&mut weapon.projectile_lifetime, 0.0, f32::MAX, "weapon.projectile_lifetime");

        bound(&mut self.gravity.float_delay, 0.0, f32::MAX, "gravity.float_delay");

        if self.camera.max_vertical_angle < self.camera.min_vertical_angle {
            self.camera.max_vertical_angle = self.camera.min_vertical_angle;
            adjusted.push("camera.max_vertical_angle");
        }
        if self.movement.max_air_jumps > 5 {
            self.movement.max_air_jumps = 5;
            adjusted.push("movement.max_air_jumps");
        }
        if !self.gravity.global.is_finite() {
            self.gravity.global = GravitySettings::default_global();
            adjusted.push("gravity.global");
        }
        adjusted
    }

    /// Convert a string key identifier (e.g., from `controls.keybinds`) into a `KeyCode` that
    /// can be used with Bevy's input system.
    ///
    /// # Arguments
    /// * `name` - The string key identifier to convert (e.g., "W", "Space", "F1").
    ///
    /// # Returns
    /// The matching `KeyCode`, or `None` if the string does not match any known key.
    #[must_use]
    pub fn keycode_from_str(name: &str) -> Option<KeyCode> {
        const LETTERS: [KeyCode; 26] = [
            KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE,
            KeyCode::KeyF, KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ,
            KeyCode::KeyK, KeyCode::KeyL, KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO,
            KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR, KeyCode::KeyS, KeyCode::KeyT,
            KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX, KeyCode::KeyY,
            KeyCode::KeyZ,
        ];
        const DIGITS: [KeyCode; 10] = [
            KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
            KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
        ];
        const FUNCTION: [KeyCode; 12] = [
            KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4, KeyCode::F5, KeyCode::F6,
            KeyCode::F7, KeyCode::F8, KeyCode::F9, KeyCode::F10, KeyCode::F11, KeyCode::F12,
        ];

        let s = name.trim().to_ascii_uppercase();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                return Some(LETTERS[(c as u8 - b'A') as usize]);
            }
            if c.is_ascii_digit() {
                return Some(DIGITS[(c as u8 - b'0') as usize]);
            }
        }

        if let Some(n) = s.strip_prefix('F').and_then(|n| n.parse::<usize>().ok()) {
            return FUNCTION.get(n.checked_sub(1)?).copied();
        }

        Some(match s.as_str() {
            "LEFT" | "ARROWLEFT" => KeyCode::ArrowLeft,
            "RIGHT" | "ARROWRIGHT" => KeyCode::ArrowRight,
            "UP" | "ARROWUP" => KeyCode::ArrowUp,
            "DOWN" | "ARROWDOWN" => KeyCode::ArrowDown,
            "ESC" | "ESCAPE" => KeyCode::Escape,
            "SPACE" => KeyCode::Space,
            "TAB" => KeyCode::Tab,
            "ENTER" | "RETURN" => KeyCode::Enter,
            "BACKSPACE" => KeyCode::Backspace,
            "LSHIFT" | "SHIFT" => KeyCode::ShiftLeft,
            "RSHIFT" => KeyCode::ShiftRight,
            "LCTRL" | "CTRL" | "CONTROL" => KeyCode::ControlLeft,
            "RCTRL" => KeyCode::ControlRight,
            "LALT" | "ALT" => KeyCode::AltLeft,
            "RALT" => KeyCode::AltRight,
            _ => return None,
        })
    }

    /// Convert a string identifier such as `"MouseLeft"` into a `MouseButton`.
    #[must_use]
    pub fn mouse_button_from_str(name: &str) -> Option<MouseButton> {
        match name.trim().to_ascii_uppercase().as_str() {
            "MOUSELEFT" | "LMB" => Some(MouseButton::Left),
            "MOUSERIGHT" | "RMB" => Some(MouseButton::Right),
            "MOUSEMIDDLE" | "MMB" => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

pub mod loader;
