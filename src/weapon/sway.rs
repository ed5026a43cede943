//! Weapon pose blending between a walk anchor and a shoot anchor.

use bevy::prelude::*;

/// Blends the weapon's local transform from `walk` (t = 0) to `shoot`
/// (t = 1). Anchors are sibling entities sharing the weapon's parent.
#[derive(Component, Debug, Clone, PartialEq, Default)]
pub struct WeaponSway {
    pub walk: Option<Entity>,
    pub shoot: Option<Entity>,
    pub t: f32,
}

impl WeaponSway {
    #[must_use]
    pub fn new(walk: Entity, shoot: Entity) -> Self {
        Self { walk: Some(walk), shoot: Some(shoot), t: 0.0 }
    }

    pub fn set_lerp_value(&mut self, t: f32) {
        self.t = t.clamp(0.0, 1.0);
    }

    /// Blended translation and rotation; scale is left alone.
    #[must_use]
    pub fn pose(&self, walk: &Transform, shoot: &Transform) -> (Vec3, Quat) {
        (
            walk.translation.lerp(shoot.translation, self.t),
            walk.rotation.slerp(shoot.rotation, self.t),
        )
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn apply_weapon_sway(
    mut weapons: Query<(&WeaponSway, &mut Transform)>,
    anchors: Query<&Transform, Without<WeaponSway>>,
) {
    for (sway, mut transform) in &mut weapons {
        let (Some(walk), Some(shoot)) = (sway.walk, sway.shoot) else {
            continue;
        };
        let (Ok(walk), Ok(shoot)) = (anchors.get(walk), anchors.get(shoot)) else {
            continue;
        };
        let (translation, rotation) = sway.pose(walk, shoot);
        transform.translation = translation;
        transform.rotation = rotation;
    }
}
