//! Gravity sources and their aggregation.
//!
//! Every entity carrying a [`GravitySource`] contributes an acceleration at
//! a given world position. [`GravityField`] sums the enabled sources into
//! one effective gravity vector and derives the local up axis from it.
//! Systems that move bodies read the field; systems that switch sources on
//! and off (volumes, triggers) write the components directly.

pub mod body;
pub mod trigger;
pub mod volume;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::PhysicsSet;

pub use body::*;
pub use trigger::*;
pub use volume::*;

/// Magnitude below which a summed gravity vector has no usable direction.
const MIN_GRAVITY_SQ: f32 = 1e-8;

/// Shape-specific gravity behaviour.
#[derive(Debug, Clone, PartialEq)]
pub enum GravityKind {
    /// The same acceleration everywhere.
    Uniform { acceleration: Vec3 },
    /// Box volume that only pulls while a player is inside it.
    Volume(GravityVolume),
    /// Pulls toward the source origin.
    Sphere(SphereGravity),
    /// Pulls along the source's local -Y.
    Plane(PlaneGravity),
}

/// Radial gravity around the source translation.
///
/// Full strength inside `outer_radius`, fading linearly to zero at
/// `outer_falloff_radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereGravity {
    pub gravity: f32,
    pub outer_radius: f32,
    pub outer_falloff_radius: f32,
}

impl Default for SphereGravity {
    fn default() -> Self {
        Self { gravity: 9.81, outer_radius: 10.0, outer_falloff_radius: 15.0 }
    }
}

impl SphereGravity {
    fn acceleration(&self, center: Vec3, position: Vec3) -> Vec3 {
        let to_center = center - position;
        let distance = to_center.length();
        let falloff_radius = self.outer_falloff_radius.max(self.outer_radius);
        if distance <= f32::EPSILON || distance > falloff_radius {
            return Vec3::ZERO;
        }
        let mut g = self.gravity / distance;
        if distance > self.outer_radius {
            g *= 1.0 - (distance - self.outer_radius) / (falloff_radius - self.outer_radius);
        }
        to_center * g
    }
}

/// Planar gravity. Bodies below the plane get full strength; above it the
/// pull fades out over `range` (non-positive range means no fade).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGravity {
    pub gravity: f32,
    pub range: f32,
}

impl Default for PlaneGravity {
    fn default() -> Self {
        Self { gravity: 9.81, range: 1.0 }
    }
}

impl PlaneGravity {
    fn acceleration(&self, transform: &GlobalTransform, position: Vec3) -> Vec3 {
        let up = *transform.up();
        let distance = up.dot(position - transform.translation());
        let mut g = -self.gravity;
        if self.range > 0.0 {
            if distance > self.range {
                return Vec3::ZERO;
            }
            if distance > 0.0 {
                g *= 1.0 - distance / self.range;
            }
        }
        up * g
    }
}

/// A gravity contributor.
///
/// Disabled sources stay in the world but add nothing; triggers flip
/// `enabled` to swap gravity at runtime.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct GravitySource {
    pub enabled: bool,
    pub kind: GravityKind,
}

impl GravitySource {
    /// Scene-wide uniform gravity.
    #[must_use]
    pub fn global(acceleration: Vec3) -> Self {
        Self { enabled: true, kind: GravityKind::Uniform { acceleration } }
    }

    #[must_use]
    pub fn volume(volume: GravityVolume) -> Self {
        Self { enabled: true, kind: GravityKind::Volume(volume) }
    }

    #[must_use]
    pub fn sphere(sphere: SphereGravity) -> Self {
        Self { enabled: true, kind: GravityKind::Sphere(sphere) }
    }

    #[must_use]
    pub fn plane(plane: PlaneGravity) -> Self {
        Self { enabled: true, kind: GravityKind::Plane(plane) }
    }

    /// Builder helper for sources that start switched off.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Acceleration this source applies at `position`.
    #[must_use]
    pub fn gravity_at(&self, transform: &GlobalTransform, position: Vec3) -> Vec3 {
        if !self.enabled {
            return Vec3::ZERO;
        }
        match &self.kind {
            GravityKind::Uniform { acceleration } => *acceleration,
            GravityKind::Volume(volume) => volume.acceleration(transform),
            GravityKind::Sphere(sphere) => sphere.acceleration(transform.translation(), position),
            GravityKind::Plane(plane) => plane.acceleration(transform, position),
        }
    }
}

/// Sum of every source's contribution at `position`.
pub fn total_gravity<'a>(
    sources: impl IntoIterator<Item = (&'a GravitySource, &'a GlobalTransform)>,
    position: Vec3,
) -> Vec3 {
    sources
        .into_iter()
        .map(|(source, transform)| source.gravity_at(transform, position))
        .sum()
}

/// Unit vector opposing `gravity`, or `None` when there is no gravity.
#[must_use]
pub fn up_axis(gravity: Vec3) -> Option<Vec3> {
    if gravity.length_squared() < MIN_GRAVITY_SQ {
        None
    } else {
        Some(-gravity.normalize())
    }
}

/// Read-only view of all gravity sources in the world.
#[derive(SystemParam)]
pub struct GravityField<'w, 's> {
    sources: Query<'w, 's, (&'static GravitySource, &'static GlobalTransform)>,
}

impl GravityField<'_, '_> {
    #[must_use]
    pub fn gravity(&self, position: Vec3) -> Vec3 {
        total_gravity(self.sources.iter(), position)
    }

    #[must_use]
    pub fn up_axis(&self, position: Vec3) -> Option<Vec3> {
        up_axis(self.gravity(position))
    }

    /// Gravity and up axis in one pass. `fallback_up` is returned as the up
    /// axis when the summed gravity is zero.
    #[must_use]
    pub fn gravity_and_up(&self, position: Vec3, fallback_up: Vec3) -> (Vec3, Vec3) {
        let gravity = self.gravity(position);
        (gravity, up_axis(gravity).unwrap_or(fallback_up))
    }

    /// Number of sources currently contributing.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.sources.iter().filter(|(s, _)| s.enabled).count()
    }
}

/// Registers gravity volume, trigger and body systems.
pub struct GravityPlugin;

impl Plugin for GravityPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<Respawned>()
            .add_systems(
                Update,
                (track_volume_occupancy, fire_gravity_triggers, track_water_contacts),
            )
            .add_systems(FixedUpdate, apply_body_gravity.before(PhysicsSet::SyncBackend));
    }
}
