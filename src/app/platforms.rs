//! Kinematic platforms moving back and forth in the demo scene.
use bevy::prelude::*;

/// Ping-pongs a kinematic body between `origin` and `origin + offset`.
#[derive(Component)]
pub struct MovingPlatform {
    pub origin: Vec3,
    pub offset: Vec3,
    /// Seconds for one full round trip.
    pub period: f32,
}

/// Advance every moving platform along its path.
#[allow(clippy::needless_pass_by_value)]
pub fn move_platforms(time: Res<Time>, mut platforms: Query<(&MovingPlatform, &mut Transform)>) {
    let t = time.elapsed_seconds();
    for (platform, mut transform) in &mut platforms {
        let phase = (t / platform.period.max(0.1) * std::f32::consts::TAU).sin() * 0.5 + 0.5;
        transform.translation = platform.origin + platform.offset * phase;
    }
}
