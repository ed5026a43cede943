//! Triggers that swap which gravity source is active.

use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionEvent;

use crate::gravity::GravitySource;
use crate::player::Player;

/// Sensor that, on every player entry, switches `enable` on and `disable`
/// off. Either reference may be absent.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct GravityTrigger {
    pub enable: Option<Entity>,
    pub disable: Option<Entity>,
}

impl GravityTrigger {
    #[must_use]
    pub fn new(enable: Option<Entity>, disable: Option<Entity>) -> Self {
        Self { enable, disable }
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn fire_gravity_triggers(
    mut events: EventReader<CollisionEvent>,
    triggers: Query<&GravityTrigger>,
    players: Query<(), With<Player>>,
    mut sources: Query<&mut GravitySource>,
) {
    for event in events.read() {
        let CollisionEvent::Started(a, b, _) = *event else {
            continue;
        };
        for (trigger_entity, other) in [(a, b), (b, a)] {
            if !players.contains(other) {
                continue;
            }
            let Ok(trigger) = triggers.get(trigger_entity) else {
                continue;
            };

            if let Some(mut source) = trigger.disable.and_then(|e| sources.get_mut(e).ok()) {
                source.enabled = false;
            }
            if let Some(mut source) = trigger.enable.and_then(|e| sources.get_mut(e).ok()) {
                source.enabled = true;
            }
            debug!("gravity trigger {trigger_entity:?} fired");
        }
    }
}
