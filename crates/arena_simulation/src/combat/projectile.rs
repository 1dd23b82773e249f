//! Projectile hits
//!
//! Полёт и коллизии снаряда — у host (physics). ECS получает только факт попадания.

use bevy::prelude::*;

use crate::combat::{DamageKind, DamageReceived};
use crate::components::Controller;

/// Базовый урон снаряда винтовки
pub const PROJECTILE_BASE_DAMAGE: f32 = 20.0;

/// Event: Projectile попал в цель (host → ECS)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ProjectileHit {
    /// Кто выстрелил (для предотвращения self-hit)
    pub shooter: Entity,
    pub target: Entity,
    pub damage: f32,
}

impl ProjectileHit {
    pub fn new(shooter: Entity, target: Entity) -> Self {
        Self {
            shooter,
            target,
            damage: PROJECTILE_BASE_DAMAGE,
        }
    }
}

/// System (authority): ProjectileHit → DamageReceived
pub fn process_projectile_hits(
    mut hits: EventReader<ProjectileHit>,
    controllers: Query<&Controller>,
    mut damage: EventWriter<DamageReceived>,
) {
    for hit in hits.read() {
        if hit.shooter == hit.target {
            crate::log(&format!("⚠️ Self-hit from {:?} ignored", hit.shooter));
            continue;
        }

        damage.write(DamageReceived {
            target: hit.target,
            amount: hit.damage,
            kind: DamageKind::Projectile,
            instigator: controllers.get(hit.shooter).ok().map(|controller| controller.0),
            causer: Some(hit.shooter),
        });
    }
}
