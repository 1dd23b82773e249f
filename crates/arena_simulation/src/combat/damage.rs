//! Damage router
//!
//! Generic "received damage" → Health::damage. Pass-through:
//! без фильтрации по типу урона, без брони/резистов.

use bevy::prelude::*;

use crate::components::{Health, HealthChange, HealthMutation};
use crate::error::GameplayError;
use crate::net::{ControllerId, NetRole};

/// Тип урона (информационный, router его не различает)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum DamageKind {
    Generic,
    SphereBlast,
    Projectile,
}

/// Событие: entity получил урон (damage notification interface)
///
/// Производители: sphere sweep, projectile hits, host (окружение, ловушки).
#[derive(Event, Debug, Clone)]
pub struct DamageReceived {
    pub target: Entity,
    pub amount: f32,
    pub kind: DamageKind,
    /// Чей controller инициировал урон
    pub instigator: Option<ControllerId>,
    /// Кто непосредственно нанёс (caster, стрелок)
    pub causer: Option<Entity>,
}

/// Событие: health entity обновился
///
/// Authority пишет его синхронно на каждую успешную мутацию,
/// observer — когда реплицированное значение изменилось.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct HealthUpdated {
    pub entity: Entity,
    pub current: f32,
    pub max: f32,
}

/// Мутация Health + ровно одна нотификация на успех
pub fn apply_health_mutation(
    entity: Entity,
    health: &mut Health,
    role: NetRole,
    mutation: HealthMutation,
    updates: &mut EventWriter<HealthUpdated>,
) -> Result<HealthChange, GameplayError> {
    let change = health.apply(role, mutation)?;

    updates.write(HealthUpdated {
        entity,
        current: change.current,
        max: health.max(),
    });

    Ok(change)
}

/// Система: DamageReceived → Health
pub fn route_damage(
    role: Res<NetRole>,
    mut damage_events: EventReader<DamageReceived>,
    mut targets: Query<&mut Health>,
    mut updates: EventWriter<HealthUpdated>,
) {
    for event in damage_events.read() {
        let Ok(mut health) = targets.get_mut(event.target) else {
            crate::log(&format!("DamageReceived: target {:?} has no Health, skipped", event.target));
            continue;
        };

        match apply_health_mutation(
            event.target,
            &mut health,
            *role,
            HealthMutation::Damage(event.amount),
            &mut updates,
        ) {
            Ok(change) => crate::log(&format!(
                "{:?} took {} {:?} damage (HP: {} → {})",
                event.target, event.amount, event.kind, change.previous, change.current
            )),
            Err(error) => crate::log(&format!("Damage to {:?} ignored: {}", event.target, error)),
        }
    }
}
