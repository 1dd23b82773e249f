//! Respawn coordinator (authority only)
//!
//! 1. tick_respawn_timers — истёкший таймер применяет RespawnPolicy
//! 2. detect_deaths — HealthUpdated с health == 0 → DeathFlag (ровно раз за жизнь)
//!    + one-shot RespawnTimer
//!
//! Таймер живёт на entity: despawn отменяет respawn автоматически.

use std::time::Duration;

use bevy::prelude::*;

use crate::combat::{apply_health_mutation, HealthUpdated};
use crate::components::{Controller, DeathFlag, Health, HealthMutation, LocallyControlled, PlayerInput};
use crate::config::{GameplayConfig, RespawnPolicy};
use crate::net::{is_authority, LocalController, NetId, NetIdAllocator, NetRole};
use crate::player::{is_local, player_bundle};
use crate::{DeterministicRng, GameplaySet, SimulationDelta};

pub mod navigation;


pub use navigation::{NavBounds, Navigation, NavigationQuery};

/// One-shot таймер respawn
#[derive(Component, Debug, Clone)]
pub struct RespawnTimer {
    timer: Timer,
}

impl RespawnTimer {
    pub fn new(delay: f32) -> Self {
        Self {
            timer: Timer::new(clamped_duration(delay), TimerMode::Once),
        }
    }

    pub fn remaining_secs(&self) -> f32 {
        self.timer.remaining_secs()
    }

    /// `true` когда таймер истёк
    pub fn tick(&mut self, dt: f32) -> bool {
        // Шаг не больше остатка: elapsed не переполняется
        let step = clamped_duration(dt).min(self.timer.remaining());
        self.timer.tick(step);
        self.timer.finished()
    }
}

/// Отрицательные и NaN → 0, слишком большие → `Duration::MAX`
fn clamped_duration(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs.max(0.0)).unwrap_or(Duration::MAX)
}

/// Событие: entity умер (переход DeathFlag false → true)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDied {
    pub entity: Entity,
    pub net_id: Option<NetId>,
}

/// Событие: игрок вернулся в бой
///
/// Для Reinstance `entity` — новый экземпляр, `previous` — удалённый.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PlayerRespawned {
    pub entity: Entity,
    pub previous: Option<Entity>,
    pub position: Vec3,
}

/// System: обнаружение смерти на authority
pub fn detect_deaths(
    mut commands: Commands,
    role: Res<NetRole>,
    config: Res<GameplayConfig>,
    mut updates: EventReader<HealthUpdated>,
    mut players: Query<(&Health, &mut DeathFlag, Option<&NetId>)>,
    mut died: EventWriter<EntityDied>,
) {
    for update in updates.read() {
        let Ok((health, mut death, net_id)) = players.get_mut(update.entity) else {
            continue;
        };
        if !health.is_depleted() {
            continue;
        }

        match death.mark_dead(*role) {
            Ok(true) => {
                commands.entity(update.entity).insert(RespawnTimer::new(config.respawn_delay));
                died.write(EntityDied {
                    entity: update.entity,
                    net_id: net_id.copied(),
                });

                crate::log_info(&format!(
                    "☠️ {:?} died, respawn in {:.1}s ({:?})",
                    update.entity, config.respawn_delay, config.respawn_policy
                ));
            }
            // Уже мертв — respawn уже запланирован
            Ok(false) => {}
            Err(error) => crate::log(&format!("Death of {:?} not recorded: {}", update.entity, error)),
        }
    }
}

/// System: истёкшие RespawnTimer → respawn по политике
#[allow(clippy::too_many_arguments)]
pub fn tick_respawn_timers(
    mut commands: Commands,
    role: Res<NetRole>,
    delta: Res<SimulationDelta>,
    config: Res<GameplayConfig>,
    navigation: Res<Navigation>,
    local: Res<LocalController>,
    mut rng: ResMut<DeterministicRng>,
    mut net_ids: ResMut<NetIdAllocator>,
    mut dying: Query<(
        Entity,
        &mut RespawnTimer,
        &mut Transform,
        &mut Health,
        &mut DeathFlag,
        Option<&Controller>,
    )>,
    mut updates: EventWriter<HealthUpdated>,
    mut respawned: EventWriter<PlayerRespawned>,
) {
    for (entity, mut timer, mut transform, mut health, mut death, controller) in dying.iter_mut() {
        if !timer.tick(delta.0) {
            continue;
        }

        commands.entity(entity).remove::<RespawnTimer>();

        let position = navigation
            .random_reachable_point(&mut rng.rng)
            .unwrap_or_else(|| {
                crate::log_warning(&format!(
                    "No navigation point for {:?}, respawning in place",
                    entity
                ));
                transform.translation
            });

        match config.respawn_policy {
            RespawnPolicy::Relocate => {
                transform.translation = position;

                if let Err(error) =
                    apply_health_mutation(entity, &mut health, *role, HealthMutation::RestoreToMax, &mut updates)
                {
                    crate::log(&format!("Respawn of {:?} skipped: {}", entity, error));
                    continue;
                }
                if let Err(error) = death.clear(*role) {
                    crate::log(&format!("Respawn of {:?} skipped: {}", entity, error));
                    continue;
                }

                respawned.write(PlayerRespawned {
                    entity,
                    previous: None,
                    position,
                });
                crate::log_info(&format!("✨ {:?} respawned at {}", entity, position));
            }
            RespawnPolicy::Reinstance => {
                if !role.is_authority() {
                    continue;
                }

                // Controller отсоединяется от старого тела до despawn
                let controller = controller.map(|controller| controller.0);
                commands.entity(entity).remove::<Controller>().despawn();

                let net_id = net_ids.allocate();
                let mut new_player = commands.spawn(player_bundle(
                    net_id,
                    position,
                    health.max(),
                    config.sphere,
                ));
                if let Some(controller) = controller {
                    new_player.insert(Controller(controller));
                }
                if is_local(controller, *local) {
                    new_player.insert((LocallyControlled, PlayerInput::default()));
                }

                let new_entity = new_player.id();
                respawned.write(PlayerRespawned {
                    entity: new_entity,
                    previous: Some(entity),
                    position,
                });
                crate::log_info(&format!(
                    "✨ {:?} reinstanced as {:?} ({:?}) at {}",
                    entity, new_entity, net_id, position
                ));
            }
        }
    }
}

pub struct RespawnPlugin;

impl Plugin for RespawnPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<EntityDied>().add_event::<PlayerRespawned>();

        app.add_systems(
            Update,
            // Таймер тикает до detect_deaths: кадр смерти не засчитывается в задержку
            (tick_respawn_timers, detect_deaths)
                .chain()
                .in_set(GameplaySet::Death)
                .run_if(is_authority),
        );
    }
}
