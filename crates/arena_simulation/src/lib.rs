//! Arena Simulation Core
//!
//! Gameplay правила сетевого арена-шутера на Bevy ECS (headless).
//! Один процесс (server или client) = один `App`.
//!
//! AUTHORITY MODEL:
//! - Authority (server) — единственный writer: Health, DeathFlag, SphereAttack
//! - Observer (client) — зеркалит state через репликацию, реагирует на изменения
//!
//! Host (движок/рендер) вызывает `step(app, dt)` раз в кадр и читает
//! `PresentationLog` / `HudReadout` для UI.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod combat;
pub mod components;
pub mod config;
pub mod error;
pub mod logger;
pub mod net;
pub mod player;
pub mod presentation;
pub mod respawn;

// Re-export базовых типов для удобства
pub use combat::{
    CombatPlugin, DamageKind, DamageReceived, HealthUpdated, ProjectileHit, QueryCategory, SpatialQuery,
    SphereCommand, SphereDebugDraw, SphereInputIntent, SphereReleased,
};
pub use components::*;
pub use config::{GameplayConfig, NavBoundsConfig, RespawnPolicy, SphereAttackConfig};
pub use error::{ConfigError, GameplayError, WireError};
pub use logger::{log, log_error, log_info, log_warning};
pub use net::{
    connect_observer, is_authority, is_observer, ControllerId, LocalController, NetId, NetRole, ReplicationHub,
    ReplicationUplink,
};
pub use player::{player_bundle, spawn_player};
pub use presentation::{HookKind, HudReadout, PresentationHook, PresentationLog, Ragdoll};
pub use respawn::{EntityDied, NavBounds, Navigation, NavigationQuery, PlayerRespawned, RespawnTimer};

/// dt текущего шага (секунды). Проставляется `step()`, системы не читают глобальные часы.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationDelta(pub f32);

/// Фазы шага симуляции (выполняются строго по порядку)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameplaySet {
    /// Входящие сообщения транспорта (requests на authority, frames на observer)
    Receive,
    /// Ввод → команды
    Intents,
    /// Интеграция sphere attack + sweep
    Simulate,
    /// Урон → Health
    Damage,
    /// Смерть и respawn
    Death,
    /// Исходящая репликация
    Replicate,
    /// Реакции presentation слоя (hooks для UI/анимации)
    Present,
    /// Сбор hooks для host (PresentationLog, HudReadout)
    Record,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin {
    pub role: NetRole,
    pub config: GameplayConfig,
}

impl SimulationPlugin {
    pub fn authority(config: GameplayConfig) -> Self {
        Self {
            role: NetRole::Authority,
            config,
        }
    }

    pub fn observer(config: GameplayConfig) -> Self {
        Self {
            role: NetRole::Observer,
            config,
        }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.role)
            .insert_resource(self.config.clone())
            // Детерминистичный RNG (navigation sampling)
            .insert_resource(DeterministicRng::new(self.config.seed))
            .insert_resource(Navigation::new(NavBounds::from(self.config.navigation)))
            .init_resource::<SimulationDelta>()
            .init_resource::<LocalController>()
            .configure_sets(
                Update,
                (
                    GameplaySet::Receive,
                    GameplaySet::Intents,
                    GameplaySet::Simulate,
                    GameplaySet::Damage,
                    GameplaySet::Death,
                    GameplaySet::Replicate,
                    GameplaySet::Present,
                    GameplaySet::Record,
                )
                    .chain(),
            )
            .add_plugins((
                CombatPlugin,
                respawn::RespawnPlugin,
                net::NetPlugin,
                presentation::PresentationPlugin,
            ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт headless Bevy App для одного процесса сессии
pub fn create_headless_app(role: NetRole, config: GameplayConfig) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin { role, config });

    app
}

/// Snapshot реплицированного state всех NetId entity (ron bytes)
///
/// Сортировка по NetId → одинаковые миры дают одинаковые bytes.
/// Используется тестами детерминизма и сравнения authority/observer.
pub fn world_snapshot(world: &mut World) -> Result<Vec<u8>, WireError> {
    let mut query = world.query::<(&NetId, &Transform, &Health, &DeathFlag, &SphereAttack)>();
    let mut entities: Vec<_> = query
        .iter(world)
        .map(|(net_id, transform, health, death, sphere)| {
            (*net_id, net::ReplicatedSnapshot::capture(transform, health, death, sphere))
        })
        .collect();

    entities.sort_by_key(|(net_id, _)| *net_id);

    net::protocol::encode(&entities)
}

/// Один шаг симуляции процесса. dt < 0 или NaN трактуется как 0.
pub fn step(app: &mut App, dt: f32) {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    app.world_mut().resource_mut::<SimulationDelta>().0 = dt;
    app.update();
}
