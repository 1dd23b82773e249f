//! Репликация authority → observers
//!
//! Pipeline (single writer):
//! 1. Authority мутирует Health / DeathFlag / SphereAttack / Transform
//! 2. `server::broadcast_replication` сравнивает с `ReplicationShadow` → Field packets
//! 3. Transport (crossbeam, ron frames) доставляет их каждому observer
//! 4. `client::apply_replicated_fields` применяет и поднимает callbacks
//!    (только если значение реально изменилось — дубликаты это no-op)
//!
//! Обратный канал: observer → authority `SphereAction` requests (reliable RPC).
//!
//! Authority никогда не получает собственные frames, поэтому локальная
//! нотификация на сервере и replication callback не могут сработать дважды.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::GameplaySet;

pub mod client;
pub mod protocol;
pub mod server;
pub mod transport;

pub use client::{DeathFlagChanged, LocalController, NetEntityMap};
pub use protocol::{FieldValue, Packet, ReplicatedSnapshot, ReplicationFrame, SpawnRecord, SphereAction};
pub use server::{NetIdAllocator, ReplicationShadow};
pub use transport::{connect_observer, ObserverLink, ReplicationHub, ReplicationUplink};

/// Роль процесса в сессии
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetRole {
    /// Сервер: единственный, кто мутирует shared gameplay state
    Authority,
    /// Клиент: только зеркалит state и реагирует на изменения
    Observer,
}

impl NetRole {
    pub fn is_authority(self) -> bool {
        matches!(self, NetRole::Authority)
    }
}

/// Run condition: процесс — authority
pub fn is_authority(role: Res<NetRole>) -> bool {
    role.is_authority()
}

/// Run condition: процесс — observer
pub fn is_observer(role: Res<NetRole>) -> bool {
    !role.is_authority()
}

/// Стабильный сетевой ID entity (одинаковый во всех процессах)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Reflect)]
#[reflect(Component)]
pub struct NetId(pub u64);

/// ID игрока-контроллера (connection). Переживает reinstance respawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Reflect)]
pub struct ControllerId(pub u32);

/// Маркер: entity — зеркало authority entity на observer
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ReplicatedProxy;

/// Репликация: системы по роли процесса
pub struct NetPlugin;

impl Plugin for NetPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DeathFlagChanged>()
            .init_resource::<NetIdAllocator>()
            .init_resource::<NetEntityMap>()
            .init_resource::<client::InboundFields>()
            .init_resource::<ReplicationHub>();

        // Authority: requests → команды, state → frames
        app.add_systems(
            Update,
            (
                server::receive_requests.in_set(GameplaySet::Receive),
                server::broadcast_replication.in_set(GameplaySet::Replicate),
            )
                .run_if(is_authority),
        );

        // Observer: frames → зеркало, ввод → requests
        app.add_systems(
            Update,
            (
                (client::receive_replication_frames, client::apply_replicated_fields)
                    .chain()
                    .in_set(GameplaySet::Receive),
                client::forward_sphere_intents.in_set(GameplaySet::Intents),
            )
                .run_if(is_observer),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_checks() {
        assert!(NetRole::Authority.is_authority());
        assert!(!NetRole::Observer.is_authority());
    }
}
