//! Observer side репликации
//!
//! Два шага с sync point между ними:
//! 1. receive_replication_frames — spawn/despawn proxies, поля в очередь
//! 2. apply_replicated_fields — зеркалирование + callbacks
//!
//! Callback поднимается только если значение реально изменилось.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::combat::{HealthUpdated, SphereInputIntent};
use crate::components::{Controller, DeathFlag, Health, LocallyControlled, PlayerInput, SphereAttack};
use crate::net::protocol::{ClientRequest, FieldValue, Packet, SpawnRecord};
use crate::net::{ControllerId, NetId, ReplicatedProxy, ReplicationUplink};
use crate::player::{is_local, player_bundle};
use crate::presentation::{HookKind, PresentationHook};

/// Controller, которым управляет игрок этого процесса (None — dedicated server / spectator)
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocalController(pub Option<ControllerId>);

/// NetId → локальный proxy entity
#[derive(Resource, Debug, Default)]
pub struct NetEntityMap {
    entities: HashMap<NetId, Entity>,
}

impl NetEntityMap {
    pub fn get(&self, net_id: NetId) -> Option<Entity> {
        self.entities.get(&net_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Поля, ожидающие применения в этом шаге
#[derive(Resource, Debug, Default)]
pub struct InboundFields(Vec<(NetId, FieldValue)>);

/// Событие (observer): реплицированный DeathFlag сменил значение
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathFlagChanged {
    pub entity: Entity,
    pub is_dead: bool,
}

fn spawn_proxy(commands: &mut Commands, record: &SpawnRecord, local: LocalController) -> Entity {
    let position = Vec3::from_array(record.snapshot.position);
    let mut proxy = commands.spawn((
        player_bundle(record.net_id, position, record.max_health, record.sphere),
        ReplicatedProxy,
    ));
    if let Some(controller) = record.controller {
        proxy.insert(Controller(controller));
    }
    if is_local(record.controller, local) {
        proxy.insert((LocallyControlled, PlayerInput::default()));
    }
    proxy.id()
}

/// System (observer): разбор входящих frames
pub fn receive_replication_frames(
    mut commands: Commands,
    uplink: Option<Res<ReplicationUplink>>,
    local: Res<LocalController>,
    mut map: ResMut<NetEntityMap>,
    mut inbound: ResMut<InboundFields>,
) {
    let Some(uplink) = uplink else {
        return;
    };

    for frame in uplink.drain_frames() {
        for packet in frame.packets {
            match packet {
                Packet::Spawn(record) => {
                    if map.get(record.net_id).is_none() {
                        let entity = spawn_proxy(&mut commands, &record, *local);
                        map.entities.insert(record.net_id, entity);
                        crate::log(&format!("Replicated spawn {:?} → {:?}", record.net_id, entity));
                    }
                    // Значения из spawn идут тем же путём, что и обычные поля
                    inbound
                        .0
                        .extend(record.snapshot.fields().into_iter().map(|value| (record.net_id, value)));
                }
                Packet::Field { net_id, value } => inbound.0.push((net_id, value)),
                Packet::Despawn { net_id } => {
                    if let Some(entity) = map.entities.remove(&net_id) {
                        commands.entity(entity).despawn();
                        crate::log(&format!("Replicated despawn {:?} ({:?})", net_id, entity));
                    }
                }
            }
        }
    }
}

/// System (observer): применение полей и replication callbacks
#[allow(clippy::type_complexity)]
pub fn apply_replicated_fields(
    map: Res<NetEntityMap>,
    mut inbound: ResMut<InboundFields>,
    mut proxies: Query<(
        &mut Transform,
        &mut Health,
        &mut DeathFlag,
        &mut SphereAttack,
        Has<LocallyControlled>,
    )>,
    mut health_updates: EventWriter<HealthUpdated>,
    mut death_changes: EventWriter<DeathFlagChanged>,
    mut hooks: EventWriter<PresentationHook>,
) {
    for (net_id, value) in inbound.0.drain(..) {
        let Some(entity) = map.get(net_id) else {
            continue;
        };
        let Ok((mut transform, mut health, mut death, mut sphere, locally_controlled)) = proxies.get_mut(entity)
        else {
            continue;
        };

        match value {
            FieldValue::Position(position) => {
                let position = Vec3::from_array(position);
                if transform.translation != position {
                    transform.translation = position;
                }
            }
            FieldValue::CurrentHealth(current) => {
                if health.mirror(current) {
                    health_updates.write(HealthUpdated {
                        entity,
                        current: health.current(),
                        max: health.max(),
                    });
                }
            }
            FieldValue::IsDead(is_dead) => {
                if death.mirror(is_dead) {
                    death_changes.write(DeathFlagChanged { entity, is_dead });
                }
            }
            FieldValue::SphereRadius(radius) => {
                if sphere.mirror_radius(radius) && locally_controlled {
                    hooks.write(PresentationHook::new(entity, HookKind::SphereRadiusChanged));
                }
            }
            FieldValue::SphereCooldown(cooldown) => {
                if sphere.mirror_cooldown(cooldown) && locally_controlled {
                    hooks.write(PresentationHook::new(entity, HookKind::CooldownChanged));
                }
            }
            FieldValue::SphereActive(active) => {
                sphere.mirror_active(active);
            }
        }
    }
}

/// System (observer): ввод локального игрока → request на authority
pub fn forward_sphere_intents(
    mut intents: EventReader<SphereInputIntent>,
    uplink: Option<Res<ReplicationUplink>>,
    local_players: Query<&PlayerInput, With<LocallyControlled>>,
) {
    let Some(uplink) = uplink else {
        intents.clear();
        return;
    };

    for intent in intents.read() {
        // Death mode: ввод отключён
        if !local_players.iter().any(|input| input.enabled) {
            crate::log(&format!("Sphere input {:?} dropped: input disabled", intent.action()));
            continue;
        }
        uplink.send_request(ClientRequest::Sphere(intent.action()));
    }
}
