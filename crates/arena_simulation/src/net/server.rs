//! Authority side репликации
//!
//! - receive_requests: ClientRequest → SphereCommand для персонажа этого controller
//! - broadcast_replication: diff с ReplicationShadow → Field packets,
//!   новые entity → Spawn, исчезнувшие NetId → Despawn

use std::collections::BTreeSet;

use bevy::prelude::*;

use crate::combat::SphereCommand;
use crate::components::{Controller, DeathFlag, Health, SphereAttack};
use crate::net::protocol::{ClientRequest, Packet, ReplicatedSnapshot, ReplicationFrame, SpawnRecord};
use crate::net::{NetId, ReplicationHub};

/// Выдаёт уникальные NetId (монотонно, без переиспользования)
#[derive(Resource, Debug, Default)]
pub struct NetIdAllocator {
    next: u64,
}

impl NetIdAllocator {
    pub fn allocate(&mut self) -> NetId {
        self.next += 1;
        NetId(self.next)
    }
}

/// Последнее отправленное observers состояние entity
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ReplicationShadow(pub ReplicatedSnapshot);

/// System (authority): requests от observers → SphereCommand
pub fn receive_requests(
    hub: Option<ResMut<ReplicationHub>>,
    controlled: Query<(Entity, &Controller)>,
    mut sphere_commands: EventWriter<SphereCommand>,
) {
    let Some(mut hub) = hub else {
        return;
    };

    for link in hub.links_mut() {
        let requests = link.drain_requests();
        if requests.is_empty() {
            continue;
        }

        // Request действует только на персонажа отправителя
        let caster = link.controller().and_then(|controller| {
            controlled
                .iter()
                .find(|(_, owner)| owner.0 == controller)
                .map(|(entity, _)| entity)
        });
        let Some(caster) = caster else {
            crate::log(&format!(
                "Requests from {:?} dropped: no controlled character",
                link.controller()
            ));
            continue;
        };

        for request in requests {
            match request {
                ClientRequest::Sphere(action) => {
                    sphere_commands.write(SphereCommand { caster, action });
                }
            }
        }
    }
}

/// System (authority): исходящая репликация за шаг
#[allow(clippy::type_complexity)]
pub fn broadcast_replication(
    mut commands: Commands,
    hub: Option<ResMut<ReplicationHub>>,
    mut replicated: Query<(
        Entity,
        &NetId,
        &Transform,
        &Health,
        &DeathFlag,
        &SphereAttack,
        Option<&Controller>,
        Option<&mut ReplicationShadow>,
    )>,
    mut known: Local<BTreeSet<NetId>>,
) {
    let mut delta = ReplicationFrame::default();
    let mut full = ReplicationFrame::default();
    let mut alive = BTreeSet::new();

    let mut entities: Vec<_> = replicated.iter_mut().collect();
    entities.sort_by_key(|(_, net_id, ..)| **net_id);

    for (entity, net_id, transform, health, death, sphere, controller, shadow) in entities {
        let snapshot = ReplicatedSnapshot::capture(transform, health, death, sphere);
        let record = SpawnRecord {
            net_id: *net_id,
            controller: controller.map(|controller| controller.0),
            max_health: health.max(),
            sphere: *sphere.config(),
            snapshot,
        };
        alive.insert(*net_id);

        match shadow {
            Some(mut shadow) => {
                delta.packets.extend(shadow.0.diff(&snapshot).into_iter().map(|value| Packet::Field {
                    net_id: *net_id,
                    value,
                }));
                if shadow.0 != snapshot {
                    shadow.0 = snapshot;
                }
            }
            None => {
                delta.packets.push(Packet::Spawn(record.clone()));
                commands.entity(entity).insert(ReplicationShadow(snapshot));
            }
        }

        full.packets.push(Packet::Spawn(record));
    }

    for gone in known.difference(&alive) {
        delta.packets.push(Packet::Despawn { net_id: *gone });
    }
    *known = alive;

    let Some(mut hub) = hub else {
        return;
    };

    // Сначала delta уже синхронизированным, затем полный snapshot новым
    hub.broadcast(&delta);
    hub.sync_pending(&full);
    hub.prune_closed();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_id_allocator_unique() {
        let mut allocator = NetIdAllocator::default();
        let ids: BTreeSet<_> = (0..10).map(|_| allocator.allocate()).collect();
        assert_eq!(ids.len(), 10);
        assert!(!ids.contains(&NetId(0)));
    }
}
