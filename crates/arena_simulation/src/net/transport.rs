//! In-process transport: crossbeam channels между App'ами
//!
//! Каждый observer = один `ObserverLink` на authority и один
//! `ReplicationUplink` у себя. Payload — ron bytes (protocol::encode).
//! Каналы упорядочены и без потерь → reliable семантика.

use bevy::prelude::*;
use crossbeam::channel::{unbounded, Receiver, Sender, TryRecvError};
use serde::Serialize;

use crate::net::protocol::{self, ClientRequest, ReplicationFrame};
use crate::net::{ControllerId, LocalController};

/// Authority-side конец соединения с одним observer
pub struct ObserverLink {
    controller: Option<ControllerId>,
    frames: Sender<Vec<u8>>,
    requests: Receiver<Vec<u8>>,
    /// Получил ли observer полный initial sync
    synced: bool,
    open: bool,
}

impl ObserverLink {
    pub fn controller(&self) -> Option<ControllerId> {
        self.controller
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn send(&mut self, bytes: &[u8]) {
        if !self.open {
            return;
        }
        if self.frames.send(bytes.to_vec()).is_err() {
            self.open = false;
            crate::log_warning(&format!("Observer {:?} disconnected", self.controller));
        }
    }

    /// Все ожидающие requests (невалидные логируются и пропускаются)
    pub fn drain_requests(&mut self) -> Vec<ClientRequest> {
        let mut requests = Vec::new();
        while self.open {
            match self.requests.try_recv() {
                Ok(bytes) => match protocol::decode::<ClientRequest>(&bytes) {
                    Ok(request) => requests.push(request),
                    Err(error) => crate::log_error(&format!(
                        "Bad request from {:?}: {}",
                        self.controller, error
                    )),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.open = false;
                    crate::log_warning(&format!("Observer {:?} disconnected", self.controller));
                }
            }
        }
        requests
    }
}

/// Authority resource: все подключённые observers
#[derive(Resource, Default)]
pub struct ReplicationHub {
    links: Vec<ObserverLink>,
}

impl ReplicationHub {
    pub fn link_count(&self) -> usize {
        self.links.iter().filter(|link| link.open).count()
    }

    pub fn links_mut(&mut self) -> impl Iterator<Item = &mut ObserverLink> {
        self.links.iter_mut().filter(|link| link.open)
    }

    pub fn has_pending_sync(&self) -> bool {
        self.links.iter().any(|link| link.open && !link.synced)
    }

    /// Frame всем синхронизированным observers. Пустой frame не отправляется.
    pub fn broadcast(&mut self, frame: &ReplicationFrame) {
        if frame.is_empty() {
            return;
        }
        let Some(bytes) = encode_or_log(frame) else {
            return;
        };
        for link in self.links.iter_mut().filter(|link| link.synced) {
            link.send(&bytes);
        }
    }

    /// Полный snapshot мира новым observers (late join)
    pub fn sync_pending(&mut self, full: &ReplicationFrame) {
        if !self.has_pending_sync() {
            return;
        }
        let Some(bytes) = encode_or_log(full) else {
            return;
        };
        for link in self.links.iter_mut().filter(|link| link.open && !link.synced) {
            link.send(&bytes);
            if !link.open {
                continue;
            }
            link.synced = true;
            crate::log_info(&format!(
                "🔗 Observer {:?} synced ({} packets)",
                link.controller,
                full.packets.len()
            ));
        }
    }

    /// Отсоединённые links больше не нужны
    pub fn prune_closed(&mut self) {
        self.links.retain(|link| link.open);
    }
}

/// Observer resource: конец соединения с authority
#[derive(Resource)]
pub struct ReplicationUplink {
    frames: Receiver<Vec<u8>>,
    requests: Sender<Vec<u8>>,
}

impl ReplicationUplink {
    /// Все полученные frames (невалидные логируются и пропускаются)
    pub fn drain_frames(&self) -> Vec<ReplicationFrame> {
        self.frames
            .try_iter()
            .filter_map(|bytes| match protocol::decode::<ReplicationFrame>(&bytes) {
                Ok(frame) => Some(frame),
                Err(error) => {
                    crate::log_error(&format!("Bad replication frame: {}", error));
                    None
                }
            })
            .collect()
    }

    pub fn send_request(&self, request: ClientRequest) {
        let Some(bytes) = encode_or_log(&request) else {
            return;
        };
        if self.requests.send(bytes).is_err() {
            crate::log_warning("Authority connection closed, request dropped");
        }
    }
}

fn encode_or_log<T: Serialize>(message: &T) -> Option<Vec<u8>> {
    match protocol::encode(message) {
        Ok(bytes) => Some(bytes),
        Err(error) => {
            crate::log_error(&format!("Replication encode failed: {}", error));
            None
        }
    }
}

/// Подключить observer App к authority App
///
/// `controller` — какой персонаж observer'а считается локальным.
/// Полный state придёт в следующем шаге authority.
pub fn connect_observer(server: &mut World, client: &mut World, controller: Option<ControllerId>) {
    let (frame_tx, frame_rx) = unbounded();
    let (request_tx, request_rx) = unbounded();

    server.get_resource_or_insert_with(ReplicationHub::default).links.push(ObserverLink {
        controller,
        frames: frame_tx,
        requests: request_rx,
        synced: false,
        open: true,
    });

    client.insert_resource(ReplicationUplink {
        frames: frame_rx,
        requests: request_tx,
    });
    client.insert_resource(LocalController(controller));

    crate::log_info(&format!("🔗 Observer connected (controller {:?})", controller));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::{Packet, SphereAction};
    use crate::net::NetId;

    fn connected() -> (World, World) {
        let mut server = World::new();
        let mut client = World::new();
        connect_observer(&mut server, &mut client, Some(ControllerId(2)));
        (server, client)
    }

    fn despawn_frame(id: u64) -> ReplicationFrame {
        ReplicationFrame {
            packets: vec![Packet::Despawn { net_id: NetId(id) }],
        }
    }

    #[test]
    fn test_broadcast_waits_for_initial_sync() {
        let (mut server, client) = connected();
        let mut hub = server.resource_mut::<ReplicationHub>();

        hub.broadcast(&despawn_frame(1));
        hub.sync_pending(&despawn_frame(2));
        hub.broadcast(&despawn_frame(3));

        let frames = client.resource::<ReplicationUplink>().drain_frames();
        assert_eq!(frames, vec![despawn_frame(2), despawn_frame(3)]);
        assert_eq!(client.resource::<LocalController>().0, Some(ControllerId(2)));
    }

    #[test]
    fn test_requests_reach_authority() {
        let (mut server, client) = connected();

        let uplink = client.resource::<ReplicationUplink>();
        uplink.send_request(ClientRequest::Sphere(SphereAction::Activate));
        uplink.send_request(ClientRequest::Sphere(SphereAction::Deactivate));

        let mut hub = server.resource_mut::<ReplicationHub>();
        let link = hub.links_mut().next().unwrap();
        assert_eq!(link.controller(), Some(ControllerId(2)));
        assert_eq!(
            link.drain_requests(),
            vec![
                ClientRequest::Sphere(SphereAction::Activate),
                ClientRequest::Sphere(SphereAction::Deactivate)
            ]
        );
    }

    #[test]
    fn test_dropped_client_closes_link() {
        let (mut server, client) = connected();
        drop(client);

        let mut hub = server.resource_mut::<ReplicationHub>();
        hub.sync_pending(&despawn_frame(1));

        assert_eq!(hub.link_count(), 0);
        hub.prune_closed();
        assert!(hub.links_mut().next().is_none());
    }
}
